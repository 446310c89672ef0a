use pretty_assertions::assert_eq;
use qforge::*;

fn survey() -> Path {
    entity("Survey", "survey1")
}

fn id() -> Expr {
    survey().get("id", ValueType::I64).into()
}

fn name() -> Expr {
    survey().get("name", ValueType::String).into()
}

fn survey_query() -> QueryMetadata {
    let mut md = QueryMetadata::new();
    md.from(survey()).add_projection(id());
    md
}

fn upper_case() -> MapMetamodel {
    MapMetamodel::new()
        .table("Survey", "SURVEY")
        .column("Survey", "id", "ID")
        .column("Survey", "name", "NAME")
}

fn values(query: &SerializedQuery) -> Vec<Value> {
    query.constants().cloned().collect()
}

#[test]
fn test_sql_server_top() {
    let metamodel = upper_case();
    let serializer = Serializer::for_dialect::<SqlServer2005>().with_metamodel(&metamodel);
    let mut md = survey_query();
    md.set_limit(5);

    let query = serializer.serialize(&md, false, None).unwrap();
    assert_eq!("select top (?) survey1.ID\nfrom SURVEY survey1", query.text());
    assert_eq!(vec![Value::I64(5)], values(&query));
}

#[test]
fn test_sql_server_row_number() {
    let metamodel = upper_case();
    let serializer = Serializer::for_dialect::<SqlServer2005>().with_metamodel(&metamodel);

    let mut md = survey_query();
    md.set_limit(5).set_offset(3);
    let query = serializer.serialize(&md, false, None).unwrap();
    assert_eq!(
        "with inner_query as \n(\n  select survey1.ID, row_number() over () as row_number\nfrom SURVEY survey1\n)\nselect * \nfrom inner_query\nwhere row_number > ? and row_number <= ?",
        query.text()
    );
    assert_eq!(vec![Value::I64(3), Value::I64(8)], values(&query));

    let mut md = survey_query();
    md.set_offset(3)
        .add_order_by(name().desc().nulls_first())
        .add_flag(QueryFlag::text(Position::End, "\noption (recompile)"));
    let query = serializer.serialize(&md, false, None).unwrap();
    assert_eq!(
        "with inner_query as \n(\n  select survey1.ID, row_number() over (order by survey1.NAME desc) as row_number\nfrom SURVEY survey1\n)\nselect * \nfrom inner_query\nwhere row_number > ?\noption (recompile)",
        query.text()
    );
    assert_eq!(vec![Value::I64(3)], values(&query));

    // counting ignores the pagination entirely
    let count = serializer.serialize(&md, true, None).unwrap();
    assert_eq!("select count(survey1.ID)\nfrom SURVEY survey1\noption (recompile)", count.text());
}

#[test]
fn test_sql_server_row_number_keeps_all_columns() {
    let metamodel = upper_case();
    let serializer = Serializer::for_dialect::<SqlServer2005>().with_metamodel(&metamodel);
    let mut md = QueryMetadata::new();
    md.from(survey()).set_limit(5).set_offset(3);

    let query = serializer.serialize(&md, false, None).unwrap();
    assert_eq!(
        "with inner_query as \n(\n  select *, row_number() over () as row_number\nfrom SURVEY survey1\n)\nselect * \nfrom inner_query\nwhere row_number > ? and row_number <= ?",
        query.text()
    );
    assert_eq!(vec![Value::I64(3), Value::I64(8)], values(&query));

    let query = serializer.serialize(&md, false, Some("survey1.ID")).unwrap();
    assert_eq!(
        "with inner_query as \n(\n  select survey1.ID, row_number() over () as row_number\nfrom SURVEY survey1\n)\nselect * \nfrom inner_query\nwhere row_number > ? and row_number <= ?",
        query.text()
    );
}

#[test]
fn test_sql_server_pagination_without_source() {
    let mut md = QueryMetadata::new();
    md.add_projection(Expr::from(TemplateExpr::new(ValueType::I64, "1", Vec::new()).unwrap()))
        .set_limit(5)
        .set_offset(3);
    let query = Serializer::for_dialect::<SqlServer2005>().serialize(&md, false, None).unwrap();
    assert_eq!("select 1", query.text());
    assert!(query.bindings().is_empty());
}

#[test]
fn test_derby_fetch_first() {
    let mut md = survey_query();
    md.set_limit(10).set_offset(20);
    let query = Serializer::for_dialect::<Derby>().serialize(&md, false, None).unwrap();
    assert_eq!(
        "select survey1.id\nfrom Survey survey1\noffset 20 rows fetch next 10 rows only",
        query.text()
    );
    assert!(query.bindings().is_empty());

    let mut md = survey_query();
    md.set_limit(10);
    let query = Serializer::for_dialect::<Derby>().serialize(&md, false, None).unwrap();
    assert_eq!("select survey1.id\nfrom Survey survey1\nfetch first 10 rows only", query.text());
}

#[test]
fn test_postgres_limit_offset() {
    let mut md = survey_query();
    md.set_limit(10).set_offset(20);
    let query = Serializer::for_dialect::<Postgres>().serialize(&md, false, None).unwrap();
    assert_eq!(
        "select \"survey1\".\"id\"\nfrom \"Survey\" \"survey1\"\nlimit $1\noffset $2",
        query.text()
    );
    assert_eq!(vec![Value::I64(10), Value::I64(20)], values(&query));
}

#[test]
fn test_numbered_placeholders_reuse_labels() {
    let mut md = survey_query();
    md.add_where(name().eq("a").or(name().ne("a")));
    let query = Serializer::for_dialect::<Postgres>().serialize(&md, false, None).unwrap();
    assert_eq!(
        "select \"survey1\".\"id\"\nfrom \"Survey\" \"survey1\"\nwhere \"survey1\".\"name\" = $1 or \"survey1\".\"name\" <> $1",
        query.text()
    );
    assert_eq!(1, query.bindings().len());

    // anonymous placeholders bind once per occurrence
    let query = Serializer::for_dialect::<H2>().serialize(&md, false, None).unwrap();
    assert_eq!(
        "select survey1.id\nfrom Survey survey1\nwhere survey1.name = ? or survey1.name <> ?",
        query.text()
    );
    assert_eq!(vec![Value::string("a"), Value::string("a")], values(&query));
}

#[test]
fn test_nulls_ordering() {
    let mut md = survey_query();
    md.add_order_by(name().asc().nulls_first());

    let postgres = Serializer::for_dialect::<Postgres>().serialize(&md, false, None).unwrap();
    assert!(postgres.text().ends_with("order by \"survey1\".\"name\" asc nulls first"));

    let mysql = Serializer::for_dialect::<MySql>().serialize(&md, false, None).unwrap();
    assert!(mysql.text().ends_with("order by `survey1`.`name` asc"));

    let sql_server = Serializer::for_dialect::<SqlServer2005>().serialize(&md, false, None).unwrap();
    assert!(sql_server.text().ends_with("order by survey1.name asc"));

    let mut jpql = QueryMetadata::new();
    jpql.from(survey()).add_order_by(name().desc().nulls_last());
    let query = Serializer::for_dialect::<Jpql>().serialize(&jpql, false, None).unwrap();
    assert_eq!(
        "select survey1\nfrom Survey survey1\norder by survey1.name desc nulls last",
        query.text()
    );
}

#[test]
fn test_collection_constants() {
    let in_list = name().is_in(vec!["a", "b"]);
    let query = Serializer::for_dialect::<H2>().serialize_expr(&in_list).unwrap();
    assert_eq!("survey1.name in (?, ?)", query.text());
    assert_eq!(vec![Value::string("a"), Value::string("b")], values(&query));

    let query = Serializer::for_dialect::<Postgres>().serialize_expr(&in_list).unwrap();
    assert_eq!("\"survey1\".\"name\" in ($1, $2)", query.text());

    let empty = name().is_in(Vec::<String>::new());
    let query = Serializer::for_dialect::<Postgres>().serialize_expr(&empty).unwrap();
    assert_eq!("1 = 2", query.text());
    let query = Serializer::for_dialect::<Postgres>()
        .serialize_expr(&name().not_in(Vec::<String>::new()))
        .unwrap();
    assert_eq!("1 = 1", query.text());
}

#[test]
fn test_select_star_and_count_star() {
    let mut md = QueryMetadata::new();
    md.from(survey());
    let sqlite = Serializer::for_dialect::<Sqlite>();
    assert_eq!(
        "select *\nfrom \"Survey\" \"survey1\"",
        sqlite.serialize(&md, false, None).unwrap().text()
    );
    assert_eq!(
        "select count(*)\nfrom \"Survey\" \"survey1\"",
        sqlite.serialize(&md, true, None).unwrap().text()
    );
}

#[test]
fn test_num_cast_type_names() {
    let cast = id().num_cast(ValueType::I32);
    assert_eq!(
        "cast(\"survey1\".\"id\" as integer)",
        Serializer::for_dialect::<Postgres>().serialize_expr(&cast).unwrap().text()
    );
    assert_eq!(
        "cast(`survey1`.`id` as signed)",
        Serializer::for_dialect::<MySql>().serialize_expr(&cast).unwrap().text()
    );
}

#[test]
fn test_native_regex_and_like_escape() {
    let query = Serializer::for_dialect::<Postgres>()
        .serialize_expr(&name().matches("^a.*"))
        .unwrap();
    assert_eq!("\"survey1\".\"name\" ~ $1", query.text());
    assert_eq!(vec![Value::string("^a.*")], values(&query));

    let query = Serializer::for_dialect::<MySql>()
        .serialize_expr(&name().like("50!%"))
        .unwrap();
    assert_eq!("`survey1`.`name` like ? escape '!'", query.text());
    assert_eq!(vec![Value::string("50!!%")], values(&query));
}

#[test]
fn test_insert_and_merge() {
    let columns = [survey().get("id", ValueType::I64), survey().get("name", ValueType::String)];
    let rows = vec![vec![Expr::constant(1i64), Expr::constant("first")]];
    let h2 = Serializer::for_dialect::<H2>();

    let insert = h2
        .serialize_insert(&survey(), &columns, InsertSource::Values(&rows))
        .unwrap();
    assert_eq!("insert into Survey (id, name)\nvalues (?, ?)", insert.text());
    assert_eq!(vec![Value::I64(1), Value::string("first")], values(&insert));

    let keys = [survey().get("id", ValueType::I64)];
    let merge = h2
        .serialize_merge(&survey(), &keys, &columns, InsertSource::Values(&rows))
        .unwrap();
    assert_eq!("merge into Survey (id, name)\nkey (id)\nvalues (?, ?)", merge.text());

    let postgres = Serializer::for_dialect::<Postgres>()
        .serialize_merge(&survey(), &keys, &columns, InsertSource::Values(&rows));
    assert!(matches!(postgres, Err(Error::Unsupported { .. })));

    let jpql = Serializer::for_dialect::<Jpql>()
        .serialize_insert(&survey(), &columns, InsertSource::Values(&rows));
    assert!(matches!(jpql, Err(Error::Unsupported { .. })));
}

#[test]
fn test_insert_from_query() {
    let metamodel = upper_case();
    let other = entity("Survey", "s2");
    let mut source = QueryMetadata::new();
    source
        .from(&other)
        .add_projection(other.get("id", ValueType::I64))
        .add_projection(other.get("name", ValueType::String));
    let columns = [survey().get("id", ValueType::I64), survey().get("name", ValueType::String)];

    let query = Serializer::for_dialect::<H2>()
        .with_metamodel(&metamodel)
        .serialize_insert(&survey(), &columns, InsertSource::Query(&source))
        .unwrap();
    assert_eq!(
        "insert into SURVEY (ID, NAME)\nselect s2.ID, s2.NAME\nfrom SURVEY s2",
        query.text()
    );
}

#[test]
fn test_delete_and_update() {
    let mut md = QueryMetadata::new();
    md.from(survey()).add_where(id().gt(10));

    let delete = Serializer::for_dialect::<Postgres>().serialize_delete(&md).unwrap();
    assert_eq!(
        "delete from \"Survey\" \"survey1\"\nwhere \"survey1\".\"id\" > $1",
        delete.text()
    );
    assert_eq!(vec![Value::I64(10)], values(&delete));

    let update = Serializer::for_dialect::<H2>()
        .serialize_update(&md, &[(survey().get("name", ValueType::String), Expr::constant("renamed"))])
        .unwrap();
    assert_eq!("update Survey survey1\nset survey1.name = ?\nwhere survey1.id > ?", update.text());

    let empty = Serializer::for_dialect::<H2>().serialize_update(&md, &[]);
    assert!(matches!(empty, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_flags_and_group_by() {
    let mut md = survey_query();
    md.add_group_by(id())
        .add_having(id().count().gt(1))
        .add_flag(QueryFlag::text(Position::Start, "/* report */ "))
        .add_flag(QueryFlag::text(Position::End, "\nfor update"));
    let query = Serializer::for_dialect::<H2>().serialize(&md, false, None).unwrap();
    assert_eq!(
        "/* report */ select survey1.id\nfrom Survey survey1\ngroup by survey1.id\nhaving count(survey1.id) > ?\nfor update",
        query.text()
    );
}

#[test]
fn test_sql_joins() {
    let section = entity("Section", "section");
    let survey_ref: Expr = section.get("survey", ValueType::I64).into();
    let mut md = survey_query();
    md.left_join(&section);
    md.add_join_condition(survey_ref.eq(id())).unwrap();
    let query = Serializer::for_dialect::<H2>().serialize(&md, false, None).unwrap();
    assert_eq!(
        "select survey1.id\nfrom Survey survey1\nleft join Section section on section.survey = survey1.id",
        query.text()
    );
}
