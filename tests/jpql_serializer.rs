use pretty_assertions::assert_eq;
use qforge::*;

fn cat() -> Path {
    entity("Cat", "cat")
}

fn name() -> Expr {
    cat().get("name", ValueType::String).into()
}

fn weight() -> Expr {
    cat().get("weight", ValueType::I32).into()
}

fn jpql() -> Serializer<'static> {
    Serializer::for_dialect::<Jpql>()
}

fn hql() -> Serializer<'static> {
    Serializer::for_dialect::<Hql>()
}

#[test]
fn test_repeated_constants_share_a_label() {
    let query = jpql().serialize_expr(&weight().eq(2).and(weight().eq(2))).unwrap();
    assert_eq!("cat.weight = ?1 and cat.weight = ?1", query.text());
    assert_eq!(vec![Binding::Value(Value::I32(2))], query.bindings());
}

#[test]
fn test_constants_of_different_type_get_own_labels() {
    let nickname: Expr = cat().get("nickname", ValueType::String).into();
    let typed_null = Expr::from(Constant::typed(ValueType::String, Value::Null));
    let expr = name()
        .eq(typed_null.clone())
        .and(nickname.eq(Expr::constant(Value::Null)))
        .and(nickname.ne(typed_null));

    let query = jpql().serialize_expr(&expr).unwrap();
    assert_eq!(
        "cat.name = ?1 and cat.nickname = ?2 and cat.nickname <> ?1",
        query.text()
    );
    assert_eq!(2, query.bindings().len());
}

#[test]
fn test_sub_query_labels_continue() {
    let other = entity("Cat", "other");
    let other_weight: Expr = other.get("weight", ValueType::I32).into();
    let mut inner = QueryMetadata::new();
    inner
        .from(&other)
        .add_projection(other.get("id", ValueType::I64))
        .add_where(other_weight.lt(5));

    let id: Expr = cat().get("id", ValueType::I64).into();
    let mut md = QueryMetadata::new();
    md.from(cat())
        .add_where(name().eq("Tom"))
        .add_where(weight().gt(2))
        .add_where(id.is_in(SubQuery::new(ValueType::I64, inner)));

    let query = jpql().serialize(&md, false, None).unwrap();
    assert_eq!(
        "select cat\nfrom Cat cat\nwhere cat.name = ?1 and cat.weight > ?2 and cat.id in (select other.id\nfrom Cat other\nwhere other.weight < ?3)",
        query.text()
    );
    assert_eq!(
        vec![Value::string("Tom"), Value::I32(2), Value::I32(5)],
        query.constants().cloned().collect::<Vec<_>>()
    );
}

#[test]
fn test_like_escaping() {
    let str: Expr = var(ValueType::String, "str").into();

    let contains = jpql().serialize_expr(&str.contains("abc!")).unwrap();
    assert_eq!("str like ?1 escape '!'", contains.text());
    assert_eq!(vec![Binding::Value(Value::string("%abc!!%"))], contains.bindings());

    let like = jpql().serialize_expr(&str.like("%abc!%")).unwrap();
    assert_eq!("str like ?1 escape '!'", like.text());
    assert_eq!(vec![Binding::Value(Value::string("%abc!!%"))], like.bindings());

    let starts = jpql().serialize_expr(&str.starts_with_ignore_case("AB_")).unwrap();
    assert_eq!("lower(str) like ?1 escape '!'", starts.text());
    assert_eq!(vec![Binding::Value(Value::string("ab!_%"))], starts.bindings());
}

#[test]
fn test_matches_becomes_like() {
    let query = jpql().serialize_expr(&name().matches(".*abc.")).unwrap();
    assert_eq!("cat.name like ?1 escape '!'", query.text());
    assert_eq!(vec![Binding::Value(Value::string("%abc_"))], query.bindings());

    assert!(matches!(
        jpql().serialize_expr(&name().matches("[a-z]+")),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_delete_with_exists() {
    let kitten = entity("Cat", "kitten");
    let mother: Expr = kitten.get("mother", ValueType::entity("Cat")).into();
    let mut inner = QueryMetadata::new();
    inner.from(&kitten).add_where(mother.eq(cat()));

    let mut md = QueryMetadata::new();
    md.from(cat())
        .add_where(name().eq("Tom").and(SubQuery::new(ValueType::entity("Cat"), inner).exists()));

    let query = hql().serialize_delete(&md).unwrap();
    assert_eq!(
        "delete from Cat cat\nwhere cat.name = ?1 and exists (select 1\nfrom Cat kitten\nwhere kitten.mother = cat)",
        query.text()
    );
}

#[test]
fn test_update() {
    let mut md = QueryMetadata::new();
    md.from(cat()).add_where(weight().gt(10));
    let assignments = vec![
        (cat().get("name", ValueType::String), Expr::constant("Bob")),
        (cat().get("nickname", ValueType::String), Expr::constant(Value::Null)),
    ];
    let query = jpql().serialize_update(&md, &assignments).unwrap();
    assert_eq!(
        "update Cat cat\nset cat.name = ?1, cat.nickname = null\nwhere cat.weight > ?2",
        query.text()
    );
}

#[test]
fn test_count_and_projection_override() {
    let mut md = QueryMetadata::new();
    md.from(cat()).set_distinct(true).add_order_by(name().asc());
    assert_eq!(
        "select count(distinct cat)\nfrom Cat cat",
        jpql().serialize(&md, true, None).unwrap().text()
    );
    assert_eq!(
        "select distinct cat\nfrom Cat cat\norder by cat.name asc",
        jpql().serialize(&md, false, None).unwrap().text()
    );
    assert_eq!(
        "select cat.id\nfrom Cat cat\norder by cat.name asc",
        jpql().serialize(&md, false, Some("cat.id")).unwrap().text()
    );

    let mut factory = QueryMetadata::new();
    factory
        .from(cat())
        .add_projection(Expr::from(FactoryExpr::tuple(vec![name(), weight()])));
    assert_eq!(
        "select cat.name, cat.weight\nfrom Cat cat",
        jpql().serialize(&factory, false, None).unwrap().text()
    );
    assert_eq!(
        "select count(cat)\nfrom Cat cat",
        jpql().serialize(&factory, true, None).unwrap().text()
    );
}

#[test]
fn test_joins() {
    let mate: Expr = cat().get("mate", ValueType::entity("Cat")).into();
    let mate_name: Expr = var(ValueType::entity("Cat"), "mate")
        .get("name", ValueType::String)
        .into();
    let kittens: Expr = cat()
        .get("kittens", ValueType::collection_of(ValueType::entity("Cat")))
        .into();

    let mut md = QueryMetadata::new();
    md.from(cat()).left_join(mate.alias("mate"));
    md.add_join_condition(mate_name.eq("Tom")).unwrap();
    md.inner_join(kittens.alias("kitten"));
    md.add_join_flag(JoinFlag::Fetch).unwrap();

    assert_eq!(
        "select cat\nfrom Cat cat\n  left join cat.mate as mate with mate.name = ?1\n  inner join fetch cat.kittens as kitten",
        hql().serialize(&md, false, None).unwrap().text()
    );
    assert_eq!(
        "select count(cat)\nfrom Cat cat\n  left join cat.mate as mate on mate.name = ?1\n  inner join cat.kittens as kitten",
        jpql().serialize(&md, true, None).unwrap().text()
    );
}

#[test]
fn test_collection_constants() {
    let names = name().is_in(vec!["a", "b"]);
    assert_eq!("cat.name in (?1)", hql().serialize_expr(&names).unwrap().text());
    assert_eq!("cat.name in ?1", jpql().serialize_expr(&names).unwrap().text());
}

#[test]
fn test_numeric_normalization() {
    let query = jpql().serialize_expr(&weight().between(1.5f64, 3i64)).unwrap();
    assert_eq!("cat.weight between ?1 and ?2", query.text());
    assert_eq!(
        vec![Binding::Value(Value::I32(1)), Binding::Value(Value::I32(3))],
        query.bindings()
    );
}

#[test]
fn test_num_cast() {
    assert_eq!(
        "cast(cat.weight as long)",
        jpql().serialize_expr(&weight().num_cast(ValueType::I64)).unwrap().text()
    );
}

#[test]
fn test_member_of() {
    let colors = cat().get("colors", ValueType::collection_of(ValueType::Enum("Color".into())));
    let black = Expr::constant(Value::enumeration("Color", "Black", 1));
    let member = black.is_in(&colors);

    let query = jpql().serialize_expr(&member).unwrap();
    assert_eq!("?1 member of cat.colors", query.text());
    assert_eq!(vec![Binding::Value(Value::enumeration("Color", "Black", 1))], query.bindings());

    let query = hql().serialize_expr(&member).unwrap();
    assert_eq!("?1 in elements(cat.colors)", query.text());
    assert_eq!(vec![Binding::Value(Value::I32(1))], query.bindings());

    let metamodel = MapMetamodel::new().enum_encoding("Cat", "colors", EnumEncoding::Name);
    let query = hql()
        .with_metamodel(&metamodel)
        .serialize_expr(&black.not_in(&colors))
        .unwrap();
    assert_eq!("?1 not in elements(cat.colors)", query.text());
    assert_eq!(vec![Binding::Value(Value::string("Black"))], query.bindings());
}

#[test]
fn test_eq_any_becomes_in() {
    let other = entity("Cat", "other");
    let mut inner = QueryMetadata::new();
    inner.from(&other).add_projection(other.get("id", ValueType::I64));
    let id: Expr = cat().get("id", ValueType::I64).into();

    let query = jpql()
        .serialize_expr(&id.ne_any(SubQuery::new(ValueType::I64, inner)))
        .unwrap();
    assert_eq!("cat.id not in (select other.id\nfrom Cat other)", query.text());
}

#[test]
fn test_entities_compared_by_identifier() {
    let dialect = DialectBuilder::new("jpql_by_id", Family::Jpql)
        .unwrap()
        .path_in_entities(false)
        .build()
        .unwrap();
    let metamodel = MapMetamodel::new().id("Cat", "id", ValueType::I64);
    let identifiers = FieldIdentifiers::new(&metamodel);
    let tom = Value::entity(EntityValue::new("Cat").field("id", 1i64));
    let kitty = Value::entity(EntityValue::new("Cat").field("id", 2i64));

    let predicate = Expr::from(cat()).is_in(vec![tom.clone(), kitty, tom]);
    let query = Serializer::new(&dialect)
        .with_metamodel(&metamodel)
        .with_identifiers(&identifiers)
        .serialize_expr(&predicate)
        .unwrap();
    assert_eq!("cat.id in ?1", query.text());
    assert_eq!(
        vec![Binding::Value(Value::List(vec![Value::I64(1), Value::I64(2)]))],
        query.bindings()
    );

    // without an extractor the entities are bound as they are
    let query = Serializer::new(&dialect).serialize_expr(&predicate).unwrap();
    assert_eq!("cat in ?1", query.text());
}

#[test]
fn test_instance_of() {
    let domestic = ValueType::entity("domain::DomesticCat");
    let predicate = Expr::from(cat()).instance_of(domestic);

    let query = hql().serialize_expr(&predicate).unwrap();
    assert_eq!("cat.class = ?1", query.text());
    assert_eq!(vec![Binding::Value(Value::string("DomesticCat"))], query.bindings());

    let metamodel = MapMetamodel::new().discriminator("domain::DomesticCat", "DC");
    let query = hql().with_metamodel(&metamodel).serialize_expr(&predicate).unwrap();
    assert_eq!(vec![Binding::Value(Value::string("DC"))], query.bindings());

    assert_eq!("type(cat) = ?1", jpql().serialize_expr(&predicate).unwrap().text());

    let type_of = Expr::from(cat()).type_of();
    assert_eq!("cat.class", hql().serialize_expr(&type_of).unwrap().text());
    assert_eq!("type(cat)", jpql().serialize_expr(&type_of).unwrap().text());
}

#[test]
fn test_elements_wrapping() {
    let kittens: Expr = cat()
        .get("kittens", ValueType::collection_of(ValueType::entity("Cat")))
        .into();
    let query = hql().serialize_expr(&Expr::from(cat()).gt_all(kittens.clone())).unwrap();
    assert_eq!("cat > all elements(cat.kittens)", query.text());
    assert_eq!("size(cat.kittens)", hql().serialize_expr(&kittens.size()).unwrap().text());
}

#[test]
fn test_precedence() {
    let query = jpql()
        .serialize_expr(&weight().add(2).mul(weight().sub(1)).gt(10))
        .unwrap();
    assert_eq!("(cat.weight + ?1) * (cat.weight - ?2) > ?3", query.text());

    let either = name().eq("a").or(name().eq("b"));
    let query = jpql().serialize_expr(&either.and(weight().gt(1))).unwrap();
    assert_eq!("(cat.name = ?1 or cat.name = ?2) and cat.weight > ?3", query.text());
}

#[test]
fn test_case_when() {
    let size = Expr::case()
        .when(weight().gt(10))
        .then("big")
        .otherwise("small");
    let query = jpql().serialize_expr(&size).unwrap();
    assert_eq!("case when (cat.weight > ?1) then ?2 else ?3 end", query.text());
}

#[test]
fn test_jpql_keeps_pagination_external() {
    let mut md = QueryMetadata::new();
    md.from(cat()).set_limit(10).set_offset(20);
    let query = jpql().serialize(&md, false, None).unwrap();
    assert_eq!("select cat\nfrom Cat cat", query.text());
    assert_eq!(QueryModifiers::new(Some(10), Some(20)), query.modifiers());
}

#[test]
fn test_custom_operator() {
    let bitand = Operator::custom("bitand");
    let expr: Expr = Operation::new(ValueType::I32, bitand.clone(), vec![weight(), Expr::constant(1)])
        .unwrap()
        .into();
    assert!(matches!(
        jpql().serialize_expr(&expr),
        Err(Error::MissingTemplate { .. })
    ));

    let dialect = DialectBuilder::new("jpql_bits", Family::Jpql)
        .unwrap()
        .template(bitand, "{0} & {1}")
        .unwrap()
        .build()
        .unwrap();
    let query = Serializer::new(&dialect).serialize_expr(&expr).unwrap();
    assert_eq!("cat.weight & ?1", query.text());
}
