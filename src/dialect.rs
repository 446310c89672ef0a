use std::sync::LazyLock;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    error::Result,
    expr::PathKind,
    operator::{Op, Operator},
    registry::{self, Templates},
    template::Template,
    value::ValueType,
};

/// Query language family; decides the clause grammar and the rewrites applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Jpql,
    Sql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?1`, `$1`: one label per distinct binding, reused on repeats.
    Numbered(char),
    /// `?`: positional, one binding per occurrence.
    Anonymous,
}

/// How a constant collection is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// A single placeholder, `?1`.
    Bare,
    /// A single placeholder in parentheses, `(?1)`.
    Wrapped,
    /// One placeholder per element, `(?, ?)`.
    Expanded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationTemplates {
    pub limit: Template,
    pub offset: Template,
    /// Arguments are `(limit, offset)`, or `(offset, offset + limit)` for row numbering.
    pub limit_offset: Template,
}

impl PaginationTemplates {
    pub fn parse(limit: &str, offset: &str, limit_offset: &str) -> Result<Self> {
        Ok(Self {
            limit: Template::parse(limit)?,
            offset: Template::parse(offset)?,
            limit_offset: Template::parse(limit_offset)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Limits are applied by the execution layer, nothing is rendered.
    External,
    /// Trailing `limit` / `offset` clauses.
    LimitOffset(PaginationTemplates),
    /// Trailing `offset .. rows fetch next .. rows only` clauses.
    FetchFirst(PaginationTemplates),
    /// `top (n)` for plain limits, a row numbered CTE as soon as an offset is set.
    TopRowNumber {
        top: Template,
        filter: PaginationTemplates,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// `instance of` compares against the discriminator or simple type name.
    pub type_as_string: bool,
    /// Join conditions use `with` instead of `on`.
    pub with_for_on: bool,
    /// `entity in (:entities)` works without comparing identifiers.
    pub path_in_entities: bool,
    /// Enum constants can be tested against collection paths as is.
    pub enum_in_path: bool,
    pub nulls_ordering: bool,
    pub native_merge: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKeywords {
    pub default: SmolStr,
    pub inner: SmolStr,
    pub left: SmolStr,
    pub right: SmolStr,
    pub full: SmolStr,
}

impl JoinKeywords {
    fn indented() -> Self {
        Self {
            default: SmolStr::new_static(", "),
            inner: SmolStr::new_static("\n  inner join "),
            left: SmolStr::new_static("\n  left join "),
            right: SmolStr::new_static("\n  right join "),
            full: SmolStr::new_static("\n  full join "),
        }
    }

    fn flat() -> Self {
        Self {
            default: SmolStr::new_static(", "),
            inner: SmolStr::new_static("\ninner join "),
            left: SmolStr::new_static("\nleft join "),
            right: SmolStr::new_static("\nright join "),
            full: SmolStr::new_static("\nfull join "),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dialect {
    name: SmolStr,
    family: Family,
    templates: Templates,
    quote: Option<char>,
    escape: char,
    placeholder: Placeholder,
    list_style: ListStyle,
    pagination: Pagination,
    capabilities: Capabilities,
    exists_projection: Option<SmolStr>,
    wrap_elements: Vec<Op>,
    type_names: IndexMap<ValueType, SmolStr>,
    join_keywords: JoinKeywords,
}

impl Dialect {
    pub fn builder<T: Into<SmolStr>>(name: T, family: Family) -> Result<DialectBuilder> {
        DialectBuilder::new(name, family)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn escape(&self) -> char {
        self.escape
    }

    pub fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    pub fn list_style(&self) -> ListStyle {
        self.list_style
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn exists_projection(&self) -> Option<&str> {
        self.exists_projection.as_deref()
    }

    pub fn wraps_elements(&self, op: Op) -> bool {
        self.wrap_elements.contains(&op)
    }

    /// Cast target name, falling back to the type's simple name.
    pub fn type_name(&self, ty: &ValueType) -> SmolStr {
        self.type_names
            .get(ty)
            .cloned()
            .unwrap_or_else(|| ty.simple_name())
    }

    pub fn join_keywords(&self) -> &JoinKeywords {
        &self.join_keywords
    }

    pub fn jpql() -> &'static Dialect {
        &JPQL_DIALECT
    }

    pub fn hql() -> &'static Dialect {
        &HQL_DIALECT
    }

    pub fn postgres() -> &'static Dialect {
        &POSTGRES_DIALECT
    }

    pub fn mysql() -> &'static Dialect {
        &MYSQL_DIALECT
    }

    pub fn sqlite() -> &'static Dialect {
        &SQLITE_DIALECT
    }

    pub fn h2() -> &'static Dialect {
        &H2_DIALECT
    }

    pub fn derby() -> &'static Dialect {
        &DERBY_DIALECT
    }

    pub fn sql_server_2005() -> &'static Dialect {
        &SQL_SERVER_2005_DIALECT
    }
}

#[derive(Debug, Clone)]
pub struct DialectBuilder {
    dialect: Dialect,
}

impl DialectBuilder {
    pub fn new<T: Into<SmolStr>>(name: T, family: Family) -> Result<Self> {
        let name = name.into();
        let (escape, placeholder, list_style, join_keywords) = match family {
            Family::Jpql => ('!', Placeholder::Numbered('?'), ListStyle::Bare, JoinKeywords::indented()),
            Family::Sql => ('\\', Placeholder::Anonymous, ListStyle::Expanded, JoinKeywords::flat()),
        };

        let mut templates = Templates::new();
        templates.layer("base");
        base_templates(&mut templates)?;
        templates.layer("like");
        like_templates(&mut templates, escape)?;
        match family {
            Family::Jpql => {
                templates.layer("jpql");
                jpql_templates(&mut templates)?;
            }
            Family::Sql => {
                templates.layer("sql");
                sql_templates(&mut templates)?;
            }
        }
        templates.layer(name.clone());

        let capabilities = Capabilities {
            path_in_entities: true,
            enum_in_path: true,
            nulls_ordering: true,
            ..Capabilities::default()
        };

        Ok(Self {
            dialect: Dialect {
                name,
                family,
                templates,
                quote: None,
                escape,
                placeholder,
                list_style,
                pagination: Pagination::External,
                capabilities,
                exists_projection: None,
                wrap_elements: Vec::new(),
                type_names: sql_type_names(family),
                join_keywords,
            },
        })
    }

    pub fn template<O: Into<Operator>>(mut self, operator: O, pattern: &str) -> Result<Self> {
        self.dialect.templates.register(operator, pattern)?;
        Ok(self)
    }

    pub fn template_with_precedence<O: Into<Operator>>(
        mut self,
        operator: O,
        pattern: &str,
        precedence: i32,
    ) -> Result<Self> {
        self.dialect
            .templates
            .register_with_precedence(operator, pattern, precedence)?;
        Ok(self)
    }

    pub fn templates_mut(&mut self) -> &mut Templates {
        &mut self.dialect.templates
    }

    pub fn layer<T: Into<SmolStr>>(mut self, name: T) -> Self {
        self.dialect.templates.layer(name);
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.dialect.quote = Some(quote);
        self
    }

    /// Change the LIKE escape character, re-registering the LIKE templates that embed it.
    pub fn escape(mut self, escape: char) -> Result<Self> {
        self.dialect.escape = escape;
        like_templates(&mut self.dialect.templates, escape)?;
        Ok(self)
    }

    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.dialect.placeholder = placeholder;
        self
    }

    pub fn list_style(mut self, list_style: ListStyle) -> Self {
        self.dialect.list_style = list_style;
        self
    }

    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.dialect.pagination = pagination;
        self
    }

    pub fn type_as_string(mut self, value: bool) -> Self {
        self.dialect.capabilities.type_as_string = value;
        self
    }

    pub fn with_for_on(mut self, value: bool) -> Self {
        self.dialect.capabilities.with_for_on = value;
        self
    }

    pub fn path_in_entities(mut self, value: bool) -> Self {
        self.dialect.capabilities.path_in_entities = value;
        self
    }

    pub fn enum_in_path(mut self, value: bool) -> Self {
        self.dialect.capabilities.enum_in_path = value;
        self
    }

    pub fn nulls_ordering(mut self, value: bool) -> Self {
        self.dialect.capabilities.nulls_ordering = value;
        self
    }

    pub fn native_merge(mut self, value: bool) -> Self {
        self.dialect.capabilities.native_merge = value;
        self
    }

    pub fn exists_projection<T: Into<SmolStr>>(mut self, projection: T) -> Self {
        self.dialect.exists_projection = Some(projection.into());
        self
    }

    /// Operators inside which collection paths render as `elements(..)`.
    pub fn wrap_elements<I: IntoIterator<Item = Op>>(mut self, ops: I) -> Self {
        self.dialect.wrap_elements.extend(ops);
        self
    }

    pub fn type_name<T: Into<SmolStr>>(mut self, ty: ValueType, name: T) -> Self {
        self.dialect.type_names.insert(ty, name.into());
        self
    }

    pub fn join_keywords(mut self, keywords: JoinKeywords) -> Self {
        self.dialect.join_keywords = keywords;
        self
    }

    /// Finish the profile, failing when a core operator has no template.
    pub fn build(self) -> Result<Dialect> {
        let dialect = self.dialect;
        dialect
            .templates
            .require(registry::core_operators(), &dialect.name)?;
        Ok(dialect)
    }
}

fn register_all(templates: &mut Templates, entries: &[(Op, &str)]) -> Result<()> {
    for (op, pattern) in entries {
        templates.register(*op, pattern)?;
    }
    Ok(())
}

fn base_templates(templates: &mut Templates) -> Result<()> {
    register_all(
        templates,
        &[
            (Op::Eq, "{0} = {1}"),
            (Op::Ne, "{0} <> {1}"),
            (Op::Lt, "{0} < {1}"),
            (Op::Gt, "{0} > {1}"),
            (Op::Loe, "{0} <= {1}"),
            (Op::Goe, "{0} >= {1}"),
            (Op::Between, "{0} between {1} and {2}"),
            (Op::In, "{0} in {1}"),
            (Op::NotIn, "{0} not in {1}"),
            (Op::IsNull, "{0} is null"),
            (Op::IsNotNull, "{0} is not null"),
            (Op::EqIgnoreCase, "{0l} = {1l}"),
            (Op::And, "{0} and {1}"),
            (Op::Or, "{0} or {1}"),
            (Op::Not, "not {0}"),
            (Op::Add, "{0} + {1}"),
            (Op::Sub, "{0} - {1}"),
            (Op::Mult, "{0} * {1}"),
            (Op::Div, "{0} / {1}"),
            (Op::Mod, "mod({0},{1})"),
            (Op::Negate, "-{0}"),
            (Op::Concat, "{0} || {1}"),
            (Op::Lower, "lower({0})"),
            (Op::Upper, "upper({0})"),
            (Op::Trim, "trim({0})"),
            (Op::Length, "length({0})"),
            (Op::Substr1Arg, "substr({0},{1}+1)"),
            (Op::Substr2Args, "substr({0},{1}+1,{2}-{1})"),
            (Op::Locate, "locate({0},{1})"),
            (Op::StringIsEmpty, "length({0}) = 0"),
            (Op::Any, "any {0}"),
            (Op::All, "all {0}"),
            (Op::Exists, "exists {0}"),
            (Op::Count, "count({0})"),
            (Op::CountDistinct, "count(distinct {0})"),
            (Op::CountAll, "count(*)"),
            (Op::Sum, "sum({0})"),
            (Op::Avg, "avg({0})"),
            (Op::Min, "min({0})"),
            (Op::Max, "max({0})"),
            (Op::CurrentDate, "current_date"),
            (Op::CurrentTime, "current_time"),
            (Op::CurrentTimestamp, "current_timestamp"),
            (Op::Year, "year({0})"),
            (Op::Month, "month({0})"),
            (Op::DayOfMonth, "day({0})"),
            (Op::Hour, "hour({0})"),
            (Op::Minute, "minute({0})"),
            (Op::Second, "second({0})"),
            (Op::Abs, "abs({0})"),
            (Op::Sqrt, "sqrt({0})"),
            (Op::Round, "round({0})"),
            (Op::Ceil, "ceil({0})"),
            (Op::Floor, "floor({0})"),
            (Op::Power, "power({0},{1})"),
            (Op::Ln, "ln({0})"),
            (Op::Log, "log({1},{0})"),
            (Op::Random, "random()"),
            (Op::Cast, "cast({0} as {1s})"),
            (Op::StringCast, "cast({0} as varchar)"),
            (Op::Case, "case {0} end"),
            (Op::CaseWhen, "when {0} then {1} {2}"),
            (Op::CaseElse, "else {0}"),
            (Op::CaseEq, "case {0} {1} end"),
            (Op::CaseEqWhen, "when {1} then {2} {3}"),
            (Op::CaseEqElse, "else {0}"),
            (Op::Coalesce, "coalesce({*})"),
            (Op::List, "{0}, {1}"),
            (Op::Alias, "{0} as {1}"),
            (Op::Wrapped, "({0})"),
        ],
    )?;
    templates
        .register(PathKind::Variable, "{0s}")?
        .register(PathKind::Property, "{0}.{1s}")?;
    Ok(())
}

fn like_templates(templates: &mut Templates, escape: char) -> Result<()> {
    let like = |pattern: &str| format!("{pattern} escape '{escape}'");
    templates
        .register(Op::Like, &like("{0} like {1}"))?
        .register(Op::StartsWith, &like("{0} like {1%}"))?
        .register(Op::StartsWithIc, &like("{0l} like {1%%}"))?
        .register(Op::EndsWith, &like("{0} like {%1}"))?
        .register(Op::EndsWithIc, &like("{0l} like {%%1}"))?
        .register(Op::StringContains, &like("{0} like {%1%}"))?
        .register(Op::StringContainsIc, &like("{0l} like {%%1%%}"))?;
    Ok(())
}

fn jpql_templates(templates: &mut Templates) -> Result<()> {
    register_all(
        templates,
        &[
            (Op::Substr1Arg, "substring({0},{1}+1)"),
            (Op::Substr2Args, "substring({0},{1}+1,{2}-{1})"),
            (Op::StringCast, "str({0})"),
            (Op::ColIsEmpty, "{0} is empty"),
            (Op::ColSize, "size({0})"),
            (Op::MapIsEmpty, "{0} is empty"),
            (Op::MapSize, "size({0})"),
            (Op::MemberOf, "{0} member of {1}"),
            (Op::NotMemberOf, "{0} not member of {1}"),
            (Op::InstanceOf, "type({0}) = {1}"),
            (Op::TypeOf, "type({0})"),
            (Op::AvgInCol, "avg({0})"),
            (Op::MaxInCol, "max({0})"),
            (Op::MinInCol, "min({0})"),
        ],
    )?;
    templates.register_with_precedence(Op::Concat, "concat({0},{1})", -1)?;
    Ok(())
}

fn sql_templates(templates: &mut Templates) -> Result<()> {
    register_all(
        templates,
        &[
            (Op::AvgInCol, "avg({0})"),
            (Op::MaxInCol, "max({0})"),
            (Op::MinInCol, "min({0})"),
        ],
    )
}

fn sql_type_names(family: Family) -> IndexMap<ValueType, SmolStr> {
    if family == Family::Jpql {
        return IndexMap::new();
    }
    [
        (ValueType::Bool, "boolean"),
        (ValueType::I8, "tinyint"),
        (ValueType::I16, "smallint"),
        (ValueType::I32, "integer"),
        (ValueType::I64, "bigint"),
        (ValueType::F32, "real"),
        (ValueType::F64, "double precision"),
        (ValueType::String, "varchar"),
        (ValueType::Date, "date"),
        (ValueType::Time, "time"),
        (ValueType::DateTime, "timestamp"),
    ]
    .into_iter()
    .map(|(ty, name)| (ty, SmolStr::new_static(name)))
    .collect()
}

fn limit_offset() -> Result<Pagination> {
    Ok(Pagination::LimitOffset(PaginationTemplates::parse(
        "\nlimit {0}",
        "\noffset {0}",
        "\nlimit {0}\noffset {1}",
    )?))
}

fn jpql_profile() -> Result<Dialect> {
    DialectBuilder::new("jpql", Family::Jpql)?.build()
}

fn hql_profile() -> Result<Dialect> {
    let mut builder = DialectBuilder::new("hql", Family::Jpql)?
        .template(Op::InstanceOf, "{0}.class = {1}")?
        .template(Op::TypeOf, "{0}.class")?
        .template(Op::MemberOf, "{0} in elements({1})")?
        .template(Op::NotMemberOf, "{0} not in elements({1})")?
        .template(Op::ContainsKey, "{1} in indices({0})")?
        .template(Op::ContainsValue, "{1} in elements({0})")?;
    builder
        .templates_mut()
        .register(PathKind::ListValue, "{0}[{1}]")?
        .register(PathKind::MapValue, "{0}[{1}]")?
        .register(PathKind::MapValueConstant, "{0}[{1}]")?
        .register(PathKind::ListValueConstant, "{0}[{1s}]")?
        .register(PathKind::CollectionAny, "any elements({0})")?;
    builder
        .wrap_elements([Op::All, Op::Any, Op::AvgInCol, Op::Exists])
        .type_as_string(true)
        .exists_projection("1")
        .enum_in_path(false)
        .list_style(ListStyle::Wrapped)
        .with_for_on(true)
        .build()
}

fn postgres_profile() -> Result<Dialect> {
    DialectBuilder::new("postgres", Family::Sql)?
        .quote('"')
        .placeholder(Placeholder::Numbered('$'))
        .pagination(limit_offset()?)
        .type_name(ValueType::I8, "smallint")
        .template(Op::Locate, "strpos({1},{0})")?
        .template(Op::Matches, "{0} ~ {1}")?
        .template(Op::MatchesIc, "{0} ~* {1}")?
        .template(Op::Year, "extract(year from {0})")?
        .template(Op::Month, "extract(month from {0})")?
        .template(Op::DayOfMonth, "extract(day from {0})")?
        .template(Op::Hour, "extract(hour from {0})")?
        .template(Op::Minute, "extract(minute from {0})")?
        .template(Op::Second, "extract(second from {0})")?
        .template_with_precedence(Op::AddDays, "{0} + {1} * interval '1 day'", 13)?
        .template_with_precedence(Op::AddMonths, "{0} + {1} * interval '1 month'", 13)?
        .template_with_precedence(Op::AddYears, "{0} + {1} * interval '1 year'", 13)?
        .template(Op::DiffDays, "date_part('day', {1} - {0})")?
        .template(Op::Nextval, "nextval('{0s}')")?
        .build()
}

fn mysql_profile() -> Result<Dialect> {
    DialectBuilder::new("mysql", Family::Sql)?
        .quote('`')
        .escape('!')?
        .nulls_ordering(false)
        .pagination(limit_offset()?)
        .type_name(ValueType::I8, "signed")
        .type_name(ValueType::I16, "signed")
        .type_name(ValueType::I32, "signed")
        .type_name(ValueType::I64, "signed")
        .type_name(ValueType::F32, "float")
        .type_name(ValueType::F64, "double")
        .type_name(ValueType::String, "char")
        .type_name(ValueType::DateTime, "datetime")
        .template_with_precedence(Op::Concat, "concat({0},{1})", -1)?
        .template(Op::StringCast, "cast({0} as char)")?
        .template(Op::Matches, "{0} regexp {1}")?
        .template(Op::Random, "rand()")?
        .template(Op::AddDays, "date_add({0}, interval {1} day)")?
        .template(Op::AddMonths, "date_add({0}, interval {1} month)")?
        .template(Op::AddYears, "date_add({0}, interval {1} year)")?
        .template(Op::DiffDays, "datediff({1},{0})")?
        .build()
}

fn sqlite_profile() -> Result<Dialect> {
    DialectBuilder::new("sqlite", Family::Sql)?
        .quote('"')
        .pagination(limit_offset()?)
        .type_name(ValueType::I8, "integer")
        .type_name(ValueType::I16, "integer")
        .type_name(ValueType::I64, "integer")
        .type_name(ValueType::F32, "real")
        .type_name(ValueType::F64, "real")
        .type_name(ValueType::String, "text")
        .template(Op::StringCast, "cast({0} as text)")?
        .template_with_precedence(Op::Mod, "{0} % {1}", 12)?
        .template(Op::Locate, "instr({1},{0})")?
        .template(Op::Matches, "{0} regexp {1}")?
        .template(Op::Year, "cast(strftime('%Y',{0}) as integer)")?
        .template(Op::Month, "cast(strftime('%m',{0}) as integer)")?
        .template(Op::DayOfMonth, "cast(strftime('%d',{0}) as integer)")?
        .template(Op::Hour, "cast(strftime('%H',{0}) as integer)")?
        .template(Op::Minute, "cast(strftime('%M',{0}) as integer)")?
        .template(Op::Second, "cast(strftime('%S',{0}) as integer)")?
        .template(Op::AddDays, "date({0}, '+' || {1} || ' days')")?
        .template(Op::AddMonths, "date({0}, '+' || {1} || ' months')")?
        .template(Op::AddYears, "date({0}, '+' || {1} || ' years')")?
        .template_with_precedence(Op::DiffDays, "julianday({1}) - julianday({0})", 13)?
        .build()
}

fn h2_profile() -> Result<Dialect> {
    DialectBuilder::new("h2", Family::Sql)?
        .native_merge(true)
        .pagination(limit_offset()?)
        .type_name(ValueType::F64, "double")
        .template(Op::Matches, "{0} regexp {1}")?
        .template(Op::Random, "rand()")?
        .template(Op::AddDays, "dateadd('day', {1}, {0})")?
        .template(Op::AddMonths, "dateadd('month', {1}, {0})")?
        .template(Op::AddYears, "dateadd('year', {1}, {0})")?
        .template(Op::DiffDays, "datediff('day',{0},{1})")?
        .template(Op::Nextval, "{0s}.nextval")?
        .build()
}

fn derby_profile() -> Result<Dialect> {
    DialectBuilder::new("derby", Family::Sql)?
        .pagination(Pagination::FetchFirst(PaginationTemplates::parse(
            "\nfetch first {0s} rows only",
            "\noffset {0s} rows",
            "\noffset {1s} rows fetch next {0s} rows only",
        )?))
        .type_name(ValueType::I8, "smallint")
        .type_name(ValueType::F64, "double")
        .template_with_precedence(Op::Concat, "varchar({0} || {1})", -1)?
        .template(Op::Nextval, "next value for {0s}")?
        .template(Op::CaseEq, "case {1} end")?
        .template(Op::CaseEqWhen, "when {0} = {1} then {2} {3}")?
        .template(Op::Round, "floor({0})")?
        .template(Op::Power, "exp({1} * log({0}))")?
        .template(Op::Ln, "log({0})")?
        .template(Op::Log, "(log({0}) / log({1}))")?
        .template(Op::AddDays, "{{fn timestampadd(SQL_TSI_DAY, {1}, {0})}}")?
        .template(Op::AddMonths, "{{fn timestampadd(SQL_TSI_MONTH, {1}, {0})}}")?
        .template(Op::AddYears, "{{fn timestampadd(SQL_TSI_YEAR, {1}, {0})}}")?
        .template(Op::DiffDays, "{{fn timestampdiff(SQL_TSI_DAY, {0}, {1})}}")?
        .build()
}

fn sql_server_2005_profile() -> Result<Dialect> {
    DialectBuilder::new("sql_server_2005", Family::Sql)?
        .nulls_ordering(false)
        .pagination(Pagination::TopRowNumber {
            top: Template::parse("top ({0}) ")?,
            filter: PaginationTemplates::parse(
                "row_number <= {0}",
                "row_number > {0}",
                "row_number > {0} and row_number <= {1}",
            )?,
        })
        .type_name(ValueType::Bool, "bit")
        .type_name(ValueType::F64, "float")
        .type_name(ValueType::DateTime, "datetime")
        .template_with_precedence(Op::Concat, "{0} + {1}", 13)?
        .template_with_precedence(Op::Mod, "{0} % {1}", 12)?
        .template(Op::Length, "len({0})")?
        .template(Op::Substr1Arg, "substring({0},{1}+1,len({0}))")?
        .template(Op::Substr2Args, "substring({0},{1}+1,{2}-{1})")?
        .template(Op::Locate, "charindex({0},{1})")?
        .template(Op::Random, "rand()")?
        .template(Op::Ceil, "ceiling({0})")?
        .template(Op::Ln, "log({0})")?
        .template(Op::Log, "log({0},{1})")?
        .template(Op::Year, "datepart(year,{0})")?
        .template(Op::Month, "datepart(month,{0})")?
        .template(Op::DayOfMonth, "datepart(day,{0})")?
        .template(Op::Hour, "datepart(hour,{0})")?
        .template(Op::Minute, "datepart(minute,{0})")?
        .template(Op::Second, "datepart(second,{0})")?
        .template(Op::AddDays, "dateadd(day, {1}, {0})")?
        .template(Op::AddMonths, "dateadd(month, {1}, {0})")?
        .template(Op::AddYears, "dateadd(year, {1}, {0})")?
        .template(Op::DiffDays, "datediff(day,{0},{1})")?
        .template(Op::Nextval, "{0s}.nextval")?
        .build()
}

static JPQL_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| jpql_profile().expect("valid jpql profile"));
static HQL_DIALECT: LazyLock<Dialect> = LazyLock::new(|| hql_profile().expect("valid hql profile"));
static POSTGRES_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| postgres_profile().expect("valid postgres profile"));
static MYSQL_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| mysql_profile().expect("valid mysql profile"));
static SQLITE_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| sqlite_profile().expect("valid sqlite profile"));
static H2_DIALECT: LazyLock<Dialect> = LazyLock::new(|| h2_profile().expect("valid h2 profile"));
static DERBY_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| derby_profile().expect("valid derby profile"));
static SQL_SERVER_2005_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| sql_server_2005_profile().expect("valid sql server 2005 profile"));

pub trait HasDialect {
    fn dialect() -> &'static Dialect;
}

macro_rules! marker {
    ($($marker:ident => $profile:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $marker;

            impl HasDialect for $marker {
                fn dialect() -> &'static Dialect {
                    Dialect::$profile()
                }
            }
        )*
    };
}

marker! {
    Jpql => jpql,
    Hql => hql,
    Postgres => postgres,
    MySql => mysql,
    Sqlite => sqlite,
    H2 => h2,
    Derby => derby,
    SqlServer2005 => sql_server_2005,
}
