//! Turns query metadata and expressions into statement text plus the ordered
//! list of values to bind.

mod operation;
mod query;
mod visit;

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    dialect::{Dialect, HasDialect},
    error::{Error, Result},
    expr::{Expr, Param, Path},
    metadata::{QueryMetadata, QueryModifiers},
    metamodel::{IdentifierExtractor, Metamodel, NoMetamodel},
    value::Value,
    writer::{Binding, FormatContext, FormatWriter},
};

pub use query::InsertSource;

/// Rendered statement text and its bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedQuery {
    text: String,
    bindings: Vec<Binding>,
    modifiers: QueryModifiers,
}

impl SerializedQuery {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Limit and offset the execution layer has to apply itself, for
    /// dialects that do not render them.
    pub fn modifiers(&self) -> QueryModifiers {
        self.modifiers
    }

    /// Constant bindings only, in placeholder order.
    pub fn constants(&self) -> impl Iterator<Item = &Value> {
        self.bindings.iter().filter_map(|binding| match binding {
            Binding::Value(value) => Some(value),
            Binding::Param(_) => None,
        })
    }

    /// Resolve every binding to a value, looking parameters up in `params`.
    pub fn bind(&self, params: &IndexMap<Param, Value>) -> Result<Vec<Value>> {
        self.bindings
            .iter()
            .map(|binding| match binding {
                Binding::Value(value) => Ok(value.clone()),
                Binding::Param(param) => params
                    .get(param)
                    .cloned()
                    .ok_or_else(|| Error::UnboundParam(param.name().into())),
            })
            .collect()
    }

    pub fn into_parts(self) -> (String, Vec<Binding>) {
        (self.text, self.bindings)
    }
}

impl fmt::Display for SerializedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Serializer bound to one dialect and, optionally, a metamodel.
///
/// Every call renders one top-level statement; placeholder labels start over
/// on each call and are shared with the sub-queries nested inside it.
#[derive(Clone, Copy)]
pub struct Serializer<'a> {
    dialect: &'a Dialect,
    metamodel: &'a dyn Metamodel,
    identifiers: Option<&'a dyn IdentifierExtractor>,
}

impl fmt::Debug for Serializer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

impl<'a> Serializer<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            metamodel: &NoMetamodel,
            identifiers: None,
        }
    }

    pub fn for_dialect<D: HasDialect>() -> Serializer<'static> {
        Serializer::new(D::dialect())
    }

    pub fn with_metamodel(mut self, metamodel: &'a dyn Metamodel) -> Self {
        self.metamodel = metamodel;
        self
    }

    pub fn with_identifiers(mut self, identifiers: &'a dyn IdentifierExtractor) -> Self {
        self.identifiers = Some(identifiers);
        self
    }

    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    fn run<F>(&self, statement: &'static str, modifiers: QueryModifiers, write: F) -> Result<SerializedQuery>
    where
        F: FnOnce(&mut FormatContext<'_, String>) -> Result<()>,
    {
        let mut text = String::new();
        let mut ctx = FormatContext::new(&mut text, self.dialect, self.metamodel, self.identifiers);
        write(&mut ctx)?;
        let bindings = std::mem::take(&mut ctx.bindings).into_vec();
        debug!(
            dialect = self.dialect.name(),
            statement,
            bindings = bindings.len(),
            "serialized statement"
        );
        Ok(SerializedQuery {
            text,
            bindings,
            modifiers,
        })
    }

    /// Render a select, or a count over the same sources when `for_count`.
    ///
    /// `projection` replaces the whole projection with verbatim text.
    pub fn serialize(
        &self,
        md: &QueryMetadata,
        for_count: bool,
        projection: Option<&str>,
    ) -> Result<SerializedQuery> {
        let statement = if for_count { "count" } else { "select" };
        self.run(statement, md.modifiers(), |ctx| {
            query::write_query(ctx, md, for_count, projection)
        })
    }

    pub fn serialize_delete(&self, md: &QueryMetadata) -> Result<SerializedQuery> {
        self.run("delete", QueryModifiers::default(), |ctx| query::write_delete(ctx, md))
    }

    pub fn serialize_update(&self, md: &QueryMetadata, assignments: &[(Path, Expr)]) -> Result<SerializedQuery> {
        self.run("update", QueryModifiers::default(), |ctx| {
            query::write_update(ctx, md, assignments)
        })
    }

    pub fn serialize_insert(
        &self,
        root: &Path,
        columns: &[Path],
        source: InsertSource<'_>,
    ) -> Result<SerializedQuery> {
        self.run("insert", QueryModifiers::default(), |ctx| {
            query::write_insert(ctx, root, columns, source)
        })
    }

    pub fn serialize_merge(
        &self,
        root: &Path,
        keys: &[Path],
        columns: &[Path],
        source: InsertSource<'_>,
    ) -> Result<SerializedQuery> {
        self.run("merge", QueryModifiers::default(), |ctx| {
            query::write_merge(ctx, root, keys, columns, source)
        })
    }

    pub fn serialize_expr(&self, expr: &Expr) -> Result<SerializedQuery> {
        self.run("expression", QueryModifiers::default(), |ctx| expr.format_writer(ctx))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        dialect::{Hql, Jpql, Postgres},
        expr::Path,
        value::ValueType,
    };

    use super::*;

    fn cat() -> Path {
        Path::entity("Cat", "cat")
    }

    #[test]
    fn test_select_entity() {
        let mut md = QueryMetadata::new();
        md.from(cat());
        let query = Serializer::for_dialect::<Jpql>().serialize(&md, false, None).unwrap();
        assert_eq!("select cat\nfrom Cat cat", query.text());
        let count = Serializer::for_dialect::<Jpql>().serialize(&md, true, None).unwrap();
        assert_eq!("select count(cat)\nfrom Cat cat", count.text());
    }

    #[test]
    fn test_jpql_requires_root() {
        let md = QueryMetadata::new();
        let result = Serializer::for_dialect::<Jpql>().serialize(&md, false, None);
        assert!(matches!(result, Err(Error::MissingRoot)));
        let delete = Serializer::for_dialect::<Hql>().serialize_delete(&md);
        assert!(matches!(delete, Err(Error::MissingRoot)));
    }

    #[test]
    fn test_bind_params() {
        let name: Expr = cat().get("name", ValueType::String).into();
        let param = Param::new(ValueType::String, "name");
        let mut md = QueryMetadata::new();
        md.from(cat()).add_where(name.eq(param.clone()).and(name.ne("Tom")));

        let query = Serializer::for_dialect::<Jpql>().serialize(&md, false, None).unwrap();
        assert_eq!("select cat\nfrom Cat cat\nwhere cat.name = ?1 and cat.name <> ?2", query.text());
        assert!(matches!(
            query.bind(&IndexMap::new()),
            Err(Error::UnboundParam(name)) if name == "name"
        ));

        md.set_param(param, "Kitty");
        let values = query.bind(md.params()).unwrap();
        assert_eq!(vec![Value::string("Kitty"), Value::string("Tom")], values);
        assert_eq!(vec![&Value::string("Tom")], query.constants().collect::<Vec<_>>());
    }

    #[test]
    fn test_serialize_expr() {
        let weight: Expr = cat().get("weight", ValueType::I32).into();
        let query = Serializer::for_dialect::<Postgres>()
            .serialize_expr(&weight.add(1).mul(2))
            .unwrap();
        assert_eq!("(\"cat\".\"weight\" + $1) * $2", query.text());
    }
}
