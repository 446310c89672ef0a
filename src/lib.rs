mod dialect;
#[cfg(feature = "json")]
mod document;
mod error;
mod expr;
mod metadata;
mod metamodel;
mod operator;
mod registry;
mod serializer;
mod template;
mod value;
mod writer;

pub use dialect::Capabilities;
pub use dialect::Derby;
pub use dialect::Dialect;
pub use dialect::DialectBuilder;
pub use dialect::Family;
pub use dialect::H2;
pub use dialect::HasDialect;
pub use dialect::Hql;
pub use dialect::JoinKeywords;
pub use dialect::Jpql;
pub use dialect::ListStyle;
pub use dialect::MySql;
pub use dialect::Pagination;
pub use dialect::PaginationTemplates;
pub use dialect::Placeholder;
pub use dialect::Postgres;
pub use dialect::SqlServer2005;
pub use dialect::Sqlite;

#[cfg(feature = "json")]
pub use document::DocumentQuery;
#[cfg(feature = "json")]
pub use document::DocumentSerializer;

pub use error::Error;
pub use error::Result;

pub use expr::*;

pub use metadata::FlagContent;
pub use metadata::Join;
pub use metadata::JoinFlag;
pub use metadata::JoinKind;
pub use metadata::Position;
pub use metadata::QueryFlag;
pub use metadata::QueryMetadata;
pub use metadata::QueryModifiers;

pub use metamodel::EntityInfo;
pub use metamodel::EnumEncoding;
pub use metamodel::FieldIdentifiers;
pub use metamodel::IdentifierExtractor;
pub use metamodel::MapMetamodel;
pub use metamodel::Metamodel;
pub use metamodel::NoMetamodel;
pub use metamodel::PropertyInfo;

pub use operator::Arity;
pub use operator::Op;
pub use operator::Operator;

pub use registry::TemplateEntry;
pub use registry::Templates;

pub use serializer::InsertSource;
pub use serializer::SerializedQuery;
pub use serializer::Serializer;

pub use template::Template;

pub use value::EntityValue;
pub use value::IntoValue;
pub use value::Value;
pub use value::ValueType;

pub use writer::Binding;

/// Entity root `alias` of type `entity`, the usual first source of a query.
pub fn entity(entity: &str, alias: &str) -> Path {
    Path::entity(entity, alias)
}

pub fn var(ty: ValueType, name: &str) -> Path {
    Path::variable(ty, name)
}

pub fn constant<V: IntoValue>(value: V) -> Expr {
    Expr::constant(value)
}

pub fn param(ty: ValueType, name: &str) -> Param {
    Param::new(ty, name)
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::{dialect::Dialect, metamodel::NoMetamodel, writer};

    pub(crate) fn format_writer<W: writer::FormatWriter>(writer: W, dialect: &Dialect) -> String {
        let mut str = String::new();
        let mut context = writer::FormatContext::new(&mut str, dialect, &NoMetamodel, None);
        writer.format_writer(&mut context).unwrap();
        str
    }
}
