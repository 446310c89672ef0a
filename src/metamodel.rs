//! Lookups the serializer needs about the mapped domain model.
//!
//! Entity and property annotations live outside the expression tree; a
//! [`Metamodel`] answers them by type and property name instead.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumEncoding {
    #[default]
    Ordinal,
    Name,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityInfo {
    /// Entity name used by the JPQL family.
    pub name: Option<SmolStr>,
    /// Table name used by the SQL family.
    pub table: Option<SmolStr>,
    pub id: Option<(SmolStr, ValueType)>,
    /// Value stored for the type in the discriminator column.
    pub discriminator: Option<SmolStr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Column or document key overriding the property name.
    pub column: Option<SmolStr>,
    pub enum_encoding: Option<EnumEncoding>,
}

pub trait Metamodel: Send + Sync {
    fn entity(&self, ty: &ValueType) -> Option<EntityInfo> {
        let _ = ty;
        None
    }

    fn property(&self, owner: &ValueType, name: &str) -> Option<PropertyInfo> {
        let _ = (owner, name);
        None
    }
}

pub trait IdentifierExtractor: Send + Sync {
    fn identifier(&self, entity: &Value) -> Option<Value>;
}

/// Metamodel with no mapping information, every name is used as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetamodel;

impl Metamodel for NoMetamodel {}

#[derive(Debug, Clone, Default)]
pub struct MapMetamodel {
    entities: IndexMap<SmolStr, EntityInfo>,
    properties: IndexMap<(SmolStr, SmolStr), PropertyInfo>,
}

impl MapMetamodel {
    pub fn new() -> Self {
        Self::default()
    }

    fn entity_mut(&mut self, ty: &str) -> &mut EntityInfo {
        self.entities.entry(SmolStr::new(ty)).or_default()
    }

    fn property_mut(&mut self, ty: &str, property: &str) -> &mut PropertyInfo {
        self.properties
            .entry((SmolStr::new(ty), SmolStr::new(property)))
            .or_default()
    }

    pub fn entity_name(mut self, ty: &str, name: &str) -> Self {
        self.entity_mut(ty).name = Some(SmolStr::new(name));
        self
    }

    pub fn table(mut self, ty: &str, table: &str) -> Self {
        self.entity_mut(ty).table = Some(SmolStr::new(table));
        self
    }

    pub fn id(mut self, ty: &str, property: &str, id_type: ValueType) -> Self {
        self.entity_mut(ty).id = Some((SmolStr::new(property), id_type));
        self
    }

    pub fn discriminator(mut self, ty: &str, value: &str) -> Self {
        self.entity_mut(ty).discriminator = Some(SmolStr::new(value));
        self
    }

    pub fn column(mut self, ty: &str, property: &str, column: &str) -> Self {
        self.property_mut(ty, property).column = Some(SmolStr::new(column));
        self
    }

    pub fn enum_encoding(mut self, ty: &str, property: &str, encoding: EnumEncoding) -> Self {
        self.property_mut(ty, property).enum_encoding = Some(encoding);
        self
    }
}

fn type_key(ty: &ValueType) -> Option<&str> {
    match ty {
        ValueType::Entity(name) | ValueType::Enum(name) => Some(name.as_str()),
        ValueType::Collection(inner) => type_key(inner),
        ValueType::Map(_, value) => type_key(value),
        _ => None,
    }
}

impl Metamodel for MapMetamodel {
    fn entity(&self, ty: &ValueType) -> Option<EntityInfo> {
        self.entities.get(type_key(ty)?).cloned()
    }

    fn property(&self, owner: &ValueType, name: &str) -> Option<PropertyInfo> {
        let key = (SmolStr::new(type_key(owner)?), SmolStr::new(name));
        self.properties.get(&key).cloned()
    }
}

/// Reads the identifier field named by a metamodel out of an entity value.
#[derive(Debug)]
pub struct FieldIdentifiers<'m, M: ?Sized> {
    metamodel: &'m M,
}

impl<'m, M: Metamodel + ?Sized> FieldIdentifiers<'m, M> {
    pub fn new(metamodel: &'m M) -> Self {
        Self { metamodel }
    }
}

impl<M: Metamodel + ?Sized> IdentifierExtractor for FieldIdentifiers<'_, M> {
    fn identifier(&self, entity: &Value) -> Option<Value> {
        let Value::Entity(entity) = entity else {
            return None;
        };
        let info = self.metamodel.entity(&ValueType::Entity(entity.ty.clone()))?;
        let (id, _) = info.id?;
        entity.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use crate::value::EntityValue;

    use super::*;

    #[test]
    fn test_map_metamodel() {
        let metamodel = MapMetamodel::new()
            .entity_name("domain::Cat", "Cat")
            .table("domain::Cat", "CATS")
            .id("domain::Cat", "id", ValueType::I64)
            .column("domain::Cat", "bodyWeight", "BODY_WEIGHT");

        let cat = ValueType::entity("domain::Cat");
        let info = metamodel.entity(&cat).unwrap();
        assert_eq!(Some("CATS"), info.table.as_deref());
        assert_eq!(
            Some(SmolStr::new("BODY_WEIGHT")),
            metamodel.property(&cat, "bodyWeight").unwrap().column
        );
        assert!(metamodel.property(&cat, "name").is_none());
        // collections resolve to their element type
        assert!(metamodel.entity(&ValueType::collection_of(cat)).is_some());
        assert!(NoMetamodel.entity(&ValueType::entity("domain::Cat")).is_none());
    }

    #[test]
    fn test_field_identifiers() {
        let metamodel = MapMetamodel::new().id("Cat", "id", ValueType::I64);
        let extractor = FieldIdentifiers::new(&metamodel);
        let cat = Value::entity(EntityValue::new("Cat").field("id", 7i64).field("name", "Tom"));
        assert_eq!(Some(Value::I64(7)), extractor.identifier(&cat));
        assert_eq!(None, extractor.identifier(&Value::I64(7)));
    }
}
