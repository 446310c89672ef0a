use std::sync::Arc;

use smol_str::SmolStr;

use crate::value::{IntoValue, Value, ValueType};

use super::Expr;

/// How a path reaches its value from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Variable,
    Property,
    ListValue,
    ListValueConstant,
    MapValue,
    MapValueConstant,
    CollectionAny,
}

impl PathKind {
    pub const ALL: &'static [PathKind] = &[
        PathKind::Variable,
        PathKind::Property,
        PathKind::ListValue,
        PathKind::ListValueConstant,
        PathKind::MapValue,
        PathKind::MapValueConstant,
        PathKind::CollectionAny,
    ];

    pub fn arity(self) -> crate::operator::Arity {
        match self {
            PathKind::Variable | PathKind::CollectionAny => crate::operator::Arity::Exact(1),
            _ => crate::operator::Arity::Exact(2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PathKind::Variable => "VARIABLE",
            PathKind::Property => "PROPERTY",
            PathKind::ListValue => "LIST_VALUE",
            PathKind::ListValueConstant => "LIST_VALUE_CONSTANT",
            PathKind::MapValue => "MAP_VALUE",
            PathKind::MapValueConstant => "MAP_VALUE_CONSTANT",
            PathKind::CollectionAny => "COLLECTION_ANY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Variable(SmolStr),
    Property(SmolStr),
    ListValue(Expr),
    ListValueConstant(usize),
    MapValue(Expr),
    MapValueConstant(Value),
    CollectionAny,
}

impl PathElement {
    pub fn kind(&self) -> PathKind {
        match self {
            PathElement::Variable(_) => PathKind::Variable,
            PathElement::Property(_) => PathKind::Property,
            PathElement::ListValue(_) => PathKind::ListValue,
            PathElement::ListValueConstant(_) => PathKind::ListValueConstant,
            PathElement::MapValue(_) => PathKind::MapValue,
            PathElement::MapValueConstant(_) => PathKind::MapValueConstant,
            PathElement::CollectionAny => PathKind::CollectionAny,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct PathInner {
    ty: ValueType,
    parent: Option<Path>,
    element: PathElement,
}

/// A variable or an access chained from a parent path.
///
/// Paths only ever point at strictly shallower parents, so walking the
/// parent chain always terminates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Arc<PathInner>);

impl Path {
    pub fn variable<T: Into<SmolStr>>(ty: ValueType, name: T) -> Self {
        Self(Arc::new(PathInner {
            ty,
            parent: None,
            element: PathElement::Variable(name.into()),
        }))
    }

    pub fn entity<T: Into<SmolStr>, N: Into<SmolStr>>(entity: T, alias: N) -> Self {
        Self::variable(ValueType::Entity(entity.into()), alias)
    }

    fn child(&self, ty: ValueType, element: PathElement) -> Self {
        Self(Arc::new(PathInner {
            ty,
            parent: Some(self.clone()),
            element,
        }))
    }

    pub fn get<T: Into<SmolStr>>(&self, property: T, ty: ValueType) -> Self {
        self.child(ty, PathElement::Property(property.into()))
    }

    pub fn at(&self, index: usize, ty: ValueType) -> Self {
        self.child(ty, PathElement::ListValueConstant(index))
    }

    pub fn at_expr<E: Into<Expr>>(&self, index: E, ty: ValueType) -> Self {
        self.child(ty, PathElement::ListValue(index.into()))
    }

    pub fn value_of<K: IntoValue>(&self, key: K, ty: ValueType) -> Self {
        self.child(ty, PathElement::MapValueConstant(key.into_value()))
    }

    pub fn value_at<E: Into<Expr>>(&self, key: E, ty: ValueType) -> Self {
        self.child(ty, PathElement::MapValue(key.into()))
    }

    /// Any element of a collection valued path.
    pub fn any(&self) -> Self {
        let ty = match &self.0.ty {
            ValueType::Collection(inner) => inner.as_ref().clone(),
            ValueType::Map(_, value) => value.as_ref().clone(),
            other => other.clone(),
        };
        self.child(ty, PathElement::CollectionAny)
    }

    pub fn ty(&self) -> &ValueType {
        &self.0.ty
    }

    pub fn parent(&self) -> Option<&Path> {
        self.0.parent.as_ref()
    }

    pub fn element(&self) -> &PathElement {
        &self.0.element
    }

    pub fn kind(&self) -> PathKind {
        self.0.element.kind()
    }

    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    pub fn root(&self) -> &Path {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn name(&self) -> Option<&str> {
        match &self.0.element {
            PathElement::Variable(name) | PathElement::Property(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Whether `self` is `other` or reachable from it through the parent chain.
    pub fn is_rooted_in(&self, other: &Path) -> bool {
        let mut current = Some(self);
        while let Some(path) = current {
            if path == other {
                return true;
            }
            current = path.parent();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_chain() {
        let cat = Path::entity("Cat", "cat");
        let mate = cat.get("mate", ValueType::entity("Cat"));
        let name = mate.get("name", ValueType::String);
        assert_eq!(2, name.depth());
        assert_eq!(&cat, name.root());
        assert!(name.is_rooted_in(&mate));
        assert!(!cat.is_rooted_in(&mate));
        assert_eq!(Some("name"), name.name());
    }

    #[test]
    fn test_structural_equality() {
        let a = Path::entity("Cat", "cat").get("name", ValueType::String);
        let b = Path::entity("Cat", "cat").get("name", ValueType::String);
        let c = Path::entity("Cat", "kitten").get("name", ValueType::String);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_any_element_type() {
        let kittens = Path::entity("Cat", "cat").get(
            "kittens",
            ValueType::collection_of(ValueType::entity("Cat")),
        );
        assert_eq!(&ValueType::entity("Cat"), kittens.any().ty());
        assert_eq!(PathKind::CollectionAny, kittens.any().kind());
    }
}
