use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    metadata::QueryMetadata,
    operator::Op,
    value::ValueType,
};

use super::{Expr, Operation};

/// A nested query rendered in place, sharing the outer statement's bindings.
///
/// Identity is the shared metadata allocation: two handles are equal when
/// they point at the same query, not when their contents happen to match.
#[derive(Debug, Clone)]
pub struct SubQuery {
    ty: ValueType,
    metadata: Arc<QueryMetadata>,
}

impl SubQuery {
    pub fn new(ty: ValueType, metadata: QueryMetadata) -> Self {
        Self {
            ty,
            metadata: Arc::new(metadata),
        }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn metadata(&self) -> &QueryMetadata {
        &self.metadata
    }

    pub fn exists(&self) -> Expr {
        Operation::of(ValueType::Bool, Op::Exists, vec![self.clone().into()]).into()
    }

    pub fn not_exists(&self) -> Expr {
        self.exists().not()
    }

    pub fn any(&self) -> Expr {
        Operation::of(self.ty.clone(), Op::Any, vec![self.clone().into()]).into()
    }

    pub fn all(&self) -> Expr {
        Operation::of(self.ty.clone(), Op::All, vec![self.clone().into()]).into()
    }
}

impl PartialEq for SubQuery {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.metadata, &other.metadata)
    }
}

impl Eq for SubQuery {}

impl Hash for SubQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.metadata).hash(state);
    }
}
