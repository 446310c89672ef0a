use smol_str::SmolStr;

use crate::value::{Value, ValueType};

/// A literal value; two constants are the same binding when type and value match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    ty: ValueType,
    value: Value,
}

impl Constant {
    pub fn new(value: Value) -> Self {
        Self {
            ty: value.value_type(),
            value,
        }
    }

    /// Constant with an explicit static type, e.g. a `Null` standing for a string.
    pub fn typed(ty: ValueType, value: Value) -> Self {
        Self { ty, value }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// A named placeholder whose value is supplied when the statement is executed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    ty: ValueType,
    name: SmolStr,
}

impl Param {
    pub fn new<T: Into<SmolStr>>(ty: ValueType, name: T) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
