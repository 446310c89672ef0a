use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use smol_str::SmolStr;

use crate::{
    error::{Error, Result},
    value::{Value, ValueType},
};

use super::Expr;

/// Builds a result object from the values of a projection row.
pub trait Factory: Send + Sync + fmt::Debug {
    /// Stable name, part of the owning expression's identity.
    fn name(&self) -> &str;

    fn new_instance(&self, args: Vec<Value>) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tuple;

impl Factory for Tuple {
    fn name(&self) -> &str {
        "tuple"
    }

    fn new_instance(&self, args: Vec<Value>) -> Result<Value> {
        Ok(Value::Tuple(args))
    }
}

pub struct FnFactory<F> {
    name: SmolStr,
    func: F,
}

impl<F> FnFactory<F>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync,
{
    pub fn new<T: Into<SmolStr>>(name: T, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").field("name", &self.name).finish()
    }
}

impl<F> Factory for FnFactory<F>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, args: Vec<Value>) -> Result<Value> {
        (self.func)(args)
    }
}

/// Coerces numeric row values to the declared type of their argument before
/// delegating. Numbers land in boolean slots as `value > 0`.
#[derive(Debug, Clone)]
pub struct NumberConversions {
    inner: Arc<dyn Factory>,
    types: Vec<ValueType>,
    name: SmolStr,
}

impl NumberConversions {
    pub fn new(inner: Arc<dyn Factory>, types: Vec<ValueType>) -> Self {
        let name = SmolStr::new(format!("number_conversions({})", inner.name()));
        Self { inner, types, name }
    }

    fn convert(value: Value, target: &ValueType) -> Value {
        let converted = match target {
            ValueType::Bool => value.numeric_to_bool(),
            target if target.is_numeric() && value.value_type() != *target => {
                value.cast_numeric(target)
            }
            _ => None,
        };
        converted.unwrap_or(value)
    }
}

impl Factory for NumberConversions {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_instance(&self, args: Vec<Value>) -> Result<Value> {
        let args = args
            .into_iter()
            .enumerate()
            .map(|(index, value)| match self.types.get(index) {
                Some(target) => Self::convert(value, target),
                None => value,
            })
            .collect();
        self.inner.new_instance(args)
    }
}

#[derive(Debug, Clone)]
pub struct FactoryExpr {
    ty: ValueType,
    args: Vec<Expr>,
    factory: Arc<dyn Factory>,
}

impl FactoryExpr {
    pub fn new(ty: ValueType, args: Vec<Expr>, factory: Arc<dyn Factory>) -> Self {
        Self { ty, args, factory }
    }

    pub fn tuple(args: Vec<Expr>) -> Self {
        Self::new(ValueType::Object, args, Arc::new(Tuple))
    }

    /// Same projection with numeric coercion toward each argument's type.
    pub fn with_number_conversions(self) -> Self {
        let types = self.args.iter().map(|arg| arg.ty().clone()).collect();
        let factory = Arc::new(NumberConversions::new(self.factory, types));
        Self {
            ty: self.ty,
            args: self.args,
            factory,
        }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn factory(&self) -> &Arc<dyn Factory> {
        &self.factory
    }

    pub fn new_instance(&self, values: Vec<Value>) -> Result<Value> {
        if values.len() != self.args.len() {
            return Err(Error::invalid(format!(
                "{} expects {} value(s), got {}",
                self.factory.name(),
                self.args.len(),
                values.len()
            )));
        }
        self.factory.new_instance(values)
    }
}

impl PartialEq for FactoryExpr {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.args == other.args
            && self.factory.name() == other.factory.name()
    }
}

impl Eq for FactoryExpr {}

impl Hash for FactoryExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        self.args.hash(state);
        self.factory.name().hash(state);
    }
}
