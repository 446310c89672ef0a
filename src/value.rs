use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Date,
    Time,
    DateTime,
    Uuid,
    Json,
    Entity(SmolStr),
    Enum(SmolStr),
    Collection(Box<ValueType>),
    Map(Box<ValueType>, Box<ValueType>),
    Type,
    Object,
}

impl ValueType {
    pub fn entity<T: Into<SmolStr>>(name: T) -> Self {
        Self::Entity(name.into())
    }

    pub fn collection_of(inner: ValueType) -> Self {
        Self::Collection(Box::new(inner))
    }

    pub fn map_of(key: ValueType, value: ValueType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Width rank used by numeric coercion, `None` for non numeric types.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            ValueType::I8 => Some(0),
            ValueType::I16 => Some(1),
            ValueType::I32 => Some(2),
            ValueType::I64 => Some(3),
            ValueType::F32 => Some(4),
            ValueType::F64 => Some(5),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, ValueType::Entity(_))
    }

    pub fn is_collection_like(&self) -> bool {
        matches!(self, ValueType::Collection(_) | ValueType::Map(_, _))
    }

    /// Lower cased short name, as used by casts and type comparisons.
    pub fn simple_name(&self) -> SmolStr {
        match self {
            ValueType::Bool => SmolStr::new_static("boolean"),
            ValueType::I8 => SmolStr::new_static("byte"),
            ValueType::I16 => SmolStr::new_static("short"),
            ValueType::I32 => SmolStr::new_static("integer"),
            ValueType::I64 => SmolStr::new_static("long"),
            ValueType::F32 => SmolStr::new_static("float"),
            ValueType::F64 => SmolStr::new_static("double"),
            ValueType::String => SmolStr::new_static("string"),
            ValueType::Date => SmolStr::new_static("date"),
            ValueType::Time => SmolStr::new_static("time"),
            ValueType::DateTime => SmolStr::new_static("timestamp"),
            ValueType::Uuid => SmolStr::new_static("uuid"),
            ValueType::Json => SmolStr::new_static("json"),
            ValueType::Entity(name) | ValueType::Enum(name) => SmolStr::new(short_type_name(name)),
            ValueType::Collection(_) => SmolStr::new_static("collection"),
            ValueType::Map(_, _) => SmolStr::new_static("map"),
            ValueType::Type => SmolStr::new_static("class"),
            ValueType::Object => SmolStr::new_static("object"),
        }
    }
}

/// Strip a module or package qualifier from a type name.
pub fn short_type_name(name: &str) -> &str {
    let after_path = name.rsplit("::").next().unwrap_or(name);
    after_path.rsplit('.').next().unwrap_or(after_path)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityValue {
    pub ty: SmolStr,
    pub fields: Vec<(SmolStr, Value)>,
}

impl EntityValue {
    pub fn new<T: Into<SmolStr>>(ty: T) -> Self {
        Self {
            ty: ty.into(),
            fields: Vec::new(),
        }
    }

    pub fn field<K: Into<SmolStr>, V: IntoValue>(mut self, name: K, value: V) -> Self {
        self.fields.push((name.into(), value.into_value()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(SmolStr),
    #[cfg(feature = "chrono")]
    Date(chrono::NaiveDate),
    #[cfg(feature = "chrono")]
    Time(chrono::NaiveTime),
    #[cfg(feature = "chrono")]
    DateTime(chrono::NaiveDateTime),
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    #[cfg(feature = "json")]
    Json(serde_json::Value),
    Enum {
        ty: SmolStr,
        name: SmolStr,
        ordinal: u32,
    },
    Entity(Arc<EntityValue>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Type(ValueType),
}

impl Value {
    pub fn string<T: Into<SmolStr>>(value: T) -> Self {
        Self::String(value.into())
    }

    pub fn enumeration<T: Into<SmolStr>, N: Into<SmolStr>>(ty: T, name: N, ordinal: u32) -> Self {
        Self::Enum {
            ty: ty.into(),
            name: name.into(),
            ordinal,
        }
    }

    pub fn entity(entity: EntityValue) -> Self {
        Self::Entity(Arc::new(entity))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Object,
            Value::Bool(_) => ValueType::Bool,
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::String(_) => ValueType::String,
            #[cfg(feature = "chrono")]
            Value::Date(_) => ValueType::Date,
            #[cfg(feature = "chrono")]
            Value::Time(_) => ValueType::Time,
            #[cfg(feature = "chrono")]
            Value::DateTime(_) => ValueType::DateTime,
            #[cfg(feature = "uuid")]
            Value::Uuid(_) => ValueType::Uuid,
            #[cfg(feature = "json")]
            Value::Json(_) => ValueType::Json,
            Value::Enum { ty, .. } => ValueType::Enum(ty.clone()),
            Value::Entity(entity) => ValueType::Entity(entity.ty.clone()),
            Value::List(items) => ValueType::collection_of(
                items
                    .first()
                    .map(Value::value_type)
                    .unwrap_or(ValueType::Object),
            ),
            Value::Tuple(_) => ValueType::Object,
            Value::Type(_) => ValueType::Type,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Convert a numeric value to the given numeric type.
    ///
    /// Integer narrowing saturates, float to integer truncates toward zero.
    /// Returns `None` when either side is not numeric.
    pub fn cast_numeric(&self, target: &ValueType) -> Option<Value> {
        target.numeric_rank()?;
        let float = self.as_f64()?;
        let int = self.as_i64();
        let value = match target {
            ValueType::I8 => Value::I8(int.map_or(float as i8, |v| v.clamp(i8::MIN as i64, i8::MAX as i64) as i8)),
            ValueType::I16 => Value::I16(int.map_or(float as i16, |v| v.clamp(i16::MIN as i64, i16::MAX as i64) as i16)),
            ValueType::I32 => Value::I32(int.map_or(float as i32, |v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)),
            ValueType::I64 => Value::I64(int.unwrap_or(float as i64)),
            ValueType::F32 => Value::F32(float as f32),
            ValueType::F64 => Value::F64(float),
            _ => return None,
        };
        Some(value)
    }

    /// Coerce a numeric value to a boolean, positive numbers being `true`.
    pub fn numeric_to_bool(&self) -> Option<Value> {
        self.as_f64().map(|v| Value::Bool(v > 0.0))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            #[cfg(feature = "chrono")]
            (Value::Date(a), Value::Date(b)) => a == b,
            #[cfg(feature = "chrono")]
            (Value::Time(a), Value::Time(b)) => a == b,
            #[cfg(feature = "chrono")]
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            #[cfg(feature = "uuid")]
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            #[cfg(feature = "json")]
            (Value::Json(a), Value::Json(b)) => a == b,
            (
                Value::Enum { ty, name, ordinal },
                Value::Enum {
                    ty: other_ty,
                    name: other_name,
                    ordinal: other_ordinal,
                },
            ) => ty == other_ty && name == other_name && ordinal == other_ordinal,
            (Value::Entity(a), Value::Entity(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::F32(v) => v.to_bits().hash(state),
            Value::F64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            #[cfg(feature = "chrono")]
            Value::Date(v) => v.hash(state),
            #[cfg(feature = "chrono")]
            Value::Time(v) => v.hash(state),
            #[cfg(feature = "chrono")]
            Value::DateTime(v) => v.hash(state),
            #[cfg(feature = "uuid")]
            Value::Uuid(v) => v.hash(state),
            // serde_json values have no Hash, their canonical text does
            #[cfg(feature = "json")]
            Value::Json(v) => v.to_string().hash(state),
            Value::Enum { ty, name, ordinal } => {
                ty.hash(state);
                name.hash(state);
                ordinal.hash(state);
            }
            Value::Entity(v) => v.hash(state),
            Value::List(v) | Value::Tuple(v) => v.hash(state),
            Value::Type(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            #[cfg(feature = "chrono")]
            Value::Date(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Value::Time(v) => write!(f, "{v}"),
            #[cfg(feature = "chrono")]
            Value::DateTime(v) => write!(f, "{v}"),
            #[cfg(feature = "uuid")]
            Value::Uuid(v) => write!(f, "{v}"),
            #[cfg(feature = "json")]
            Value::Json(v) => write!(f, "{v}"),
            Value::Enum { name, .. } => f.write_str(name),
            Value::Entity(entity) => write!(f, "{}", entity.ty),
            Value::List(items) | Value::Tuple(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Type(ty) => f.write_str(&ty.simple_name()),
        }
    }
}

pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

macro_rules! into_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

into_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    ValueType => Type,
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(SmolStr::new(self))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(SmolStr::new(self))
    }
}

impl IntoValue for SmolStr {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for EntityValue {
    fn into_value(self) -> Value {
        Value::entity(self)
    }
}

impl<T> IntoValue for Option<T>
where
    T: IntoValue,
{
    fn into_value(self) -> Value {
        if let Some(value) = self {
            value.into_value()
        } else {
            Value::Null
        }
    }
}

impl<T> IntoValue for Vec<T>
where
    T: IntoValue,
{
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T, const N: usize> IntoValue for [T; N]
where
    T: IntoValue,
{
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

#[cfg(feature = "chrono")]
into_value! {
    chrono::NaiveDate => Date,
    chrono::NaiveTime => Time,
    chrono::NaiveDateTime => DateTime,
}

#[cfg(feature = "uuid")]
into_value! {
    uuid::Uuid => Uuid,
}

#[cfg(feature = "json")]
into_value! {
    serde_json::Value => Json,
}

#[cfg(feature = "json")]
impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::I8(v) => Json::from(*v),
            Value::I16(v) => Json::from(*v),
            Value::I32(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::F32(v) => Json::from(*v),
            Value::F64(v) => Json::from(*v),
            Value::String(v) => Json::String(v.to_string()),
            #[cfg(feature = "chrono")]
            Value::Date(v) => Json::String(v.to_string()),
            #[cfg(feature = "chrono")]
            Value::Time(v) => Json::String(v.to_string()),
            #[cfg(feature = "chrono")]
            Value::DateTime(v) => Json::String(v.to_string()),
            #[cfg(feature = "uuid")]
            Value::Uuid(v) => Json::String(v.to_string()),
            Value::Json(v) => v.clone(),
            Value::Enum { name, .. } => Json::String(name.to_string()),
            Value::Entity(entity) => Json::Object(
                entity
                    .fields
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_json()))
                    .collect(),
            ),
            Value::List(items) | Value::Tuple(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Type(ty) => Json::String(ty.simple_name().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_float_identity() {
        let mut set = HashSet::new();
        set.insert(Value::F64(1.0));
        set.insert(Value::F64(1.0));
        set.insert(Value::F32(1.0));
        assert_eq!(2, set.len());
    }

    #[test]
    fn test_cast_widens_and_narrows() {
        assert_eq!(Some(Value::F64(1.0)), Value::I8(1).cast_numeric(&ValueType::F64));
        assert_eq!(Some(Value::I32(2)), Value::F64(2.9).cast_numeric(&ValueType::I32));
        assert_eq!(Some(Value::I8(127)), Value::I64(1000).cast_numeric(&ValueType::I8));
        assert_eq!(None, Value::string("1").cast_numeric(&ValueType::I32));
        assert_eq!(None, Value::I32(1).cast_numeric(&ValueType::String));
    }

    #[test]
    fn test_simple_names() {
        assert_eq!("integer", ValueType::I32.simple_name());
        assert_eq!("Cat", ValueType::entity("domain::Cat").simple_name());
        assert_eq!("Cat", ValueType::entity("com.example.Cat").simple_name());
    }

    #[test]
    fn test_list_type() {
        let value = vec![1, 2].into_value();
        assert_eq!(ValueType::collection_of(ValueType::I32), value.value_type());
        assert_eq!("1, 2", value.to_string());
    }
}
