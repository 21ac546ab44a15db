use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;

/// A database value in the unified model shared by every backend.
///
/// Integers are width-tagged so that the engines can pick the narrowest
/// matching wire type; construction from native literals goes through the
/// `From` impls below. A `Bool(true)` round-trips through whichever native
/// boolean form the engine uses (`BIT`, `BOOLEAN`, `TINYINT(1)`, `INTEGER 1`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    /// Arbitrary-precision decimal; scale is preserved exactly.
    Decimal(BigDecimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    /// A UTC instant.
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The variant name, used in [`Error::TypeMismatch`] reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Widens any integer (or boolean) variant to `i64`.
    pub fn as_i64(&self) -> Result<i64, Error> {
        match self {
            Value::Bool(b) => Ok(*b as i64),
            Value::TinyInt(v) => Ok(*v as i64),
            Value::SmallInt(v) => Ok(*v as i64),
            Value::Int(v) => Ok(*v as i64),
            Value::BigInt(v) => Ok(*v),
            other => Err(Error::TypeMismatch {
                expected: "integer",
                got: other.type_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                expected: "text",
                got: other.type_name(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Value::Bool(b) => Ok(*b),
            // MySQL and SQLite hand booleans back as integers
            Value::TinyInt(v) => Ok(*v != 0),
            Value::BigInt(v) => Ok(*v != 0),
            other => Err(Error::TypeMismatch {
                expected: "bool",
                got: other.type_name(),
            }),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
