//! Scalar values exchanged with the database.

use crate::error::{SqlError, SqlResult};
use serde::ser::{Serialize, Serializer};

/// A scalar parameter or column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

/// Explicit bind type for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Null,
    Bool,
    Int,
    Str,
    /// Large text/binary value, bound as bytes
    Lob,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Byte length as seen by a length-limited bind.
    pub(crate) fn byte_len(&self) -> usize {
        match self {
            Value::Text(s) => s.len(),
            Value::Bytes(b) => b.len(),
            Value::Json(j) => j.to_string().len(),
            _ => 0,
        }
    }

    /// Coerce into the representation implied by `ty`.
    ///
    /// NULL stays NULL for every type.
    pub fn coerce(self, ty: SqlType) -> SqlResult<Value> {
        let fail = |value: &Value| {
            SqlError::composition(format!("cannot bind {value:?} as {ty:?}"))
        };
        match (ty, self) {
            (SqlType::Null, _) | (_, Value::Null) => Ok(Value::Null),

            (SqlType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (SqlType::Bool, Value::Int(i)) => Ok(Value::Bool(i != 0)),
            (SqlType::Bool, Value::Text(s)) => match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" => Ok(Value::Bool(true)),
                "0" | "false" | "f" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(fail(&Value::Text(s))),
            },

            (SqlType::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (SqlType::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
            (SqlType::Int, Value::Float(f)) if f.fract() == 0.0 => Ok(Value::Int(f as i64)),
            (SqlType::Int, Value::Text(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => Err(fail(&Value::Text(s))),
            },

            (SqlType::Str, Value::Text(s)) => Ok(Value::Text(s)),
            (SqlType::Str, Value::Int(i)) => Ok(Value::Text(i.to_string())),
            (SqlType::Str, Value::Float(f)) => Ok(Value::Text(f.to_string())),
            (SqlType::Str, Value::Bool(b)) => Ok(Value::Text(if b { "1" } else { "0" }.to_string())),
            (SqlType::Str, Value::Json(j)) => Ok(Value::Text(j.to_string())),
            (SqlType::Str, Value::Bytes(b)) => String::from_utf8(b)
                .map(Value::Text)
                .map_err(|e| SqlError::composition(format!("cannot bind bytes as Str: {e}"))),

            (SqlType::Lob, Value::Bytes(b)) => Ok(Value::Bytes(b)),
            (SqlType::Lob, Value::Text(s)) => Ok(Value::Bytes(s.into_bytes())),
            (SqlType::Lob, Value::Json(j)) => Ok(Value::Bytes(j.to_string().into_bytes())),

            (_, other) => Err(fail(&other)),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
            Value::Json(j) => j.clone(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => b.serialize(serializer),
            Value::Json(j) => j.serialize(serializer),
        }
    }
}

// ─── Conversions ────────────────────────────────────────────────────────────

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<chrono::NaiveTime> for Value {
    fn from(v: chrono::NaiveTime) -> Self {
        Value::Text(v.format("%H:%M:%S%.f").to_string())
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::Text(v.to_rfc3339())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
