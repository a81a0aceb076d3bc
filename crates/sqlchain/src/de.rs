//! `serde` deserializers reading straight from [`Row`] and [`Value`].
//!
//! A row is presented as a map of column name to value, so any
//! `#[derive(Deserialize)]` struct hydrates field by field. Values are lenient
//! where drivers differ: `Int(0 | 1)` reads as a bool (SQLite has no boolean
//! storage class) and numeric text reads as a number (PostgreSQL NUMERIC).

use crate::error::SqlError;
use crate::row::Row;
use crate::value::Value;
use serde::de::value::{BorrowedStrDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, Visitor};
use serde::forward_to_deserialize_any;
use std::fmt;

/// Deserialization failure, tagged with the column it happened on.
#[derive(Debug)]
pub(crate) struct DeError {
    column: Option<String>,
    message: String,
}

impl DeError {
    fn at(mut self, column: &str) -> Self {
        if self.column.is_none() {
            self.column = Some(column.to_string());
        }
        self
    }

    /// Convert into a [`SqlError::Decode`], naming `fallback` when no column is known.
    pub(crate) fn into_sql_error(self, fallback: &str) -> SqlError {
        let column = self.column.unwrap_or_else(|| fallback.to_string());
        SqlError::decode(column, self.message)
    }
}

impl fmt::Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{column}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DeError {}

impl de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            column: None,
            message: msg.to_string(),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Self {
            column: Some(field.to_string()),
            message: "no such column in result row".to_string(),
        }
    }
}

fn json_error(err: serde_json::Error) -> DeError {
    de::Error::custom(err)
}

// ─── Value ──────────────────────────────────────────────────────────────────

pub(crate) struct ValueDeserializer<'de> {
    value: &'de Value,
}

impl<'de> ValueDeserializer<'de> {
    pub(crate) fn new(value: &'de Value) -> Self {
        Self { value }
    }

    fn integer<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if let Value::Text(text) = self.value {
            let text = text.trim();
            if let Ok(i) = text.parse::<i64>() {
                return visitor.visit_i64(i);
            }
            if let Ok(u) = text.parse::<u64>() {
                return visitor.visit_u64(u);
            }
        }
        self.deserialize_any(visitor)
    }

    fn float<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if let Value::Text(text) = self.value {
            if let Ok(f) = text.trim().parse::<f64>() {
                return visitor.visit_f64(f);
            }
        }
        self.deserialize_any(visitor)
    }
}

macro_rules! integer_methods {
    ($($method:ident),*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
                self.integer(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ValueDeserializer<'de> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Int(i) => visitor.visit_i64(*i),
            Value::Float(f) => visitor.visit_f64(*f),
            Value::Text(s) => visitor.visit_borrowed_str(s),
            Value::Bytes(b) => visitor.visit_seq(SeqDeserializer::new(b.iter().copied())),
            Value::Json(j) => Deserializer::deserialize_any(j, visitor).map_err(json_error),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Int(i @ (0 | 1)) => visitor.visit_bool(*i == 1),
            _ => self.deserialize_any(visitor),
        }
    }

    integer_methods!(
        deserialize_i8,
        deserialize_i16,
        deserialize_i32,
        deserialize_i64,
        deserialize_i128,
        deserialize_u8,
        deserialize_u16,
        deserialize_u32,
        deserialize_u64,
        deserialize_u128
    );

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.float(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.float(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            Value::Json(j) => Deserializer::deserialize_option(j, visitor).map_err(json_error),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Bytes(b) => visitor.visit_borrowed_bytes(b),
            Value::Text(s) => visitor.visit_borrowed_bytes(s.as_bytes()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.value {
            Value::Text(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            Value::Json(j) => {
                Deserializer::deserialize_enum(j, name, variants, visitor).map_err(json_error)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        char str string unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

// ─── Row ────────────────────────────────────────────────────────────────────

pub(crate) struct RowDeserializer<'de> {
    row: &'de Row,
}

impl<'de> RowDeserializer<'de> {
    pub(crate) fn new(row: &'de Row) -> Self {
        Self { row }
    }
}

impl<'de> Deserializer<'de> for RowDeserializer<'de> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_map(RowAccess {
            row: self.row,
            next: 0,
            pending: None,
        })
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_some(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple tuple_struct
        map struct enum identifier ignored_any
    }
}

/// Walks the row's columns. A repeated column name is skipped, so the first
/// occurrence wins as in [`Row::get`].
struct RowAccess<'de> {
    row: &'de Row,
    next: usize,
    pending: Option<(&'de str, &'de Value)>,
}

impl<'de> MapAccess<'de> for RowAccess<'de> {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        let row = self.row;
        let columns = row.columns();
        while self.next < columns.len() {
            let index = self.next;
            self.next += 1;
            let column = columns[index].as_str();
            if columns[..index].iter().any(|c| c == column) {
                continue;
            }
            self.pending = Some((column, &row.values()[index]));
            return seed
                .deserialize(BorrowedStrDeserializer::new(column))
                .map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
        let (column, value) = self.pending.take().ok_or_else(|| DeError {
            column: None,
            message: "value requested before its column".to_string(),
        })?;
        seed.deserialize(ValueDeserializer::new(value))
            .map_err(|e| e.at(column))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.row.len().saturating_sub(self.next))
    }
}
