//! Parameter collections bound at execution time.
//!
//! A [`Params`] collection is the second half of the `(statement text,
//! parameters)` pair handed to [`Connection::execute`](crate::Connection::execute).
//! Entries are either positional (1-based) or keyed by placeholder name, and
//! may carry an explicit [`SqlType`], a maximum length and opaque driver
//! options.
//!
//! # Example
//!
//! ```rust
//! use sqlchain::{Params, SqlType};
//!
//! let mut params = Params::new();
//! params
//!     .bind(42)
//!     .bind_named(":name", "bob")
//!     .push((":avatar", vec![0_u8, 1, 2], SqlType::Lob, 1024));
//! assert_eq!(params.len(), 3);
//! ```

use crate::error::{SqlError, SqlResult};
use crate::value::{SqlType, Value};
use std::collections::BTreeMap;

/// How a parameter is matched to its placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// 1-based position
    Position(usize),
    /// Placeholder name, including its sigil (e.g. `:id`)
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(value: usize) -> Self {
        ParamKey::Position(value)
    }
}

impl From<&str> for ParamKey {
    fn from(value: &str) -> Self {
        ParamKey::Name(value.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(value: String) -> Self {
        ParamKey::Name(value)
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKey::Position(p) => write!(f, "#{p}"),
            ParamKey::Name(n) => f.write_str(n),
        }
    }
}

/// A single parameter entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub key: ParamKey,
    pub value: Value,
    pub sql_type: Option<SqlType>,
    /// Maximum byte length for Str/Lob values
    pub length: Option<usize>,
    /// Opaque driver options
    pub options: BTreeMap<String, String>,
}

impl Param {
    pub fn new(key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            sql_type: None,
            length: None,
            options: BTreeMap::new(),
        }
    }

    pub fn sql_type(mut self, ty: SqlType) -> Self {
        self.sql_type = Some(ty);
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Apply the declared type and length, producing the value sent to the driver.
    pub fn resolve(&self) -> SqlResult<BoundParam> {
        let value = match self.sql_type {
            Some(ty) => self.value.clone().coerce(ty)?,
            None => self.value.clone(),
        };
        if let Some(max) = self.length {
            let len = value.byte_len();
            if len > max {
                return Err(SqlError::composition(format!(
                    "parameter {} is {} bytes, declared length is {}",
                    self.key, len, max
                )));
            }
        }
        Ok(BoundParam {
            key: self.key.clone(),
            value,
            options: self.options.clone(),
        })
    }
}

impl<K: Into<ParamKey>, V: Into<Value>> From<(K, V)> for Param {
    fn from((key, value): (K, V)) -> Self {
        Param::new(key, value)
    }
}

impl<K: Into<ParamKey>, V: Into<Value>> From<(K, V, SqlType)> for Param {
    fn from((key, value, ty): (K, V, SqlType)) -> Self {
        Param::new(key, value).sql_type(ty)
    }
}

impl<K: Into<ParamKey>, V: Into<Value>> From<(K, V, SqlType, usize)> for Param {
    fn from((key, value, ty, length): (K, V, SqlType, usize)) -> Self {
        Param::new(key, value).sql_type(ty).length(length)
    }
}

impl<K: Into<ParamKey>, V: Into<Value>> From<(K, V, SqlType, usize, BTreeMap<String, String>)>
    for Param
{
    fn from(
        (key, value, ty, length, options): (K, V, SqlType, usize, BTreeMap<String, String>),
    ) -> Self {
        let mut param = Param::new(key, value).sql_type(ty).length(length);
        param.options = options;
        param
    }
}

/// A parameter after type coercion, as handed to a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub key: ParamKey,
    pub value: Value,
    pub options: BTreeMap<String, String>,
}

/// Ordered parameter collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<Param>,
    next_position: usize,
    /// Set when `bind` ran past `usize::MAX`; reported by `resolve`.
    overflowed: bool,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the next positional parameter.
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        match self.next_position.checked_add(1) {
            Some(next) => {
                self.next_position = next;
                self.entries.push(Param::new(ParamKey::Position(next), value));
            }
            None => self.overflowed = true,
        }
        self
    }

    /// Bind a named parameter (`:name`).
    pub fn bind_named(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.entries.push(Param::new(name, value));
        self
    }

    /// Bind with an explicit type.
    pub fn bind_typed(
        &mut self,
        key: impl Into<ParamKey>,
        value: impl Into<Value>,
        ty: SqlType,
    ) -> &mut Self {
        self.push(Param::new(key, value).sql_type(ty))
    }

    /// Bind with an explicit type and maximum byte length.
    pub fn bind_with_length(
        &mut self,
        key: impl Into<ParamKey>,
        value: impl Into<Value>,
        ty: SqlType,
        length: usize,
    ) -> &mut Self {
        self.push(Param::new(key, value).sql_type(ty).length(length))
    }

    /// Add a prepared entry, e.g. one of the tuple forms
    /// `(key, value)`, `(key, value, type)`, `(key, value, type, length)`,
    /// `(key, value, type, length, options)`.
    pub fn push(&mut self, param: impl Into<Param>) -> &mut Self {
        let param = param.into();
        if let ParamKey::Position(p) = param.key {
            self.next_position = self.next_position.max(p);
        }
        self.entries.push(param);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.entries.iter()
    }

    /// Resolve every entry, failing on the first bad coercion or length.
    pub fn resolve(&self) -> SqlResult<Vec<BoundParam>> {
        if self.overflowed {
            return Err(SqlError::composition(
                "positional parameter follows position usize::MAX",
            ));
        }
        self.entries.iter().map(Param::resolve).collect()
    }
}

impl<P: Into<Param>> FromIterator<P> for Params {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut params = Params::new();
        for param in iter {
            params.push(param);
        }
        params
    }
}

/// Build a positional [`Params`] collection.
///
/// ```rust
/// let params = sqlchain::params![1, "bob", None::<i64>];
/// assert_eq!(params.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::Params::new() };
    ($($value:expr),+ $(,)?) => {{
        let mut __params = $crate::Params::new();
        $( __params.bind($value); )+
        __params
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_keys_count_from_one() {
        let mut params = Params::new();
        params.bind(1).bind_named(":n", "x").bind(2);
        let keys: Vec<_> = params.iter().map(|p| p.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                ParamKey::Position(1),
                ParamKey::Name(":n".into()),
                ParamKey::Position(2)
            ]
        );
    }

    #[test]
    fn explicit_position_advances_counter() {
        let mut params = Params::new();
        params.push((3_usize, "c")).bind("d");
        assert_eq!(params.iter().last().unwrap().key, ParamKey::Position(4));
    }

    #[test]
    fn bind_after_max_position_fails_on_resolve() {
        let mut params = Params::new();
        params.push((usize::MAX, 1)).bind(2);
        assert_eq!(params.len(), 1);
        assert!(params.resolve().unwrap_err().is_composition());
    }

    #[test]
    fn length_limit_is_enforced_on_resolve() {
        let mut params = Params::new();
        params.push((":body", "too long", SqlType::Str, 3));
        let err = params.resolve().unwrap_err();
        assert!(err.is_composition());
    }

    #[test]
    fn bind_with_length_accepts_exact_fit() {
        let mut params = Params::new();
        params.bind_with_length(1_usize, "abc", SqlType::Str, 3);
        assert_eq!(params.resolve().unwrap()[0].value, Value::from("abc"));
    }

    #[test]
    fn options_pass_through() {
        let mut options = BTreeMap::new();
        options.insert("encoding".to_string(), "utf8".to_string());
        let mut params = Params::new();
        params.push((":doc", "{}", SqlType::Lob, 64, options.clone()));
        let bound = params.resolve().unwrap();
        assert_eq!(bound[0].options, options);
        assert_eq!(bound[0].value, Value::Bytes(b"{}".to_vec()));
    }
}
