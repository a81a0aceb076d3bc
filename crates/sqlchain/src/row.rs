//! Result rows and row hydration.

use crate::de::{RowDeserializer, ValueDeserializer};
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row: column names in select order, each mapped to a [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel column/value lists.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Look up a column by name. With duplicate names the first match wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Look up a column by name and decode it into `T`.
    pub fn try_get<T: DeserializeOwned>(&self, column: &str) -> SqlResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| SqlError::decode(column, "no such column"))?;
        T::deserialize(ValueDeserializer::new(value)).map_err(|e| e.into_sql_error(column))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Convert to a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(column, value)| (column.to_string(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    /// Hydrate the row into a structured shape, field by field from matching column names.
    ///
    /// Decode errors name the failing column, or `<row>` when the failure is
    /// not tied to one.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SqlResult<T> {
        T::deserialize(RowDeserializer::new(self)).map_err(|e| e.into_sql_error("<row>"))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
        email: Option<String>,
    }

    fn user_row() -> Row {
        Row::new(
            vec!["id".into(), "name".into(), "email".into()],
            vec![Value::Int(7), Value::from("alice"), Value::Null],
        )
    }

    #[test]
    fn hydrates_matching_columns() {
        let user: User = user_row().deserialize().unwrap();
        assert_eq!(
            user,
            User {
                id: 7,
                name: "alice".into(),
                email: None
            }
        );
    }

    #[test]
    fn missing_column_is_a_decode_error() {
        let row = Row::new(vec!["id".into()], vec![Value::Int(1)]);
        let err = row.deserialize::<User>().unwrap_err();
        assert!(matches!(err, SqlError::Decode { .. }));
    }

    #[test]
    fn try_get_reads_single_column() {
        let row = user_row();
        assert_eq!(row.try_get::<String>("name").unwrap(), "alice");
        assert_eq!(row.try_get::<Option<String>>("email").unwrap(), None);
        assert!(row.try_get::<i64>("missing").is_err());
    }

    #[test]
    fn serializes_as_object() {
        let json = serde_json::to_string(&user_row()).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"alice","email":null}"#);
    }
}
