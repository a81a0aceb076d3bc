use crate::connection::Session;
use crate::error::{SqlError, SqlResult};
use crate::params::{BoundParam, ParamKey};
use crate::row::Row;
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Statement, ToSql};

/// SQLite session backed by a single `rusqlite` connection.
///
/// Placeholders may be positional (`?`, `?NNN`) or named (`:name`, `@name`,
/// `$name`).
#[derive(Debug)]
pub struct SqliteSession {
    conn: rusqlite::Connection,
}

impl SqliteSession {
    /// Open a database file, or an in-memory database for `:memory:`.
    pub fn open(path: &str) -> SqlResult<Self> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| SqlError::connection(format!("failed to open sqlite database '{path}': {e}")))?;
        Ok(Self { conn })
    }

    /// Wrap an existing `rusqlite` connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    fn prepare<'c>(&'c self, sql: &str, params: &[BoundParam]) -> SqlResult<Statement<'c>> {
        let mut stmt = self.conn.prepare(sql)?;
        for param in params {
            let index = placeholder_index(&stmt, &param.key)?;
            stmt.raw_bind_parameter(index, &param.value)?;
        }
        Ok(stmt)
    }
}

fn placeholder_index(stmt: &Statement<'_>, key: &ParamKey) -> SqlResult<usize> {
    match key {
        ParamKey::Position(position) => {
            if (1..=stmt.parameter_count()).contains(position) {
                Ok(*position)
            } else {
                Err(SqlError::execution(format!(
                    "statement has no placeholder at position {position}"
                )))
            }
        }
        ParamKey::Name(name) => {
            if let Some(index) = stmt.parameter_index(name)? {
                return Ok(index);
            }
            // Allow `id` for `:id`.
            if !name.starts_with([':', '@', '$']) {
                if let Some(index) = stmt.parameter_index(&format!(":{name}"))? {
                    return Ok(index);
                }
            }
            Err(SqlError::execution(format!(
                "statement has no placeholder named {name}"
            )))
        }
    }
}

fn decode_column(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => match std::str::from_utf8(t) {
            Ok(text) => Value::Text(text.to_owned()),
            // keep the stored bytes rather than replacing invalid sequences
            Err(_) => Value::Bytes(t.to_vec()),
        },
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn read_row(columns: &[String], row: &rusqlite::Row<'_>) -> SqlResult<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for index in 0..columns.len() {
        values.push(decode_column(row.get_ref(index)?));
    }
    Ok(Row::new(columns.to_vec(), values))
}

impl Session for SqliteSession {
    fn query(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Vec<Row>> {
        let mut stmt = self.prepare(sql, params)?;
        let columns = column_names(&stmt);

        let mut rows = stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_row(&columns, row)?);
        }
        Ok(out)
    }

    fn query_one(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Option<Row>> {
        let mut stmt = self.prepare(sql, params)?;
        let columns = column_names(&stmt);

        let mut rows = stmt.raw_query();
        match rows.next()? {
            Some(row) => read_row(&columns, row).map(Some),
            None => Ok(None),
        }
    }

    /// Steps the statement to completion, so statements that also return
    /// rows (`INSERT ... RETURNING`, some pragmas) are accepted.
    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<u64> {
        let mut stmt = self.prepare(sql, params)?;
        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
        Ok(self.conn.changes())
    }

    fn begin(&mut self) -> SqlResult<()> {
        Ok(self.conn.execute_batch("BEGIN")?)
    }

    fn commit(&mut self) -> SqlResult<()> {
        Ok(self.conn.execute_batch("COMMIT")?)
    }

    fn rollback(&mut self) -> SqlResult<()> {
        Ok(self.conn.execute_batch("ROLLBACK")?)
    }

    fn driver_name(&self) -> &'static str {
        "sqlite"
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sqlite;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sqlite::Null),
            Value::Bool(b) => ToSqlOutput::Owned(Sqlite::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(Sqlite::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(Sqlite::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Json(j) => ToSqlOutput::Owned(Sqlite::Text(j.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    fn session() -> SqliteSession {
        let mut session = SqliteSession::open(":memory:").unwrap();
        session
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, data BLOB)", &[])
            .unwrap();
        session
    }

    #[test]
    fn binds_named_and_positional() {
        let mut session = session();
        let mut params = Params::new();
        params.bind(1).bind_named(":name", "alice");
        let affected = session
            .execute("INSERT INTO t (id, name) VALUES (?1, :name)", &params.resolve().unwrap())
            .unwrap();
        assert_eq!(affected, 1);

        let rows = session.query("SELECT id, name, data FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get("name"), Some(&Value::from("alice")));
        assert_eq!(rows[0].get("data"), Some(&Value::Null));
    }

    #[test]
    fn bare_name_matches_colon_placeholder() {
        let mut session = session();
        let mut params = Params::new();
        params.bind_named("id", 5).bind_named("name", "bob");
        session
            .execute("INSERT INTO t (id, name) VALUES (:id, :name)", &params.resolve().unwrap())
            .unwrap();
        let rows = session.query("SELECT name FROM t WHERE id = 5", &[]).unwrap();
        assert_eq!(rows[0].get("name"), Some(&Value::from("bob")));
    }

    #[test]
    fn unknown_placeholder_is_an_execution_error() {
        let mut session = session();
        let mut params = Params::new();
        params.bind_named(":missing", 1);
        let err = session
            .query("SELECT * FROM t WHERE id = :id", &params.resolve().unwrap())
            .unwrap_err();
        assert!(err.is_execution());
    }

    #[test]
    fn blobs_round_trip() {
        let mut session = session();
        let mut params = Params::new();
        params.bind(vec![0_u8, 159, 146, 150]);
        session
            .execute("INSERT INTO t (id, data) VALUES (1, ?1)", &params.resolve().unwrap())
            .unwrap();
        let rows = session.query("SELECT data FROM t", &[]).unwrap();
        assert_eq!(rows[0].get("data"), Some(&Value::Bytes(vec![0, 159, 146, 150])));
    }

    #[test]
    fn execute_accepts_statements_returning_rows() {
        let mut session = session();
        let affected = session
            .execute("INSERT INTO t (name) VALUES ('a'), ('b') RETURNING id", &[])
            .unwrap();
        assert_eq!(affected, 2);
        assert_eq!(session.query("SELECT id FROM t", &[]).unwrap().len(), 2);
    }

    #[test]
    fn query_one_stops_at_first_row() {
        let mut session = session();
        session
            .execute("INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b')", &[])
            .unwrap();
        let row = session
            .query_one("SELECT name FROM t ORDER BY id DESC", &[])
            .unwrap();
        assert_eq!(row.unwrap().get("name"), Some(&Value::from("b")));
        assert!(session.query_one("SELECT name FROM t WHERE id = 9", &[]).unwrap().is_none());
    }

    #[test]
    fn invalid_utf8_text_is_returned_as_bytes() {
        let mut session = session();
        let rows = session
            .query("SELECT CAST(X'C328' AS TEXT) AS broken, 'ok' AS fine", &[])
            .unwrap();
        assert_eq!(rows[0].get("broken"), Some(&Value::Bytes(vec![0xC3, 0x28])));
        assert_eq!(rows[0].get("fine"), Some(&Value::from("ok")));
    }

    #[test]
    fn out_of_range_position_is_an_execution_error() {
        let mut session = session();
        let mut params = Params::new();
        params.push((usize::MAX, 1));
        let err = session
            .query("SELECT * FROM t WHERE id = ?1", &params.resolve().unwrap())
            .unwrap_err();
        assert!(err.is_execution());
    }

    #[test]
    fn rollback_discards_changes() {
        let mut session = session();
        session.begin().unwrap();
        session.execute("INSERT INTO t (id) VALUES (1)", &[]).unwrap();
        session.rollback().unwrap();
        assert!(session.query("SELECT id FROM t", &[]).unwrap().is_empty());
    }

    #[test]
    fn open_failure_is_a_connection_error() {
        let err = SqliteSession::open("/nonexistent/dir/app.db").unwrap_err();
        assert!(err.is_connection());
    }
}
