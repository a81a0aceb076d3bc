use super::clause::{TERMINATOR, TableRef};
use super::traits::{Mutation, Statement};
use crate::error::{SqlError, SqlResult};
use std::fmt::Display;

/// How an INSERT lists its data. Fixed by the first insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// `VALUES (..)` with no column list
    ValuesOnly,
    /// `(cols) VALUES (..)`
    ColumnValues,
}

/// INSERT builder.
///
/// Values are SQL fragments (literals or placeholders) and are emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    table: TableRef,
    mode: Option<InsertMode>,
    columns: Vec<String>,
    values: Vec<String>,
}

impl InsertBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: TableRef::new(table),
            mode: None,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append a value, with its column when `column` is given.
    ///
    /// The first call fixes the [`InsertMode`]; a later call that does not
    /// match it fails and leaves the builder unchanged.
    pub fn insert(&mut self, value: impl Display, column: Option<&str>) -> SqlResult<&mut Self> {
        let requested = match column {
            Some(_) => InsertMode::ColumnValues,
            None => InsertMode::ValuesOnly,
        };
        match self.mode {
            None => self.mode = Some(requested),
            Some(mode) if mode != requested => {
                return Err(SqlError::composition(format!(
                    "INSERT into '{}' mixes value-only and column-value inserts (fixed mode: {:?})",
                    self.table.name, mode
                )));
            }
            Some(_) => {}
        }

        if let Some(column) = column {
            self.columns.push(column.to_string());
        }
        self.values.push(value.to_string());
        Ok(self)
    }

    /// Column-value insert.
    pub fn set(&mut self, column: &str, value: impl Display) -> SqlResult<&mut Self> {
        self.insert(value, Some(column))
    }

    /// Values-only insert.
    pub fn value(&mut self, value: impl Display) -> SqlResult<&mut Self> {
        self.insert(value, None)
    }

    pub fn mode(&self) -> Option<InsertMode> {
        self.mode
    }

    pub fn has_data(&self) -> bool {
        !self.values.is_empty()
    }
}

impl Statement for InsertBuilder {
    fn render(&self, terminate: bool) -> SqlResult<String> {
        let Some(mode) = self.mode else {
            return Err(SqlError::composition(format!(
                "INSERT into '{}' has no values",
                self.table.name
            )));
        };

        let mut sql = String::from("INSERT INTO");
        self.table.render_into(&mut sql, false);

        match mode {
            InsertMode::ColumnValues => {
                if self.columns.len() != self.values.len() {
                    return Err(SqlError::composition(format!(
                        "INSERT into '{}' has {} columns but {} values",
                        self.table.name,
                        self.columns.len(),
                        self.values.len()
                    )));
                }
                sql.push_str(" (");
                sql.push_str(&self.columns.join(","));
                sql.push_str(") VALUES (");
            }
            InsertMode::ValuesOnly => sql.push_str(" VALUES ("),
        }
        sql.push_str(&self.values.join(","));
        sql.push(')');

        if terminate {
            sql.push_str(TERMINATOR);
        }
        Ok(sql)
    }
}

impl Mutation for InsertBuilder {}
