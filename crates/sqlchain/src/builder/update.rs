use super::clause::{Limit, TERMINATOR, TableRef, WhereClause};
use super::traits::{Filterable, IndexHinted, Limitable, Mutation, Statement};
use crate::error::{SqlError, SqlResult};
use std::fmt::Display;

/// UPDATE builder.
///
/// Assignments are paired by call order: the i-th column gets the i-th value.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table: TableRef,
    filter: WhereClause,
    limit: Limit,
    columns: Vec<String>,
    values: Vec<String>,
}

impl UpdateBuilder {
    pub fn new(table: &str) -> Self {
        Self::from_table(TableRef::new(table))
    }

    pub fn aliased(table: &str, alias: &str) -> Self {
        Self::from_table(TableRef::aliased(table, alias))
    }

    fn from_table(table: TableRef) -> Self {
        Self {
            table,
            filter: WhereClause::new(),
            limit: Limit::default(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append one `column=value` assignment.
    pub fn update(&mut self, value: impl Display, column: &str) -> &mut Self {
        self.columns.push(column.to_string());
        self.values.push(value.to_string());
        self
    }

    /// Same as [`UpdateBuilder::update`] with column first.
    pub fn set(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.update(value, column)
    }

    pub fn has_data(&self) -> bool {
        !self.values.is_empty()
    }

    fn assignments(&self) -> SqlResult<String> {
        if self.columns.len() != self.values.len() {
            return Err(SqlError::composition(format!(
                "UPDATE on '{}' has {} columns but {} values",
                self.table.name,
                self.columns.len(),
                self.values.len()
            )));
        }
        if self.columns.is_empty() {
            return Err(SqlError::composition(format!(
                "UPDATE on '{}' has no assignments",
                self.table.name
            )));
        }
        Ok(self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| format!("{column}={value}"))
            .collect::<Vec<_>>()
            .join(","))
    }
}

impl Statement for UpdateBuilder {
    fn render(&self, terminate: bool) -> SqlResult<String> {
        let assignments = self.assignments()?;

        let mut sql = String::from("UPDATE");
        self.table.render_into(&mut sql, true);
        sql.push_str(" SET ");
        sql.push_str(&assignments);

        self.filter.render_hints_into(&mut sql);
        self.filter.render_predicate_into(&mut sql);
        self.limit.render_into(&mut sql);

        if terminate {
            sql.push_str(TERMINATOR);
        }
        Ok(sql)
    }
}

impl Mutation for UpdateBuilder {}

impl Filterable for UpdateBuilder {
    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.filter
    }
}

impl IndexHinted for UpdateBuilder {}

impl Limitable for UpdateBuilder {
    fn limit_mut(&mut self) -> &mut Limit {
        &mut self.limit
    }
}
