use super::clause::{Limit, TERMINATOR, TableRef, WhereClause};
use super::traits::{Filterable, Limitable, Mutation, Statement};
use crate::error::SqlResult;

/// DELETE builder.
///
/// A DELETE without WHERE deletes every row; nothing here prevents that.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    table: TableRef,
    filter: WhereClause,
    limit: Limit,
}

impl DeleteBuilder {
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
        }
    }
}

impl Statement for DeleteBuilder {
    fn render(&self, terminate: bool) -> SqlResult<String> {
        let mut sql = String::from("DELETE FROM");
        self.table.render_into(&mut sql, true);
        self.filter.render_predicate_into(&mut sql);
        self.limit.render_into(&mut sql);
        if terminate {
            sql.push_str(TERMINATOR);
        }
        Ok(sql)
    }
}

impl Mutation for DeleteBuilder {}

impl Filterable for DeleteBuilder {
    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.filter
    }
}

impl Limitable for DeleteBuilder {
    fn limit_mut(&mut self) -> &mut Limit {
        &mut self.limit
    }
}
