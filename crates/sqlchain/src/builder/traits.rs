use super::clause::{Direction, Limit, LimitNotation, OrderBy, Separator, WhereClause};
use crate::connection::{Connection, FetchMode};
use crate::error::SqlResult;
use crate::params::Params;
use crate::row::Row;
use serde::de::DeserializeOwned;

/// Base trait for statement builders.
pub trait Statement {
    /// Render the statement text. `terminate` appends the trailing `;`.
    fn render(&self, terminate: bool) -> SqlResult<String>;

    /// Render a top-level statement (with terminator).
    fn to_sql(&self) -> SqlResult<String> {
        self.render(true)
    }

    /// Render and return at most one row.
    fn fetch_one(&self, conn: &mut Connection, params: &Params) -> SqlResult<Option<Row>> {
        let sql = self.to_sql()?;
        conn.execute(&sql, params, FetchMode::One)?.into_row()
    }

    /// Render and return all rows.
    fn fetch_all(&self, conn: &mut Connection, params: &Params) -> SqlResult<Vec<Row>> {
        let sql = self.to_sql()?;
        conn.execute(&sql, params, FetchMode::All)?.into_rows()
    }

    /// Render and hydrate at most one row into `T`.
    fn fetch_one_as<T: DeserializeOwned>(
        &self,
        conn: &mut Connection,
        params: &Params,
    ) -> SqlResult<Option<T>> {
        self.fetch_one(conn, params)?
            .map(|row| row.deserialize())
            .transpose()
    }

    /// Render and hydrate all rows into `T`.
    fn fetch_all_as<T: DeserializeOwned>(
        &self,
        conn: &mut Connection,
        params: &Params,
    ) -> SqlResult<Vec<T>> {
        self.fetch_all(conn, params)?
            .iter()
            .map(Row::deserialize)
            .collect()
    }
}

/// Trait for mutating statements (INSERT/UPDATE/DELETE).
pub trait Mutation: Statement {
    /// Render and run inside the connection's transaction policy.
    fn run(&self, conn: &mut Connection, params: &Params) -> SqlResult<bool> {
        let sql = self.to_sql()?;
        conn.execute(&sql, params, FetchMode::Run)?.into_done()
    }
}

/// Builders that carry a WHERE predicate (SELECT, UPDATE, DELETE).
pub trait Filterable {
    fn where_clause_mut(&mut self) -> &mut WhereClause;

    /// Append a predicate fragment with an explicit separator.
    fn push_where(&mut self, fragment: &str, separator: Separator) -> &mut Self {
        self.where_clause_mut().push(fragment, separator);
        self
    }

    /// Append a fragment without separator.
    fn where_raw(&mut self, fragment: &str) -> &mut Self {
        self.push_where(fragment, Separator::None)
    }

    fn and_where(&mut self, fragment: &str) -> &mut Self {
        self.push_where(fragment, Separator::And)
    }

    fn or_where(&mut self, fragment: &str) -> &mut Self {
        self.push_where(fragment, Separator::Or)
    }

}

/// Builders whose grammar has a `FORCE INDEX` slot (SELECT, UPDATE).
///
/// DELETE does not implement this, so a hint can never be silently dropped.
///
/// ```compile_fail
/// use sqlchain::prelude::*;
///
/// let mut qb = delete("sessions");
/// qb.force_index("idx_expires");
/// ```
pub trait IndexHinted: Filterable {
    /// Add a `FORCE INDEX` hint.
    fn force_index(&mut self, index: &str) -> &mut Self {
        self.where_clause_mut().force_index(index);
        self
    }

    fn force_indexes(&mut self, indexes: &[&str]) -> &mut Self {
        let clause = self.where_clause_mut();
        for index in indexes {
            clause.force_index(index);
        }
        self
    }
}

/// Builders that render a LIMIT clause (SELECT, UPDATE, DELETE).
pub trait Limitable {
    fn limit_mut(&mut self) -> &mut Limit;

    fn limit(&mut self, count: u64) -> &mut Self {
        self.limit_mut().push(count, None, LimitNotation::MySql);
        self
    }

    fn limit_offset(&mut self, count: u64, offset: u64, notation: LimitNotation) -> &mut Self {
        self.limit_mut().push(count, Some(offset), notation);
        self
    }
}

/// Builders that render an ORDER BY clause (SELECT, UNION).
pub trait Orderable {
    fn order_by_mut(&mut self) -> &mut OrderBy;

    fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        self.order_by_mut().push(column, direction);
        self
    }

    fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.order_by(column, Direction::Asc)
    }

    fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by(column, Direction::Desc)
    }
}
