use crate::error::SqlResult;
use crate::params::BoundParam;
use crate::row::Row;

/// One live database session.
///
/// This is the seam between the execution engine and a concrete driver: the
/// engine only ever hands a session statement text and resolved parameters.
/// Each call prepares, binds and executes in one step; nothing is cached
/// across calls.
pub trait Session {
    /// Execute a statement and collect its rows.
    fn query(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Vec<Row>>;

    /// Execute a statement and read only its first row.
    ///
    /// Drivers should stop reading after that row. The default collects
    /// everything through [`query`](Session::query).
    fn query_one(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<u64>;

    fn begin(&mut self) -> SqlResult<()>;

    fn commit(&mut self) -> SqlResult<()>;

    fn rollback(&mut self) -> SqlResult<()>;

    /// Short driver identifier used in logs.
    fn driver_name(&self) -> &'static str;
}
