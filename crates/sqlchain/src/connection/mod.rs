//! Blocking execution engine.
//!
//! A [`Connection`] owns one database [`Session`] and runs statement text
//! against it with one of three [`FetchMode`]s. Mutating calls
//! ([`FetchMode::Run`]) are transactional:
//!
//! - in [`TxState::Auto`] every run is wrapped in its own transaction, which is
//!   committed on success and rolled back before the error is returned;
//! - after [`Connection::begin_transaction`] the connection is
//!   [`TxState::UserManaged`] and runs execute inside the caller's transaction
//!   until [`Connection::commit_transaction`] or
//!   [`Connection::rollback_transaction`].
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlchain::{Connection, ConnectionConfig, SqlResult, params};
//!
//! # fn demo() -> SqlResult<()> {
//! let mut conn = Connection::open(&ConnectionConfig::sqlite("app.db"))?;
//!
//! conn.begin_transaction()?;
//! conn.run("UPDATE accounts SET balance = balance - ?1 WHERE id = ?2", &params![100, 1])?;
//! conn.run("UPDATE accounts SET balance = balance + ?1 WHERE id = ?2", &params![100, 2])?;
//! conn.commit_transaction()?;
//! # Ok(()) }
//! ```

mod session;

pub use session::Session;

use crate::config::ConnectionConfig;
use crate::driver;
use crate::error::{SqlError, SqlResult};
use crate::params::Params;
use crate::row::Row;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Maximum SQL length (bytes) written to the log.
const LOG_SQL_MAX_BYTES: usize = 200;

/// How a statement's result is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// First row, if any. Read-only, no transaction wrapping.
    One,
    /// All rows. Read-only, no transaction wrapping.
    All,
    /// Mutating statement, transactional.
    Run,
}

/// Result of [`Connection::execute`], matching the requested [`FetchMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Row(Option<Row>),
    Rows(Vec<Row>),
    Done(bool),
}

impl Outcome {
    pub fn into_row(self) -> SqlResult<Option<Row>> {
        match self {
            Outcome::Row(row) => Ok(row),
            other => Err(other.mismatch("a single row")),
        }
    }

    pub fn into_rows(self) -> SqlResult<Vec<Row>> {
        match self {
            Outcome::Rows(rows) => Ok(rows),
            other => Err(other.mismatch("rows")),
        }
    }

    pub fn into_done(self) -> SqlResult<bool> {
        match self {
            Outcome::Done(done) => Ok(done),
            other => Err(other.mismatch("a run result")),
        }
    }

    fn mismatch(&self, expected: &str) -> SqlError {
        let got = match self {
            Outcome::Row(_) => "a single row",
            Outcome::Rows(_) => "rows",
            Outcome::Done(_) => "a run result",
        };
        SqlError::composition(format!("expected {expected}, got {got}"))
    }
}

/// Who owns the current transaction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    /// Each run gets its own engine-managed transaction.
    #[default]
    Auto,
    /// The caller opened a transaction that spans several calls.
    UserManaged,
}

/// A single database session plus its transaction state.
///
/// Not meant to be shared: use one connection per unit of work.
pub struct Connection {
    session: Option<Box<dyn Session>>,
    state: TxState,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver_name())
            .field("state", &self.state)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    /// Open a connection. Failures surface as [`SqlError::Connection`] and are not retried.
    pub fn open(config: &ConnectionConfig) -> SqlResult<Self> {
        let session = driver::connect(config)?;
        debug!(
            target: "sqlchain",
            driver = session.driver_name(),
            host = %config.host,
            "connection opened"
        );
        Ok(Self::with_session(session))
    }

    /// Wrap an already established session (custom drivers, tests).
    pub fn with_session(session: Box<dyn Session>) -> Self {
        Self {
            session: Some(session),
            state: TxState::Auto,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn in_transaction(&self) -> bool {
        self.state == TxState::UserManaged
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    pub fn driver_name(&self) -> Option<&'static str> {
        self.session.as_ref().map(|s| s.driver_name())
    }

    fn session(&mut self) -> SqlResult<&mut (dyn Session + 'static)> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(SqlError::connection("connection is closed")),
        }
    }

    // ==================== Execution ====================

    /// Bind `params` to `sql` and execute it with the given fetch mode.
    pub fn execute(&mut self, sql: &str, params: &Params, mode: FetchMode) -> SqlResult<Outcome> {
        let state = self.state;
        let session = self.session()?;
        let bound = params.resolve()?;

        debug!(
            target: "sqlchain.sql",
            driver = session.driver_name(),
            mode = ?mode,
            tx = ?state,
            param_count = bound.len(),
            sql = %truncate_sql(sql),
            "executing statement"
        );

        match mode {
            FetchMode::One => Ok(Outcome::Row(session.query_one(sql, &bound)?)),
            FetchMode::All => Ok(Outcome::Rows(session.query(sql, &bound)?)),
            FetchMode::Run if state == TxState::UserManaged => {
                session.execute(sql, &bound)?;
                Ok(Outcome::Done(true))
            }
            FetchMode::Run => {
                session.begin()?;
                if let Err(err) = session.execute(sql, &bound) {
                    warn!(target: "sqlchain", error = %err, "statement failed, rolling back");
                    return Err(match session.rollback() {
                        Ok(()) => err,
                        Err(rollback_err) => {
                            err.with_context(format!("rollback failed: {rollback_err}"))
                        }
                    });
                }
                if let Err(err) = session.commit() {
                    warn!(target: "sqlchain", error = %err, "commit failed, rolling back");
                    if let Err(rollback_err) = session.rollback() {
                        debug!(target: "sqlchain", error = %rollback_err, "rollback after failed commit");
                    }
                    return Err(err);
                }
                Ok(Outcome::Done(true))
            }
        }
    }

    /// Return the first row, if any.
    pub fn fetch_one(&mut self, sql: &str, params: &Params) -> SqlResult<Option<Row>> {
        self.execute(sql, params, FetchMode::One)?.into_row()
    }

    /// Return all rows.
    pub fn fetch_all(&mut self, sql: &str, params: &Params) -> SqlResult<Vec<Row>> {
        self.execute(sql, params, FetchMode::All)?.into_rows()
    }

    /// Return the first row hydrated into `T`.
    pub fn fetch_one_as<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &Params,
    ) -> SqlResult<Option<T>> {
        self.fetch_one(sql, params)?
            .map(|row| row.deserialize())
            .transpose()
    }

    /// Return all rows hydrated into `T`.
    pub fn fetch_all_as<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &Params,
    ) -> SqlResult<Vec<T>> {
        self.fetch_all(sql, params)?
            .iter()
            .map(Row::deserialize)
            .collect()
    }

    /// Run a mutating statement. Returns `true` on success.
    pub fn run(&mut self, sql: &str, params: &Params) -> SqlResult<bool> {
        self.execute(sql, params, FetchMode::Run)?.into_done()
    }

    // ==================== Transactions ====================

    /// Open a caller-managed transaction. Nesting is rejected.
    pub fn begin_transaction(&mut self) -> SqlResult<()> {
        if self.state == TxState::UserManaged {
            return Err(SqlError::composition(
                "a transaction is already open on this connection",
            ));
        }
        self.session()?.begin()?;
        self.state = TxState::UserManaged;
        debug!(target: "sqlchain", "transaction begun");
        Ok(())
    }

    /// Commit the caller-managed transaction. No-op when none is open.
    pub fn commit_transaction(&mut self) -> SqlResult<()> {
        let state = self.state;
        let session = self.session()?;
        if state != TxState::UserManaged {
            return Ok(());
        }
        session.commit()?;
        self.state = TxState::Auto;
        debug!(target: "sqlchain", "transaction committed");
        Ok(())
    }

    /// Roll back the caller-managed transaction. No-op when none is open.
    pub fn rollback_transaction(&mut self) -> SqlResult<()> {
        let state = self.state;
        let session = self.session()?;
        if state != TxState::UserManaged {
            return Ok(());
        }
        session.rollback()?;
        self.state = TxState::Auto;
        debug!(target: "sqlchain", "transaction rolled back");
        Ok(())
    }

    /// Run `f` inside a caller-managed transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`. A failed
    /// rollback is appended to the original error.
    pub fn transaction<T, F>(&mut self, f: F) -> SqlResult<T>
    where
        F: FnOnce(&mut Connection) -> SqlResult<T>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit_transaction()?;
                Ok(value)
            }
            Err(error) => match self.rollback_transaction() {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(error.with_context(format!(
                    "rollback failed: {rollback_err}"
                ))),
            },
        }
    }

    // ==================== Lifecycle ====================

    /// Release the session. Idempotent.
    ///
    /// An open caller-managed transaction is rolled back first.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if self.state == TxState::UserManaged {
            warn!(target: "sqlchain", "closing connection with an open transaction, rolling back");
            if let Err(err) = session.rollback() {
                warn!(target: "sqlchain", error = %err, "rollback on close failed");
            }
            self.state = TxState::Auto;
        }
        debug!(target: "sqlchain", driver = session.driver_name(), "connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn truncate_sql(sql: &str) -> &str {
    if sql.len() <= LOG_SQL_MAX_BYTES {
        return sql;
    }
    let mut end = LOG_SQL_MAX_BYTES;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests;
