//! # sqlchain
//!
//! Composable SQL statement builders with a blocking, transaction-aware
//! execution engine for PostgreSQL and SQLite.
//!
//! ## Features
//!
//! - **SQL explicit**: builders assemble caller-supplied fragments verbatim, in a fixed clause order
//! - **Chainable**: every clause method takes `&mut self` and returns `&mut Self`
//! - **Parameters stay separate**: statement text and [`Params`] are handed to the driver together
//! - **Transactional writes**: each run is atomic on its own, or part of a caller-managed transaction
//! - **Row hydration**: rows deserialize into any `serde` shape
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlchain::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! # fn demo() -> SqlResult<()> {
//! let mut conn = Connection::open(&ConnectionConfig::sqlite("app.db"))?;
//!
//! let mut qb = select("users");
//! qb.select_cols(&["id", "name"])
//!     .where_raw("status = :status")
//!     .order_by_desc("id")
//!     .limit(10);
//!
//! let mut params = Params::new();
//! params.bind_named(":status", "active");
//! let users: Vec<User> = qb.fetch_all_as(&mut conn, &params)?;
//!
//! let mut qb = update("users");
//! qb.set("status", "'inactive'").where_raw("id = ?1");
//! qb.run(&mut conn, &params![users[0].id])?;
//! # Ok(()) }
//! ```
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`] under the `sqlchain` target
//! (connection lifecycle, transactions) and `sqlchain.sql` (statement text,
//! truncated). Install any subscriber to see them.

pub mod builder;
pub mod config;
pub mod connection;
mod de;
pub mod driver;
pub mod error;
pub mod params;
pub mod prelude;
pub mod row;
pub mod value;

pub use builder::{
    DeleteBuilder, Direction, Filterable, IndexHinted, InsertBuilder, InsertMode, Join, JoinKind,
    JoinTarget, Limitable, LimitNotation, Mutation, Orderable, SelectBuilder, Separator, Statement,
    UnionBuilder, UpdateBuilder, delete, insert, select, union, update,
};
pub use config::{ConnectionConfig, Driver};
pub use connection::{Connection, FetchMode, Outcome, Session, TxState};
pub use error::{SqlError, SqlResult};
pub use params::{BoundParam, Param, ParamKey, Params};
pub use row::Row;
pub use value::{SqlType, Value};
