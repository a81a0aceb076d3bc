//! Convenient imports for typical `sqlchain` usage.
//!
//! ```rust
//! use sqlchain::prelude::*;
//! ```

pub use crate::builder::{
    DeleteBuilder, Direction, Filterable, IndexHinted, InsertBuilder, JoinKind, Limitable,
    LimitNotation, Mutation, Orderable, SelectBuilder, Separator, Statement, UnionBuilder,
    UpdateBuilder, delete, insert, select, union, update,
};
pub use crate::{
    Connection, ConnectionConfig, Params, Row, SqlError, SqlResult, SqlType, Value, params,
};
