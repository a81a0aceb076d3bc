//! Statement builders.
//!
//! Builders accumulate clause fragments through `&mut self` methods and render
//! them into a single statement with a fixed clause order per statement kind.
//!
//! ## Design
//!
//! - SQL stays explicit: fragments are plain strings, emitted verbatim.
//! - Clause logic lives in small primitives ([`clause`]) that each builder
//!   composes; shared behavior is exposed through the [`Filterable`],
//!   [`IndexHinted`], [`Limitable`] and [`Orderable`] traits.
//! - Rendering is pure. Missing required clauses fail with
//!   [`SqlError::Composition`](crate::SqlError::Composition).

pub mod clause;
pub mod delete;
pub mod insert;
pub mod select;
pub mod traits;
pub mod union;
pub mod update;

pub use clause::{
    Direction, Join, JoinKind, JoinTarget, Limit, LimitNotation, OrderBy, Separator, TableRef,
    WhereClause,
};
pub use delete::DeleteBuilder;
pub use insert::{InsertBuilder, InsertMode};
pub use select::SelectBuilder;
pub use traits::{Filterable, IndexHinted, Limitable, Mutation, Orderable, Statement};
pub use union::UnionBuilder;
pub use update::UpdateBuilder;

/// Start a SELECT on `table`.
pub fn select(table: &str) -> SelectBuilder {
    SelectBuilder::new(table)
}

/// Start an INSERT into `table`.
pub fn insert(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Start an UPDATE on `table`.
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Start a DELETE from `table`.
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}

/// Combine two SELECTs with UNION.
pub fn union(first: SelectBuilder, second: SelectBuilder) -> UnionBuilder {
    UnionBuilder::new(first, second)
}
