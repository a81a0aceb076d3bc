use super::clause::{OrderBy, TERMINATOR};
use super::select::SelectBuilder;
use super::traits::{Orderable, Statement};
use crate::error::SqlResult;

/// UNION of two SELECT statements.
///
/// Always top-level: the rendered text is terminated regardless of the
/// `terminate` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionBuilder {
    first: SelectBuilder,
    second: SelectBuilder,
    order: OrderBy,
}

impl UnionBuilder {
    pub fn new(first: SelectBuilder, second: SelectBuilder) -> Self {
        Self {
            first,
            second,
            order: OrderBy::default(),
        }
    }
}

impl Statement for UnionBuilder {
    fn render(&self, _terminate: bool) -> SqlResult<String> {
        let mut sql = format!(
            "({}) UNION ({})",
            self.first.render_embedded()?,
            self.second.render_embedded()?
        );
        self.order.render_into(&mut sql);
        sql.push_str(TERMINATOR);
        Ok(sql)
    }
}

impl Orderable for UnionBuilder {
    fn order_by_mut(&mut self) -> &mut OrderBy {
        &mut self.order
    }
}
