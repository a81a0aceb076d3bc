use super::clause::{Join, JoinKind, JoinTarget, Limit, OrderBy, TERMINATOR, TableRef, WhereClause};
use super::traits::{Filterable, IndexHinted, Limitable, Orderable, Statement};
use crate::error::{SqlError, SqlResult};

/// SELECT statement builder.
///
/// Clauses may be added in any order; rendering always emits
/// `SELECT .. FROM .. [AS] [JOIN ..] [FORCE INDEX] [WHERE] [GROUP BY] [HAVING] [ORDER BY] [LIMIT]`.
///
/// ```rust
/// use sqlchain::prelude::*;
///
/// let mut qb = SelectBuilder::new("users");
/// qb.select("id").select("name").where_raw("age > 18").limit(10);
/// assert_eq!(qb.to_sql().unwrap(), "SELECT id,name FROM users WHERE age > 18 LIMIT 10;");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SelectBuilder {
    table: TableRef,
    joins: Vec<Join>,
    filter: WhereClause,
    /// Select expressions, alias already applied
    columns: Vec<String>,
    group_by: Vec<String>,
    having: Vec<String>,
    order: OrderBy,
    limit: Limit,
}

impl SelectBuilder {
    pub fn new(table: &str) -> Self {
        Self::from_table(TableRef::new(table))
    }

    /// Select from `table AS alias`.
    pub fn aliased(table: &str, alias: &str) -> Self {
        Self::from_table(TableRef::aliased(table, alias))
    }

    fn from_table(table: TableRef) -> Self {
        Self {
            table,
            joins: Vec::new(),
            filter: WhereClause::new(),
            columns: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order: OrderBy::default(),
            limit: Limit::default(),
        }
    }

    /// Append one select expression.
    pub fn select(&mut self, expr: &str) -> &mut Self {
        self.columns.push(expr.to_string());
        self
    }

    /// Append one select expression rendered as `expr AS alias`.
    pub fn select_as(&mut self, expr: &str, alias: &str) -> &mut Self {
        self.columns.push(format!("{expr} AS {alias}"));
        self
    }

    /// Append multiple select expressions.
    pub fn select_cols(&mut self, exprs: &[&str]) -> &mut Self {
        self.columns.extend(exprs.iter().map(|s| s.to_string()));
        self
    }

    // ==================== Joins ====================

    /// Add a join fragment.
    pub fn join(
        &mut self,
        target: impl Into<JoinTarget>,
        kind: JoinKind,
        condition: Option<&str>,
        alias: Option<&str>,
    ) -> &mut Self {
        let mut join = Join::new(target, kind);
        join.condition = condition.map(str::to_string);
        join.alias = alias.map(str::to_string);
        self.joins.push(join);
        self
    }

    /// Add a prepared join fragment.
    pub fn push_join(&mut self, join: Join) -> &mut Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join(table, JoinKind::Inner, Some(on), None)
    }

    pub fn left_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join(table, JoinKind::Left, Some(on), None)
    }

    pub fn right_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join(table, JoinKind::Right, Some(on), None)
    }

    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.join(table, JoinKind::Cross, None, None)
    }

    /// Join an embedded SELECT as `(<subquery>) AS alias ON (<condition>)`.
    pub fn join_subquery(
        &mut self,
        subquery: SelectBuilder,
        kind: JoinKind,
        alias: &str,
        on: &str,
    ) -> &mut Self {
        self.join(subquery, kind, Some(on), Some(alias))
    }

    // ==================== Grouping ====================

    pub fn group_by(&mut self, column: &str) -> &mut Self {
        self.group_by.push(column.to_string());
        self
    }

    /// Add a HAVING predicate; multiple predicates are joined with AND.
    pub fn having(&mut self, predicate: &str) -> &mut Self {
        self.having.push(predicate.to_string());
        self
    }

    // ==================== SQL build ====================

    /// Render without terminator, as used for JOIN and UNION embedding.
    pub(crate) fn render_embedded(&self) -> SqlResult<String> {
        self.render(false)
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }
}

impl Statement for SelectBuilder {
    fn render(&self, terminate: bool) -> SqlResult<String> {
        if self.columns.is_empty() {
            return Err(SqlError::composition(format!(
                "SELECT on '{}' has no select expressions",
                self.table.name
            )));
        }

        let mut sql = String::from("SELECT ");
        sql.push_str(&self.columns.join(","));
        sql.push_str(" FROM");
        self.table.render_into(&mut sql, true);

        for join in &self.joins {
            sql.push_str(&join.render()?);
        }

        self.filter.render_hints_into(&mut sql);
        self.filter.render_predicate_into(&mut sql);

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(","));
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.having.join(" AND "));
        }

        self.order.render_into(&mut sql);
        self.limit.render_into(&mut sql);

        if terminate {
            sql.push_str(TERMINATOR);
        }
        Ok(sql)
    }
}

impl Filterable for SelectBuilder {
    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.filter
    }
}

impl IndexHinted for SelectBuilder {}

impl Limitable for SelectBuilder {
    fn limit_mut(&mut self) -> &mut Limit {
        &mut self.limit
    }
}

impl Orderable for SelectBuilder {
    fn order_by_mut(&mut self) -> &mut OrderBy {
        &mut self.order
    }
}
