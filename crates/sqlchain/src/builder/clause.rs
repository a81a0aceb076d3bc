//! Clause primitives shared by the statement builders.
//!
//! Each primitive holds one kind of clause fragment and knows how to render
//! itself. Builders compose the primitives they need; none of them parse or
//! validate the SQL text they are given.

use super::select::SelectBuilder;
use crate::error::SqlResult;

/// Statement terminator appended by `render(true)`.
pub(crate) const TERMINATOR: &str = ";";

/// The table a statement operates on, with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Render ` <name>[ AS <alias>]`.
    pub(crate) fn render_into(&self, sql: &mut String, with_alias: bool) {
        sql.push(' ');
        sql.push_str(&self.name);
        if with_alias {
            if let Some(alias) = &self.alias {
                sql.push_str(" AS ");
                sql.push_str(alias);
            }
        }
    }
}

// ==================== JOIN ====================

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// Plain `JOIN`
    #[default]
    Plain,
    Inner,
    Cross,
    Left,
    LeftOuter,
    Right,
    RightOuter,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Plain => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
        }
    }
}

/// What a join pulls in: a raw table expression or an embedded SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    /// Emitted verbatim.
    Raw(String),
    /// Parenthesized and rendered without terminator.
    Subquery(Box<SelectBuilder>),
}

impl From<&str> for JoinTarget {
    fn from(value: &str) -> Self {
        JoinTarget::Raw(value.to_string())
    }
}

impl From<String> for JoinTarget {
    fn from(value: String) -> Self {
        JoinTarget::Raw(value)
    }
}

impl From<SelectBuilder> for JoinTarget {
    fn from(value: SelectBuilder) -> Self {
        JoinTarget::Subquery(Box::new(value))
    }
}

/// A single join fragment, owned by the builder that added it.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub condition: Option<String>,
    pub alias: Option<String>,
}

impl Join {
    pub fn new(target: impl Into<JoinTarget>, kind: JoinKind) -> Self {
        Self {
            kind,
            target: target.into(),
            condition: None,
            alias: None,
        }
    }

    pub fn on(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Render ` <KIND> <target>[ AS alias][ ON (<condition>)]`.
    pub fn render(&self) -> SqlResult<String> {
        let mut sql = String::from(" ");
        sql.push_str(self.kind.keyword());
        sql.push(' ');
        match &self.target {
            JoinTarget::Raw(raw) => sql.push_str(raw),
            JoinTarget::Subquery(select) => {
                sql.push('(');
                sql.push_str(&select.render_embedded()?);
                sql.push(')');
            }
        }
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        if let Some(condition) = &self.condition {
            sql.push_str(" ON (");
            sql.push_str(condition);
            sql.push(')');
        }
        Ok(sql)
    }
}

// ==================== WHERE ====================

/// Connector placed between an existing predicate and a new fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// Concatenate directly.
    #[default]
    None,
    And,
    Or,
}

impl Separator {
    fn as_str(self) -> &'static str {
        match self {
            Separator::None => "",
            Separator::And => " AND ",
            Separator::Or => " OR ",
        }
    }
}

/// Index hints and the accumulated WHERE predicate of a where-capable builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    index_hints: Vec<String>,
    predicate: Option<String>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate fragment.
    ///
    /// The separator is only written when a predicate already exists; the first
    /// fragment never gets one.
    pub fn push(&mut self, fragment: &str, separator: Separator) {
        match &mut self.predicate {
            Some(predicate) => {
                predicate.push_str(separator.as_str());
                predicate.push_str(fragment);
            }
            None => self.predicate = Some(fragment.to_string()),
        }
    }

    pub fn force_index(&mut self, index: &str) {
        self.index_hints.push(index.to_string());
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn predicate(&self) -> Option<&str> {
        self.predicate.as_deref()
    }

    pub fn index_hints(&self) -> &[String] {
        &self.index_hints
    }

    /// Render ` FORCE INDEX(...)`.
    pub(crate) fn render_hints_into(&self, sql: &mut String) {
        if !self.index_hints.is_empty() {
            sql.push_str(" FORCE INDEX(");
            sql.push_str(&self.index_hints.join(","));
            sql.push(')');
        }
    }

    /// Render ` WHERE <predicate>`.
    pub(crate) fn render_predicate_into(&self, sql: &mut String) {
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
    }
}

// ==================== ORDER BY ====================

/// Sort direction of an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// No keyword; the database default applies.
    #[default]
    Default,
    Asc,
    Desc,
}

/// Ordered list of `(column, direction)` terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy {
    terms: Vec<(String, Direction)>,
}

impl OrderBy {
    pub fn push(&mut self, column: &str, direction: Direction) {
        self.terms.push((column.to_string(), direction));
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(String, Direction)] {
        &self.terms
    }

    /// Render ` ORDER BY a,b DESC,c ASC`.
    pub(crate) fn render_into(&self, sql: &mut String) {
        if self.terms.is_empty() {
            return;
        }
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|(column, direction)| match direction {
                Direction::Default => column.clone(),
                Direction::Asc => format!("{column} ASC"),
                Direction::Desc => format!("{column} DESC"),
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(","));
    }
}

// ==================== LIMIT ====================

/// Where the offset goes in a LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitNotation {
    /// `LIMIT <offset>, <count>`
    #[default]
    MySql,
    /// `LIMIT <count> OFFSET <offset>`
    PostgreSql,
}

/// Accumulated LIMIT text.
///
/// Absent until the first call to [`Limit::push`]. Further calls append more
/// tokens instead of replacing the existing ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Limit {
    buffer: Option<String>,
}

impl Limit {
    pub fn push(&mut self, count: u64, offset: Option<u64>, notation: LimitNotation) {
        let buffer = self.buffer.get_or_insert_with(String::new);
        if let (Some(offset), LimitNotation::MySql) = (offset, notation) {
            buffer.push_str(&format!(" {offset},"));
        }
        buffer.push_str(&format!(" {count}"));
        if let (Some(offset), LimitNotation::PostgreSql) = (offset, notation) {
            buffer.push_str(&format!(" OFFSET {offset}"));
        }
    }

    pub fn is_set(&self) -> bool {
        self.buffer.is_some()
    }

    /// Render ` LIMIT <tokens>`.
    pub(crate) fn render_into(&self, sql: &mut String) {
        if let Some(buffer) = &self.buffer {
            sql.push_str(" LIMIT");
            sql.push_str(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_limit(limit: &Limit) -> String {
        let mut sql = String::new();
        limit.render_into(&mut sql);
        sql
    }

    #[test]
    fn where_first_fragment_ignores_separator() {
        let mut w = WhereClause::new();
        w.push("a = 1", Separator::Or);
        w.push("b = 2", Separator::And);
        w.push("(c = 3 OR d = 4)", Separator::Or);
        assert_eq!(w.predicate(), Some("a = 1 AND b = 2 OR (c = 3 OR d = 4)"));
    }

    #[test]
    fn where_none_separator_concatenates() {
        let mut w = WhereClause::new();
        w.push("a = 1", Separator::None);
        w.push(" AND b = 2", Separator::None);
        assert_eq!(w.predicate(), Some("a = 1 AND b = 2"));
    }

    #[test]
    fn limit_mysql_puts_offset_first() {
        let mut limit = Limit::default();
        limit.push(10, Some(20), LimitNotation::MySql);
        assert_eq!(render_limit(&limit), " LIMIT 20, 10");
    }

    #[test]
    fn limit_postgres_puts_offset_last() {
        let mut limit = Limit::default();
        limit.push(10, Some(20), LimitNotation::PostgreSql);
        assert_eq!(render_limit(&limit), " LIMIT 10 OFFSET 20");
    }

    #[test]
    fn limit_second_call_appends() {
        let mut limit = Limit::default();
        assert!(!limit.is_set());
        limit.push(10, None, LimitNotation::MySql);
        limit.push(5, None, LimitNotation::PostgreSql);
        assert_eq!(render_limit(&limit), " LIMIT 10 5");
    }

    #[test]
    fn join_renders_alias_then_condition() {
        let join = Join::new("roles", JoinKind::LeftOuter)
            .alias("r")
            .on("u.role_id = r.id");
        assert_eq!(
            join.render().unwrap(),
            " LEFT OUTER JOIN roles AS r ON (u.role_id = r.id)"
        );
    }
}
