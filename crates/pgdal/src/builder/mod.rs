//! Statement builder.
//!
//! A [`Builder`] accumulates typed [`ClausePart`]s through one of the
//! statement sub-builders, renders them in canonical order on
//! [`build`](Builder::build), and resolves `?` / `:name` placeholders into
//! `$1, $2, ...` with the bound values in marker order.
//!
//! ```ignore
//! let mut b = Builder::new();
//! b.select(&["a", "b"]).from("t").where_("a = ?").set_parameter(0, "x").build()?;
//! assert_eq!(b.sql(), "SELECT a, b FROM t WHERE (a = $1)");
//! ```
//!
//! A builder is single-use: building it a second time fails.

pub mod delete;
pub mod insert;
pub mod part;
pub mod raw;
pub mod select;
pub mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use part::{ClausePart, ColumnValue, Conjunction, Direction, Join, JoinKind, PartKind};
pub use raw::RawBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::error::{OrmError, OrmResult};
use crate::param::{ParamKey, Params};
use crate::resolve::{Resolved, resolve};
use crate::value::Value;

/// Which statement a builder renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    /// Nothing started yet.
    #[default]
    Empty,
    Select,
    Insert,
    Update,
    Delete,
    Raw,
}

/// Statement options that are not clause parts.
#[derive(Debug, Clone, Copy, Default)]
struct Options {
    distinct: bool,
    /// 1-based index of the first row; 0 means unset.
    first_result: i64,
    /// 0 means no limit.
    max_results: i64,
    returning_id: bool,
}

/// Mutable, single-use statement builder.
#[derive(Debug, Default)]
pub struct Builder {
    kind: StatementKind,
    options: Options,
    parts: Vec<ClausePart>,
    params: Params,
    built: Option<Resolved>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a SELECT over `columns` (`*` when empty).
    pub fn select(&mut self, columns: &[&str]) -> SelectBuilder<'_> {
        self.start(StatementKind::Select);
        if !columns.is_empty() {
            self.add_part(ClausePart::Columns(to_strings(columns)));
        }
        SelectBuilder::new(self)
    }

    /// Start an INSERT into `table`.
    pub fn insert(&mut self, table: &str) -> InsertBuilder<'_> {
        self.start(StatementKind::Insert);
        self.add_part(ClausePart::Table(vec![table.to_string()]));
        InsertBuilder::new(self)
    }

    /// Start an UPDATE of `table`.
    pub fn update(&mut self, table: &str) -> UpdateBuilder<'_> {
        self.start(StatementKind::Update);
        self.add_part(ClausePart::Table(vec![table.to_string()]));
        UpdateBuilder::new(self)
    }

    /// Start a DELETE from `table`.
    pub fn delete(&mut self, table: &str) -> DeleteBuilder<'_> {
        self.start(StatementKind::Delete);
        self.add_part(ClausePart::Table(vec![table.to_string()]));
        DeleteBuilder::new(self)
    }

    /// Use `text` verbatim. Placeholders are still resolved.
    pub fn raw(&mut self, text: &str) -> RawBuilder<'_> {
        self.start(StatementKind::Raw);
        self.add_part(ClausePart::Raw(text.to_string()));
        RawBuilder::new(self)
    }

    /// Bind `value` to a zero-based position or a `:name`.
    ///
    /// The first value bound to a key wins.
    pub fn set_parameter(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> &mut Self {
        self.params.set(key, value);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn parts(&self) -> &[ClausePart] {
        &self.parts
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Render and resolve the statement. Fails when called a second time.
    pub fn build(&mut self) -> OrmResult<&Self> {
        if self.built.is_some() {
            return Err(OrmError::build_state("statement was already built"));
        }

        let raw = self.render()?;
        let resolved = resolve(&raw, &self.params).inspect_err(|e| {
            tracing::warn!(target: "pgdal.sql", kind = ?self.kind, sql = %raw, error = %e, "placeholder resolution failed");
        })?;

        tracing::debug!(
            target: "pgdal.sql",
            kind = ?self.kind,
            param_count = resolved.values.len(),
            sql = %resolved.sql,
            "statement built"
        );

        self.built = Some(resolved);
        Ok(self)
    }

    /// Final SQL; empty until built.
    pub fn sql(&self) -> &str {
        self.built.as_ref().map_or("", |r| r.sql.as_str())
    }

    /// Bound values in marker order; empty until built.
    pub fn values(&self) -> &[Value] {
        match &self.built {
            Some(r) => &r.values,
            None => &[],
        }
    }

    /// The built statement, or a build-state error if `build` was never called.
    pub fn statement(&self) -> OrmResult<&Resolved> {
        self.built
            .as_ref()
            .ok_or_else(|| OrmError::build_state("statement was not built"))
    }

    /// `SELECT COUNT(1)` over this builder's FROM / JOIN / WHERE / GROUP BY /
    /// HAVING parts, resolved against the same parameters.
    ///
    /// Independent of [`build`](Self::build) and callable before or after it.
    pub fn count_statement(&self) -> OrmResult<Resolved> {
        if self.kind != StatementKind::Select {
            return Err(OrmError::build_state(format!(
                "count requires a SELECT statement, found {:?}",
                self.kind
            )));
        }

        let mut sql = String::from("SELECT ");
        if self.options.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str("COUNT(1)");
        if let Some(tables) = self.render_part(PartKind::Table) {
            sql.push_str(" FROM ");
            sql.push_str(&tables);
        }
        self.push_parts(
            &mut sql,
            &[PartKind::Joins, PartKind::Where, PartKind::GroupBy, PartKind::Having],
        );

        resolve(&sql, &self.params)
    }

    // ==================== Internals ====================

    fn start(&mut self, kind: StatementKind) {
        self.kind = kind;
        self.options = Options::default();
        self.parts.clear();
    }

    /// Merge `part` into the existing part of its kind, or append it.
    pub(crate) fn add_part(&mut self, part: ClausePart) {
        match self.parts.iter_mut().find(|p| p.kind() == part.kind()) {
            Some(existing) => existing.merge(part),
            None => self.parts.push(part),
        }
    }

    pub(crate) fn part(&self, kind: PartKind) -> Option<&ClausePart> {
        self.parts.iter().find(|p| p.kind() == kind)
    }

    fn render_part(&self, kind: PartKind) -> Option<String> {
        self.part(kind).and_then(|p| p.render(self.kind))
    }

    fn push_parts(&self, sql: &mut String, kinds: &[PartKind]) {
        for kind in kinds {
            if let Some(rendered) = self.render_part(*kind) {
                sql.push(' ');
                sql.push_str(&rendered);
            }
        }
    }

    fn target_table(&self) -> OrmResult<String> {
        self.render_part(PartKind::Table)
            .ok_or_else(|| OrmError::validation(format!("{:?} requires a table", self.kind)))
    }

    /// Render the parts in canonical order for the current statement kind.
    fn render(&self) -> OrmResult<String> {
        match self.kind {
            StatementKind::Empty => Err(OrmError::build_state("no statement was started")),
            StatementKind::Select => {
                let mut sql = String::from("SELECT ");
                if self.options.distinct {
                    sql.push_str("DISTINCT ");
                }
                match self.render_part(PartKind::Columns) {
                    Some(cols) => sql.push_str(&cols),
                    None => sql.push('*'),
                }
                if let Some(tables) = self.render_part(PartKind::Table) {
                    sql.push_str(" FROM ");
                    sql.push_str(&tables);
                }
                self.push_parts(
                    &mut sql,
                    &[
                        PartKind::Joins,
                        PartKind::Where,
                        PartKind::GroupBy,
                        PartKind::Having,
                        PartKind::OrderBy,
                    ],
                );
                if self.options.max_results > 0 {
                    sql.push_str(&format!(" LIMIT {}", self.options.max_results));
                }
                if self.options.first_result > 0 {
                    sql.push_str(&format!(" OFFSET {}", self.options.first_result - 1));
                }
                Ok(sql)
            }
            StatementKind::Insert => {
                let table = self.target_table()?;
                let values = self
                    .render_part(PartKind::Assignments)
                    .ok_or_else(|| OrmError::validation("INSERT requires at least one column"))?;
                let mut sql = format!("INSERT INTO {table}{values}");
                if self.options.returning_id {
                    sql.push_str(" RETURNING id");
                }
                Ok(sql)
            }
            StatementKind::Update => {
                let table = self.target_table()?;
                let sets = self
                    .render_part(PartKind::Assignments)
                    .ok_or_else(|| OrmError::validation("UPDATE requires at least one SET column"))?;
                let mut sql = format!("UPDATE {table} SET {sets}");
                self.push_parts(&mut sql, &[PartKind::Where]);
                Ok(sql)
            }
            StatementKind::Delete => {
                let table = self.target_table()?;
                let mut sql = format!("DELETE FROM {table}");
                self.push_parts(&mut sql, &[PartKind::Where]);
                Ok(sql)
            }
            StatementKind::Raw => Ok(self.render_part(PartKind::Raw).unwrap_or_default()),
        }
    }
}

pub(crate) fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Number of `?` markers in the part of `kind`.
pub(crate) fn count_markers(builder: &Builder, kind: PartKind) -> usize {
    match builder.part(kind) {
        Some(ClausePart::Assignments(pairs)) => {
            pairs.iter().map(|p| p.expr.matches('?').count()).sum()
        }
        Some(ClausePart::Where(conditions)) => {
            conditions.iter().map(|(_, c)| c.matches('?').count()).sum()
        }
        _ => 0,
    }
}
