use super::{Builder, ClausePart, Conjunction, Direction, Join, JoinKind, to_strings};
use crate::error::OrmResult;
use crate::param::ParamKey;
use crate::resolve::Resolved;
use crate::value::Value;

/// SELECT statement builder.
///
/// Created by [`Builder::select`]. Every method adds to the underlying
/// builder's clause parts; the order of calls does not affect the order in
/// which clauses render.
#[derive(Debug)]
pub struct SelectBuilder<'a> {
    builder: &'a mut Builder,
}

impl<'a> SelectBuilder<'a> {
    pub(super) fn new(builder: &'a mut Builder) -> Self {
        Self { builder }
    }

    /// Render `SELECT DISTINCT`.
    pub fn distinct(self) -> Self {
        self.builder.options.distinct = true;
        self
    }

    /// Append columns to the select list.
    pub fn columns(self, columns: &[&str]) -> Self {
        self.builder
            .add_part(ClausePart::Columns(to_strings(columns)));
        self
    }

    /// Append a FROM entry (`"t"`, `"t alias"`, see [`as_alias`](crate::expr::as_alias)).
    pub fn from(self, table: &str) -> Self {
        self.builder
            .add_part(ClausePart::Table(vec![table.to_string()]));
        self
    }

    pub fn inner_join(self, join: Join) -> Self {
        self.join(JoinKind::Inner, join)
    }

    pub fn left_join(self, join: Join) -> Self {
        self.join(JoinKind::Left, join)
    }

    pub fn right_join(self, join: Join) -> Self {
        self.join(JoinKind::Right, join)
    }

    /// Add a condition joined with AND.
    pub fn where_(self, condition: &str) -> Self {
        self.condition(Conjunction::And, condition)
    }

    /// Add a condition joined with OR.
    pub fn or_where(self, condition: &str) -> Self {
        self.condition(Conjunction::Or, condition)
    }

    pub fn group_by(self, columns: &[&str]) -> Self {
        self.builder
            .add_part(ClausePart::GroupBy(to_strings(columns)));
        self
    }

    /// Set the HAVING condition, replacing any previous one.
    pub fn having(self, condition: &str) -> Self {
        self.builder
            .add_part(ClausePart::Having(condition.to_string()));
        self
    }

    pub fn order_asc(self, columns: &[&str]) -> Self {
        self.order(Direction::Asc, columns)
    }

    pub fn order_desc(self, columns: &[&str]) -> Self {
        self.order(Direction::Desc, columns)
    }

    /// 1-based index of the first row returned (`OFFSET n - 1`).
    pub fn first_result(self, first: i64) -> Self {
        self.builder.options.first_result = first;
        self
    }

    /// Maximum number of rows returned (`LIMIT n`); 0 disables the limit.
    pub fn max_results(self, max: i64) -> Self {
        self.builder.options.max_results = max;
        self
    }

    pub fn set_parameter(self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.builder.set_parameter(key, value);
        self
    }

    /// The matching `SELECT COUNT(1)` statement, without ORDER BY or paging.
    pub fn count_sql(&self) -> OrmResult<Resolved> {
        self.builder.count_statement()
    }

    pub fn build(self) -> OrmResult<&'a Builder> {
        let builder = self.builder;
        builder.build()
    }

    fn join(self, kind: JoinKind, join: Join) -> Self {
        self.builder.add_part(ClausePart::Joins(vec![(kind, join)]));
        self
    }

    fn condition(self, conjunction: Conjunction, condition: &str) -> Self {
        self.builder
            .add_part(ClausePart::Where(vec![(conjunction, condition.to_string())]));
        self
    }

    fn order(self, direction: Direction, columns: &[&str]) -> Self {
        self.builder
            .add_part(ClausePart::OrderBy(vec![(direction, to_strings(columns))]));
        self
    }
}
