use super::{Builder, ClausePart, ColumnValue, Conjunction, PartKind, count_markers};
use crate::entity::{self, Entity};
use crate::error::OrmResult;
use crate::param::ParamKey;
use crate::value::Value;

/// UPDATE statement builder, created by [`Builder::update`].
#[derive(Debug)]
pub struct UpdateBuilder<'a> {
    builder: &'a mut Builder,
}

impl<'a> UpdateBuilder<'a> {
    pub(super) fn new(builder: &'a mut Builder) -> Self {
        Self { builder }
    }

    /// `name = expr`.
    pub fn set(self, name: &str, expr: &str) -> Self {
        self.builder
            .add_part(ClausePart::Assignments(vec![ColumnValue::new(name, expr)]));
        self
    }

    /// `name = ?` for each name.
    pub fn sets(self, names: &[&str]) -> Self {
        let pairs = names.iter().map(|n| ColumnValue::new(n, "?")).collect();
        self.builder.add_part(ClausePart::Assignments(pairs));
        self
    }

    pub fn where_(self, condition: &str) -> Self {
        self.condition(Conjunction::And, condition)
    }

    pub fn or_where(self, condition: &str) -> Self {
        self.condition(Conjunction::Or, condition)
    }

    /// Add the writable fields of `entity` to the SET list.
    ///
    /// The `id` column is never assigned. Values take the positional indices
    /// following the `?` markers already in the SET list, so positional
    /// parameters of WHERE conditions must be numbered after them.
    pub fn entity<T: Entity>(self, entity: &T) -> OrmResult<Self> {
        let values = entity::writable_values(entity)?;
        let mut index = count_markers(self.builder, PartKind::Assignments);
        for (column, value) in values.into_iter().filter(|(c, _)| *c != "id") {
            self.builder
                .add_part(ClausePart::Assignments(vec![ColumnValue::new(column, "?")]));
            self.builder.set_parameter(index, value);
            index += 1;
        }
        Ok(self)
    }

    /// Like [`entity`](Self::entity), then restrict the update to the
    /// entity's row with an `id = ?` condition bound to its id.
    pub fn entity_by_id<T: Entity>(self, entity: &T) -> OrmResult<Self> {
        let id = entity::id_value(entity)?;
        let this = self.entity(entity)?;
        let index = count_markers(this.builder, PartKind::Assignments)
            + count_markers(this.builder, PartKind::Where);
        this.builder.set_parameter(index, id);
        Ok(this.where_("id = ?"))
    }

    pub fn set_parameter(self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.builder.set_parameter(key, value);
        self
    }

    pub fn build(self) -> OrmResult<&'a Builder> {
        let builder = self.builder;
        builder.build()
    }

    fn condition(self, conjunction: Conjunction, condition: &str) -> Self {
        self.builder
            .add_part(ClausePart::Where(vec![(conjunction, condition.to_string())]));
        self
    }
}
