use super::{Builder, ClausePart, ColumnValue, PartKind, count_markers};
use crate::entity::{self, Entity};
use crate::error::OrmResult;
use crate::param::ParamKey;
use crate::value::Value;

/// INSERT statement builder, created by [`Builder::insert`].
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    builder: &'a mut Builder,
}

impl<'a> InsertBuilder<'a> {
    pub(super) fn new(builder: &'a mut Builder) -> Self {
        Self { builder }
    }

    /// Add a column with an explicit value expression (`"?::bit"`, `":name"`, `"now()"`).
    pub fn column(self, name: &str, expr: &str) -> Self {
        self.builder
            .add_part(ClausePart::Assignments(vec![ColumnValue::new(name, expr)]));
        self
    }

    /// Add columns, each bound to a `?`.
    pub fn columns(self, names: &[&str]) -> Self {
        let pairs = names.iter().map(|n| ColumnValue::new(n, "?")).collect();
        self.builder.add_part(ClausePart::Assignments(pairs));
        self
    }

    /// Add the writable fields of `entity` as columns and bind their values.
    ///
    /// Values take the positional indices following the `?` markers already
    /// in the column list.
    pub fn entity<T: Entity>(self, entity: &T) -> OrmResult<Self> {
        let values = entity::writable_values(entity)?;
        let mut index = count_markers(self.builder, PartKind::Assignments);
        for (column, value) in values {
            self.builder
                .add_part(ClausePart::Assignments(vec![ColumnValue::new(column, "?")]));
            self.builder.set_parameter(index, value);
            index += 1;
        }
        Ok(self)
    }

    /// Append `RETURNING id`.
    pub fn returning_id(self) -> Self {
        self.builder.options.returning_id = true;
        self
    }

    pub fn set_parameter(self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.builder.set_parameter(key, value);
        self
    }

    pub fn build(self) -> OrmResult<&'a Builder> {
        let builder = self.builder;
        builder.build()
    }
}
