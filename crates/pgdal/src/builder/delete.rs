use super::{Builder, ClausePart, Conjunction};
use crate::error::OrmResult;
use crate::param::ParamKey;
use crate::value::Value;

/// DELETE statement builder, created by [`Builder::delete`].
///
/// No WHERE means every row of the table is deleted.
#[derive(Debug)]
pub struct DeleteBuilder<'a> {
    builder: &'a mut Builder,
}

impl<'a> DeleteBuilder<'a> {
    pub(super) fn new(builder: &'a mut Builder) -> Self {
        Self { builder }
    }

    pub fn where_(self, condition: &str) -> Self {
        self.condition(Conjunction::And, condition)
    }

    pub fn or_where(self, condition: &str) -> Self {
        self.condition(Conjunction::Or, condition)
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
