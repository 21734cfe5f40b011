use super::Builder;
use crate::error::OrmResult;
use crate::param::ParamKey;
use crate::value::Value;

/// Builder for caller-written SQL, created by [`Builder::raw`].
///
/// The text is used as is; `?` and `:name` placeholders are still resolved.
#[derive(Debug)]
pub struct RawBuilder<'a> {
    builder: &'a mut Builder,
}

impl<'a> RawBuilder<'a> {
    pub(super) fn new(builder: &'a mut Builder) -> Self {
        Self { builder }
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
