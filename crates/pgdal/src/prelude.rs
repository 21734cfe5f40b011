//! Convenient imports for typical `pgdal` usage.
//!
//! ```ignore
//! use pgdal::prelude::*;
//! ```

pub use crate::expr::{and, as_alias, eq, gt, gte, lt, lte, neq, or};
pub use crate::{
    Builder, ConnectionConfig, Entity, GenericClient, Join, OrmError, OrmResult, RowMap, Session,
    Value,
};

#[cfg(feature = "pool")]
pub use crate::{ConnectionRegistry, create_pool};
