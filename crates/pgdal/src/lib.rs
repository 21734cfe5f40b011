//! # pgdal
//!
//! A small Postgres data-access layer: a clause-based SQL statement builder,
//! `?` / `:name` placeholder resolution, and row decoding into maps, arrays,
//! tuples or tagged structs.
//!
//! ## Building statements
//!
//! ```ignore
//! use pgdal::prelude::*;
//!
//! let mut b = Builder::new();
//! b.select(&["id", "name"])
//!     .from("users")
//!     .where_("status = :status")
//!     .or_where("id = ?")
//!     .order_desc(&["created_at"])
//!     .max_results(20)
//!     .set_parameter("status", "active")
//!     .set_parameter(0, 7)
//!     .build()?;
//!
//! assert_eq!(
//!     b.sql(),
//!     "SELECT id, name FROM users WHERE ((status = $1) OR (id = $2)) ORDER BY created_at DESC LIMIT 20"
//! );
//! ```
//!
//! ## Mapping structs
//!
//! ```ignore
//! #[derive(Entity, Default)]
//! struct User {
//!     #[dal("id, autoincrement")]
//!     id: i64,
//!     name: String,
//!     #[dal("settings, jsonb")]
//!     settings: Option<Settings>,
//! }
//!
//! let mut insert = Builder::new();
//! insert.insert("users").entity(&user)?.returning_id().build()?;
//!
//! let session = Session::new(&client);
//! let (id,): (i64,) = session.scan(&insert).await?;
//! ```
//!
//! ## Executing
//!
//! [`Session`] runs built statements over any [`GenericClient`]: a
//! `tokio_postgres::Client`, a transaction, or a pooled connection. Named
//! pools live in a [`ConnectionRegistry`].

pub mod builder;
pub mod client;
pub mod config;
pub mod decode;
pub mod entity;
pub mod error;
pub mod expr;
pub mod param;
pub mod prelude;
pub mod resolve;
pub mod session;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub mod registry;

pub use builder::{
    Builder, DeleteBuilder, InsertBuilder, Join, JoinKind, RawBuilder, SelectBuilder,
    StatementKind, UpdateBuilder,
};
pub use client::GenericClient;
pub use config::{ConnectionConfig, SslMode};
pub use decode::{Cursor, FromValues, MemoryCursor, RowMap, RowsCursor};
pub use entity::{Entity, FieldDescriptor, FieldFlags};
pub use error::{OrmError, OrmResult};
pub use param::{ParamKey, Params};
pub use resolve::{Resolved, resolve};
pub use session::Session;
pub use value::{ConversionError, FromValue, ToValue, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_tls};

#[cfg(feature = "pool")]
pub use registry::{ConnectionRegistry, SINGLE_CONNECTION};

#[cfg(feature = "derive")]
pub use pgdal_derive::Entity;
