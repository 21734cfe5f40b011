//! Named connection pools.
//!
//! The registry is constructed explicitly and handed to whatever needs it:
//!
//! ```ignore
//! let registry = ConnectionRegistry::new();
//! registry.add_single_db(&ConnectionConfig::from_url(&url)?).await?;
//! registry.add_db("reporting", &reporting_config).await?;
//!
//! let session = registry.single_session().await?;
//! let rows = session.query(&builder).await?;
//! ```

use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::pool::create_pool;
use crate::session::Session;
use deadpool_postgres::Pool;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Name used by the single-database helpers.
pub const SINGLE_CONNECTION: &str = "DAL_UNIQUE";

/// Thread-safe map of connection name to pool.
///
/// Each name is configured at most once; later configurations for a name
/// already present are ignored and the existing pool is returned.
#[derive(Default)]
pub struct ConnectionRegistry {
    pools: Mutex<HashMap<String, Pool>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Pool>> {
        self.pools.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a pool for `name`, check that a connection can be opened, and
    /// register it.
    pub async fn add_db(&self, name: &str, config: &ConnectionConfig) -> OrmResult<Pool> {
        if let Some(existing) = self.get(name) {
            tracing::debug!(target: "pgdal.sql", name, "connection already registered");
            return Ok(existing);
        }

        let pool = create_pool(config)?;
        let client = pool.get().await?;
        drop(client);

        tracing::info!(
            target: "pgdal.sql",
            name,
            host = %config.host,
            database = %config.database,
            max_pool_size = config.max_pool_size,
            "registered connection pool"
        );
        Ok(self.register(name, pool))
    }

    /// [`add_db`](Self::add_db) under [`SINGLE_CONNECTION`].
    pub async fn add_single_db(&self, config: &ConnectionConfig) -> OrmResult<Pool> {
        self.add_db(SINGLE_CONNECTION, config).await
    }

    /// Register an existing pool. If `name` is taken the existing pool wins
    /// and is returned.
    pub fn register(&self, name: &str, pool: Pool) -> Pool {
        self.lock().entry(name.to_string()).or_insert(pool).clone()
    }

    pub fn get(&self, name: &str) -> Option<Pool> {
        self.lock().get(name).cloned()
    }

    pub fn single(&self) -> Option<Pool> {
        self.get(SINGLE_CONNECTION)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Session over a pooled connection of `name`.
    pub async fn session(&self, name: &str) -> OrmResult<Session<deadpool_postgres::Client>> {
        let pool = self
            .get(name)
            .ok_or_else(|| OrmError::Connection(format!("no connection registered as {name}")))?;
        Ok(Session::new(pool.get().await?))
    }

    pub async fn single_session(&self) -> OrmResult<Session<deadpool_postgres::Client>> {
        self.session(SINGLE_CONNECTION).await
    }
}
