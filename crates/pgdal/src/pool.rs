//! Connection pool utilities

use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Create a connection pool without TLS.
///
/// Connections are opened lazily, so this does not touch the network.
///
/// ```ignore
/// let pool = pgdal::create_pool(&ConnectionConfig::from_url(&url)?)?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(config: &ConnectionConfig) -> OrmResult<Pool> {
    create_pool_with_tls(config, NoTls)
}

/// Create a connection pool using a custom TLS connector.
pub fn create_pool_with_tls<T>(config: &ConnectionConfig, tls: T) -> OrmResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(config.pg_config(), tls, manager_config);
    Pool::builder(mgr)
        .max_size(config.max_pool_size)
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}
