//! Connection pooling for the Redis call store.

use std::sync::atomic::{AtomicUsize, Ordering};

use config::TrackingStorageConfig;
use deadpool::managed::{self, Metrics};
use redis::{Client, RedisError, RedisResult, aio::MultiplexedConnection};

/// Redis connection pool.
pub(super) type Pool = deadpool::managed::Pool<Manager>;

/// Manager for Redis connections.
#[derive(Debug)]
pub(super) struct Manager {
    client: Client,
    ping_number: AtomicUsize,
}

impl Manager {
    fn new(config: &TrackingStorageConfig) -> RedisResult<Self> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self {
            client,
            ping_number: AtomicUsize::new(0),
        })
    }
}

impl managed::Manager for Manager {
    type Type = MultiplexedConnection;
    type Error = RedisError;

    async fn create(&self) -> Result<MultiplexedConnection, Self::Error> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    async fn recycle(&self, conn: &mut MultiplexedConnection, _: &Metrics) -> managed::RecycleResult<Self::Error> {
        let ping_number = self.ping_number.fetch_add(1, Ordering::Relaxed).to_string();

        // UNWATCH first so a connection returned mid-transaction comes back clean.
        let (n,) = redis::Pipeline::with_capacity(2)
            .cmd("UNWATCH")
            .ignore()
            .cmd("PING")
            .arg(&ping_number)
            .query_async::<(String,)>(conn)
            .await?;

        if n == ping_number {
            Ok(())
        } else {
            Err(managed::RecycleError::message("Invalid PING response"))
        }
    }
}

/// Create a Redis connection pool from configuration.
pub(super) fn create_pool(config: &TrackingStorageConfig) -> RedisResult<Pool> {
    let manager = Manager::new(config)?;

    let mut pool_config = deadpool::managed::PoolConfig::default();

    if let Some(max_size) = config.pool.max_size {
        pool_config.max_size = max_size;
    }

    if let Some(timeout_create) = config.pool.timeout_create {
        pool_config.timeouts.create = Some(timeout_create);
    }

    if let Some(timeout_wait) = config.pool.timeout_wait {
        pool_config.timeouts.wait = Some(timeout_wait);
    }

    if let Some(timeout_recycle) = config.pool.timeout_recycle {
        pool_config.timeouts.recycle = Some(timeout_recycle);
    }

    let pool = Pool::builder(manager)
        .config(pool_config)
        .runtime(deadpool::Runtime::Tokio1)
        .build()
        .map_err(|e| RedisError::from((redis::ErrorKind::IoError, "Failed to create pool", e.to_string())))?;

    Ok(pool)
}
