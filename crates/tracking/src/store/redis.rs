//! Redis-backed call store.
//!
//! Records go onto a stream, so the write path is a single XADD. With
//! `replicated` durability each write is followed by a WAIT for one
//! replica acknowledgment.

use std::time::Duration;

use async_trait::async_trait;
use config::{TrackingStorageConfig, WriteDurability};

use super::{
    CallRecord, CallStore, StoreError,
    redis_pool::{self, Pool},
};

/// Logical collection the records are written to, appended to the
/// configured key prefix.
const API_CALLS_STREAM: &str = "apicalls";

const DEFAULT_REPLICATION_TIMEOUT: Duration = Duration::from_secs(1);

/// Call store writing to a Redis stream through a connection pool.
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
    durability: WriteDurability,
    replication_timeout: Duration,
}

impl RedisStore {
    /// Connects to Redis and verifies the connection with a PING.
    pub async fn connect(config: &TrackingStorageConfig) -> Result<Self, StoreError> {
        let pool = redis_pool::create_pool(config)
            .map_err(|e| StoreError::Connection(format!("Failed to create Redis connection pool: {e}")))?;

        let mut conn = pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to get Redis connection from pool: {e}")))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to ping Redis server: {e}")))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            durability: config.durability,
            replication_timeout: config.replication_timeout.unwrap_or(DEFAULT_REPLICATION_TIMEOUT),
        })
    }

    fn stream_key(&self) -> String {
        format!("{}{API_CALLS_STREAM}", self.key_prefix)
    }
}

#[async_trait]
impl CallStore for RedisStore {
    async fn insert(&self, record: CallRecord) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to get Redis connection from pool: {e}")))?;

        let _: String = redis::cmd("XADD")
            .arg(self.stream_key())
            .arg("*")
            .arg("client")
            .arg(&record.client)
            .arg("api")
            .arg(&record.api)
            .arg("timestamp")
            .arg(record.timestamp.to_string())
            .query_async(&mut *conn)
            .await
            .map_err(|e| StoreError::Write(format!("Failed to append call record: {e}")))?;

        if self.durability == WriteDurability::Replicated {
            let timeout_millis = self.replication_timeout.as_millis() as u64;

            let acknowledged: i64 = redis::cmd("WAIT")
                .arg(1)
                .arg(timeout_millis)
                .query_async(&mut *conn)
                .await
                .map_err(|e| StoreError::Write(format!("Failed to wait for replica acknowledgment: {e}")))?;

            if acknowledged < 1 {
                return Err(StoreError::Write(format!(
                    "No replica acknowledged the write within {timeout_millis}ms"
                )));
            }
        }

        Ok(())
    }
}
