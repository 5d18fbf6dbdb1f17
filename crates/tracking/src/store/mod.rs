//! Storage for tracked API calls.

mod redis;
mod redis_pool;

use async_trait::async_trait;
use jiff::Timestamp;

pub use redis::RedisStore;

use crate::ApiCall;

/// One persisted API call record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// The calling client.
    pub client: String,
    /// The called API as `<METHOD> <path>`.
    pub api: String,
    /// When the record was written, not when the request arrived.
    pub timestamp: Timestamp,
}

impl CallRecord {
    /// Stamps an observed call with the current wall clock time.
    pub fn capture(call: ApiCall) -> Self {
        CallRecord {
            client: call.client,
            api: format!("{} {}", call.http_method, call.path),
            timestamp: Timestamp::now(),
        }
    }
}

/// Errors the call store can produce.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connecting to the storage backend failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Writing a record failed.
    #[error("Write error: {0}")]
    Write(String),
}

/// A sink for tracked API call records.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Writes one record.
    async fn insert(&self, record: CallRecord) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_formats_the_api_as_method_and_path() {
        let record = CallRecord::capture(ApiCall {
            client: "alice".to_string(),
            http_method: "GET".to_string(),
            path: "/clock/date".to_string(),
        });

        assert_eq!("alice", record.client);
        assert_eq!("GET /clock/date", record.api);
    }
}
