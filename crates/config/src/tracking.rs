//! API call tracking configuration.

use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::Deserialize;
use url::Url;

/// API call tracking configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingConfig {
    /// How tracked calls are recorded.
    pub mode: TrackingMode,
    /// How many submissions may sit in the queue before new ones are dropped.
    pub queue_capacity: usize,
    /// Number of permanent persistence workers.
    pub min_workers: usize,
    /// Upper bound on workers under load.
    pub max_workers: usize,
    /// Storage settings, required when `mode` is `persist`.
    pub storage: Option<TrackingStorageConfig>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            mode: TrackingMode::default(),
            queue_capacity: 500,
            min_workers: 5,
            max_workers: 10,
            storage: None,
        }
    }
}

/// Strategy used to record tracked API calls.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Discard every call.
    Ignore,
    /// Write one log line per call.
    #[default]
    Log,
    /// Persist calls asynchronously to storage.
    Persist,
}

/// Storage settings for the persistent tracker.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackingStorageConfig {
    /// Redis connection URL.
    pub url: Url,
    /// Prefix applied to every key the tracker writes.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Acknowledgment level required before a write counts as complete.
    #[serde(default)]
    pub durability: WriteDurability,
    /// How long to wait for replica acknowledgment with `replicated` durability.
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub replication_timeout: Option<Duration>,
    /// Connection pool configuration.
    #[serde(default)]
    pub pool: StoragePoolConfig,
}

fn default_key_prefix() -> String {
    "restservice:".to_string()
}

/// Acknowledgment threshold for tracking writes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteDurability {
    /// The primary's acknowledgment is enough.
    #[default]
    Primary,
    /// Wait for at least one replica to acknowledge the write.
    Replicated,
}

/// Connection pool configuration for the tracking storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoragePoolConfig {
    /// Maximum number of connections.
    pub max_size: Option<usize>,
    /// Timeout for creating connections.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub timeout_create: Option<Duration>,
    /// Timeout for waiting for a connection.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub timeout_wait: Option<Duration>,
    /// Timeout before recycling idle connections.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub timeout_recycle: Option<Duration>,
}

impl Default for StoragePoolConfig {
    fn default() -> Self {
        Self {
            max_size: Some(10),
            timeout_create: Some(Duration::from_secs(5)),
            timeout_wait: Some(Duration::from_secs(5)),
            timeout_recycle: Some(Duration::from_secs(300)),
        }
    }
}
