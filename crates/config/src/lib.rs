//! Apitrack configuration structures to map the apitrack.toml configuration.

#![deny(missing_docs)]

mod health;
mod loader;
mod tracking;

use std::{net::SocketAddr, path::Path, path::PathBuf};

pub use health::HealthConfig;
use serde::Deserialize;
pub use tracking::{StoragePoolConfig, TrackingConfig, TrackingMode, TrackingStorageConfig, WriteDurability};

/// Main configuration structure for the apitrack application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// API call tracking configuration settings.
    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates settings that cannot be expressed at the serde level.
    ///
    /// Called at startup, before any request is served.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}

/// HTTP server configuration settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// Health endpoint configuration.
    #[serde(default)]
    pub health: HealthConfig,
    /// Static asset serving configuration. When absent, no assets are served.
    pub assets: Option<AssetsConfig>,
}

/// Static asset serving configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory served under the `/assets` path.
    pub dir: PathBuf,
}
