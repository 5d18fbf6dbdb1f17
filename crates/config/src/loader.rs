use std::path::Path;

use anyhow::{Context, bail};

use crate::{Config, TrackingMode};

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse configuration from {}", path.display()))?;

    validate(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    let tracking = &config.tracking;

    if tracking.mode == TrackingMode::Persist && tracking.storage.is_none() {
        bail!(r#"tracking mode is "persist" but [tracking.storage] is not configured"#);
    }

    if tracking.queue_capacity == 0 {
        bail!("tracking.queue_capacity must be greater than zero");
    }

    if tracking.min_workers == 0 {
        bail!("tracking.min_workers must be greater than zero");
    }

    if tracking.min_workers > tracking.max_workers {
        bail!(
            "tracking.min_workers ({}) must not exceed tracking.max_workers ({})",
            tracking.min_workers,
            tracking.max_workers
        );
    }

    Ok(())
}
