//! Application configuration. Dispatch defaults, data paths, transport
//! credentials.

use crate::domain::dispatch::{DEFAULT_BATCH_SIZE, DEFAULT_INTER_BATCH_DELAY, DispatchConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding the interaction log. Read from CRM_ENGAGE_DATA_DIR.
    pub data_dir: Option<String>,

    /// Recipients per batch. Read from CRM_ENGAGE_BATCH_SIZE.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Delay in ms between batches (rate limiting). Read from
    /// CRM_ENGAGE_BATCH_DELAY_MS.
    #[serde(default)]
    pub batch_delay_ms: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────
    // Transport configuration
    // ─────────────────────────────────────────────────────────────────────
    /// Provider send endpoint. Read from CRM_ENGAGE_TRANSPORT_URL.
    #[serde(default)]
    pub transport_url: Option<String>,

    /// Provider bearer token. Read from CRM_ENGAGE_TRANSPORT_TOKEN.
    #[serde(default)]
    pub transport_token: Option<String>,

    /// Per-request transport timeout in seconds. Read from
    /// CRM_ENGAGE_TRANSPORT_TIMEOUT_SECS.
    #[serde(default)]
    pub transport_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("CRM_ENGAGE"));
        if let Ok(path) = std::env::var("CRM_ENGAGE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or("./data"))
    }

    /// Path of the JSONL interaction log inside the data dir.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir_or_default().join("interactions.jsonl")
    }

    pub fn batch_size_or_default(&self) -> usize {
        self.batch_size.filter(|n| *n > 0).unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn batch_delay_or_default(&self) -> Duration {
        self.batch_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTER_BATCH_DELAY)
    }

    pub fn transport_timeout_or_default(&self) -> Duration {
        Duration::from_secs(self.transport_timeout_secs.unwrap_or(30))
    }

    /// True when an HTTP transport can be constructed.
    pub fn is_transport_configured(&self) -> bool {
        self.transport_url.is_some()
    }

    /// Dispatch defaults from this configuration.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            batch_size: self.batch_size_or_default(),
            inter_batch_delay: self.batch_delay_or_default(),
            ..DispatchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dispatch_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.batch_size_or_default(), 10);
        assert_eq!(cfg.batch_delay_or_default(), Duration::from_millis(1000));
        assert_eq!(cfg.data_dir_or_default(), PathBuf::from("./data"));
        assert!(cfg.log_path().ends_with("interactions.jsonl"));
        assert!(!cfg.is_transport_configured());
    }

    #[test]
    fn zero_batch_size_falls_back_to_default() {
        let cfg = AppConfig {
            batch_size: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.batch_size_or_default(), 10);
        let dispatch = cfg.dispatch_config();
        assert_eq!(dispatch.batch_size, 10);
    }
}
