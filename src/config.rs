//! Configuration management
//!
//! Everything an embedding gateway can tune about connection logging:
//! per-logger store capacities, the export byte budget, the logging window
//! duration, and the optional external forwarder. All sections default to
//! sane values so an empty TOML block is a valid configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COLLECTOR_ENDPOINT, DEFAULT_FAILURE_CAPACITY, DEFAULT_FLUSH_WAIT_MS,
    DEFAULT_LOGGING_DURATION_SECS, DEFAULT_MAX_LOG_SIZE_BYTES, DEFAULT_SUCCESS_CAPACITY,
    DEFAULT_TAG_PREFIX, FORWARD_BUFFER_CAPACITY,
};
use crate::entry::LogLevel;
use crate::error::{LogError, Result};

/// Connection-logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    /// External forwarder; absent means in-memory stores only
    pub forward: Option<ForwardConfig>,
}

/// In-memory store and window tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of each logger's success store
    pub success_capacity: usize,
    /// Capacity of each logger's failure store
    pub failure_capacity: usize,
    /// Byte budget for one aggregated export
    pub max_log_size_bytes: usize,
    /// How long a connection stays enabled for logging after unmute (seconds)
    pub logging_duration_secs: u64,
    /// Allow loggers to enrich messages with request headers/payload
    pub log_headers_and_payload: bool,
}

/// External collector forwarding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Collector endpoint, host:port
    pub endpoint: String,
    /// Tag prefix; records are tagged `<prefix>:<connection-id>`
    pub tag_prefix: String,
    /// Which entry levels are forwarded
    pub levels: Vec<LogLevel>,
    /// Optional identifier of this gateway instance, added to every record
    pub instance_id: Option<String>,
    /// Static key/value context added to every record
    pub context: BTreeMap<String, String>,
    /// Capacity of the in-process record buffer
    pub buffer_capacity: usize,
    /// Wait for the buffer to drain on close (milliseconds)
    pub flush_wait_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            success_capacity: DEFAULT_SUCCESS_CAPACITY,
            failure_capacity: DEFAULT_FAILURE_CAPACITY,
            max_log_size_bytes: DEFAULT_MAX_LOG_SIZE_BYTES,
            logging_duration_secs: DEFAULT_LOGGING_DURATION_SECS,
            log_headers_and_payload: false,
        }
    }
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COLLECTOR_ENDPOINT.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            levels: vec![LogLevel::Success, LogLevel::Failure],
            instance_id: None,
            context: BTreeMap::new(),
            buffer_capacity: FORWARD_BUFFER_CAPACITY,
            flush_wait_ms: DEFAULT_FLUSH_WAIT_MS,
        }
    }
}

impl StoreConfig {
    /// Logging window duration as a `chrono::Duration`
    pub fn logging_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.logging_duration_secs as i64)
    }
}

impl ForwardConfig {
    pub fn flush_wait(&self) -> Duration {
        Duration::from_millis(self.flush_wait_ms)
    }
}

impl Config {
    /// Parse a TOML document into a config
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| LogError::ConfigParse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if self.store.max_log_size_bytes == 0 {
            return Err(LogError::ConfigValidation {
                field: "store.max_log_size_bytes",
                reason: "must be greater than zero".into(),
            });
        }
        if self.store.logging_duration_secs == 0 {
            return Err(LogError::ConfigValidation {
                field: "store.logging_duration_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if let Some(forward) = &self.forward {
            if !forward.endpoint.contains(':') {
                return Err(LogError::ConfigValidation {
                    field: "forward.endpoint",
                    reason: format!("expected host:port, got '{}'", forward.endpoint),
                });
            }
            if forward.buffer_capacity == 0 {
                return Err(LogError::ConfigValidation {
                    field: "forward.buffer_capacity",
                    reason: "must be greater than zero".into(),
                });
            }
            if forward.levels.is_empty() {
                return Err(LogError::ConfigValidation {
                    field: "forward.levels",
                    reason: "at least one level must be forwarded".into(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_values() {
        let config = StoreConfig::default();

        assert_eq!(config.success_capacity, DEFAULT_SUCCESS_CAPACITY);
        assert_eq!(config.failure_capacity, DEFAULT_FAILURE_CAPACITY);
        assert_eq!(config.max_log_size_bytes, DEFAULT_MAX_LOG_SIZE_BYTES);
        assert_eq!(config.logging_duration_secs, DEFAULT_LOGGING_DURATION_SECS);
        assert!(!config.log_headers_and_payload);
    }

    #[test]
    fn test_default_has_no_forwarder() {
        let config = Config::default();
        assert!(config.forward.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.store.success_capacity, DEFAULT_SUCCESS_CAPACITY);
        assert!(config.forward.is_none());
    }

    #[test]
    fn test_partial_store_section() {
        let config = Config::from_toml_str(
            r#"
[store]
success_capacity = 50
"#,
        )
        .unwrap();

        assert_eq!(config.store.success_capacity, 50);
        assert_eq!(config.store.failure_capacity, DEFAULT_FAILURE_CAPACITY);
    }

    #[test]
    fn test_forward_section_enables_forwarding() {
        let config = Config::from_toml_str(
            r#"
[forward]
endpoint = "10.0.0.5:24224"
levels = ["failure"]
"#,
        )
        .unwrap();

        let forward = config.forward.unwrap();
        assert_eq!(forward.endpoint, "10.0.0.5:24224");
        assert_eq!(forward.levels, vec![LogLevel::Failure]);
        assert_eq!(forward.tag_prefix, DEFAULT_TAG_PREFIX);
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.store.max_log_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.forward = Some(ForwardConfig {
            endpoint: "not-an-endpoint".into(),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_levels() {
        let mut config = Config::default();
        config.forward = Some(ForwardConfig {
            levels: vec![],
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.store.success_capacity = 42;
        config.forward = Some(ForwardConfig::default());

        let text = toml::to_string_pretty(&config).unwrap();
        let restored = Config::from_toml_str(&text).unwrap();

        assert_eq!(restored.store.success_capacity, 42);
        assert!(restored.forward.is_some());
    }

    #[test]
    fn test_bad_toml_reports_parse_error() {
        let err = Config::from_toml_str("store = 3").unwrap_err();
        assert!(matches!(err, LogError::ConfigParse { .. }));
    }
}
