//! Process-wide registry of connection loggers
//!
//! Owns the map of logger instances keyed by
//! (connection, category, type, address) and the per-connection logging
//! window metadata. The registry is the only writer of both maps and is
//! built once per process, injected into whatever owns connection
//! lifecycle. No global statics; tests construct a fresh one each.
//!
//! Public contract: no call on this type can fail observably. Lookup
//! always returns a logger (an inert one in the worst case), lifecycle
//! hooks log and skip on trouble, and aggregation degrades to an empty
//! result. A failure in here must never abort unrelated connection
//! processing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{Config, ForwardConfig, StoreConfig};
use crate::connection::ConnectionDescriptor;
use crate::constants::RESPONSES_ADDRESS;
use crate::entry::{LogCategory, LogEntry, LogType};
use crate::logger::{
    CompoundLogger, ConnectionLogger, EvictingLogger, ExceptionalLogger, ForwardingLogger,
    LogShipper, MuteableLogger,
};
use crate::truncate::truncate_to_size;

/// Identity of one logger instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoggerKey {
    pub connection_id: String,
    pub category: LogCategory,
    pub kind: LogType,
    /// Absent for the catch-all connection logger
    pub address: Option<String>,
}

/// Time window during which a connection is enabled for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Snapshot returned by [`LoggerRegistry::aggregate_logs`]
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedLogs {
    pub enabled_since: Option<DateTime<Utc>>,
    pub enabled_until: Option<DateTime<Utc>>,
    pub entries: Vec<LogEntry>,
}

/// Forwarding setup shared by all forwarding loggers of this registry
///
/// The shipper is created lazily on first use; a creation failure is
/// remembered so later lookups answer with an inert logger instead of
/// retrying a known-bad endpoint on every call.
struct ForwardState {
    config: ForwardConfig,
    shipper: Mutex<Option<std::result::Result<Arc<LogShipper>, String>>>,
}

impl ForwardState {
    fn shipper(&self) -> std::result::Result<Arc<LogShipper>, String> {
        let mut slot = self.shipper.lock();
        slot.get_or_insert_with(|| {
            LogShipper::new(&self.config)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        })
        .clone()
    }
}

/// Registry of per-connection loggers and logging windows
pub struct LoggerRegistry {
    store: StoreConfig,
    forward: Option<ForwardState>,
    loggers: RwLock<HashMap<LoggerKey, Arc<ConnectionLogger>>>,
    windows: RwLock<HashMap<String, LogWindow>>,
}

impl LoggerRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            store: config.store,
            forward: config.forward.map(|config| ForwardState {
                config,
                shipper: Mutex::new(None),
            }),
            loggers: RwLock::new(HashMap::new()),
            windows: RwLock::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Get or create the logger for a key; never fails
    ///
    /// A fresh logger inherits the connection's current activity: unmuted
    /// when a live logging window exists, muted otherwise. If construction
    /// fails the returned logger is inert.
    pub fn get_logger(
        &self,
        connection_id: &str,
        category: LogCategory,
        kind: LogType,
        address: Option<&str>,
    ) -> Arc<ConnectionLogger> {
        let key = LoggerKey {
            connection_id: connection_id.to_string(),
            category,
            kind,
            address: address.map(str::to_string),
        };

        if let Some(logger) = self.loggers.read().get(&key) {
            return logger.clone();
        }

        let mut loggers = self.loggers.write();
        loggers
            .entry(key)
            .or_insert_with(|| {
                Arc::new(self.build_logger(connection_id, category, kind, address))
            })
            .clone()
    }

    fn build_logger(
        &self,
        connection_id: &str,
        category: LogCategory,
        kind: LogType,
        address: Option<&str>,
    ) -> ConnectionLogger {
        let mut children = vec![ConnectionLogger::Evicting(EvictingLogger::new(
            category,
            kind,
            address.map(str::to_string),
            &self.store,
        ))];

        if let Some(forward) = &self.forward {
            match forward.shipper() {
                Ok(shipper) => children.push(ConnectionLogger::Forwarding(ForwardingLogger::new(
                    shipper,
                    &forward.config,
                    connection_id,
                    category,
                    kind,
                    address.map(str::to_string),
                ))),
                Err(reason) => {
                    warn!(connection = %connection_id, %reason, "cannot build connection logger");
                    return ConnectionLogger::Exceptional(ExceptionalLogger::new(reason));
                }
            }
        }

        let compound = ConnectionLogger::Compound(CompoundLogger::new(children));
        if self.window_active(connection_id) {
            ConnectionLogger::Muteable(MuteableLogger::unmuted(compound))
        } else {
            ConnectionLogger::Muteable(MuteableLogger::new(compound))
        }
    }

    // =========================================================================
    // Lifecycle hooks
    // =========================================================================

    /// Tear down and re-create the loggers for a connection
    ///
    /// One logger per source address, one per target address, one for
    /// responses and one catch-all. Creation is idempotent per key; a key
    /// that cannot be built yields an inert logger and the connection
    /// continues with the rest.
    pub fn init_for_connection(&self, connection: &ConnectionDescriptor) {
        self.invalidate_for_connection(&connection.id);

        for source in &connection.sources {
            self.get_logger(
                &connection.id,
                LogCategory::Source,
                LogType::Consumed,
                Some(source),
            );
        }
        for target in &connection.targets {
            self.get_logger(
                &connection.id,
                LogCategory::Target,
                LogType::Published,
                Some(target),
            );
        }
        self.get_logger(
            &connection.id,
            LogCategory::Response,
            LogType::Dispatched,
            Some(RESPONSES_ADDRESS),
        );
        self.get_logger(&connection.id, LogCategory::Connection, LogType::Other, None);

        debug!(connection = %connection.id, loggers = self.logger_count(&connection.id),
               "initialized connection loggers");
    }

    /// Close and remove every logger of a connection
    pub fn invalidate_for_connection(&self, connection_id: &str) {
        let removed: Vec<Arc<ConnectionLogger>> = {
            let mut loggers = self.loggers.write();
            let keys: Vec<LoggerKey> = loggers
                .keys()
                .filter(|k| k.connection_id == connection_id)
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|k| loggers.remove(&k))
                .collect()
        };
        for logger in removed {
            logger.close();
        }
    }

    /// Suspend logging: mute every logger, drop the window, free the stores
    pub fn mute_for_connection(&self, connection_id: &str) {
        for logger in self.loggers_for(connection_id) {
            logger.mute();
            logger.clear();
        }
        self.windows.write().remove(connection_id);
        info!(connection = %connection_id, "muted connection loggers");
    }

    /// Enable logging for the configured duration starting now
    pub fn unmute_for_connection(&self, connection_id: &str) {
        let now = Utc::now();
        self.windows.write().insert(
            connection_id.to_string(),
            LogWindow {
                since: now,
                until: now + self.store.logging_duration(),
            },
        );
        for logger in self.loggers_for(connection_id) {
            logger.unmute();
        }
        info!(connection = %connection_id, "unmuted connection loggers");
    }

    /// Clear (but keep) every logger of a connection
    pub fn reset_for_connection(&self, connection_id: &str) {
        for logger in self.loggers_for(connection_id) {
            logger.clear();
        }
        debug!(connection = %connection_id, "reset connection loggers");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether any logger of the connection is currently unmuted
    pub fn is_active_for_connection(&self, connection_id: &str) -> bool {
        self.loggers_for(connection_id)
            .iter()
            .any(|logger| !logger.is_muted())
    }

    /// Number of logger instances registered for a connection
    pub fn logger_count(&self, connection_id: &str) -> usize {
        self.loggers
            .read()
            .keys()
            .filter(|k| k.connection_id == connection_id)
            .count()
    }

    /// Merge all of a connection's entries into one size-capped snapshot
    ///
    /// While logging is active the window is extended to now plus the
    /// configured duration and all stores are read; otherwise the last
    /// known window is answered with no entries. This is a read path:
    /// whatever happens, the caller gets a usable (possibly empty) result.
    pub fn aggregate_logs(&self, connection_id: &str) -> AggregatedLogs {
        if !self.is_active_for_connection(connection_id) {
            let window = self.windows.read().get(connection_id).copied();
            return AggregatedLogs {
                enabled_since: window.map(|w| w.since),
                enabled_until: window.map(|w| w.until),
                entries: Vec::new(),
            };
        }

        let now = Utc::now();
        let until = now + self.store.logging_duration();
        let window = {
            let mut windows = self.windows.write();
            let window = windows
                .entry(connection_id.to_string())
                .and_modify(|w| w.until = until)
                .or_insert(LogWindow { since: now, until });
            *window
        };

        let mut entries: Vec<LogEntry> = self
            .loggers_for(connection_id)
            .iter()
            .flat_map(|logger| logger.entries())
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        let entries = truncate_to_size(entries, self.store.max_log_size_bytes);

        AggregatedLogs {
            enabled_since: Some(window.since),
            enabled_until: Some(window.until),
            entries,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn loggers_for(&self, connection_id: &str) -> Vec<Arc<ConnectionLogger>> {
        self.loggers
            .read()
            .iter()
            .filter(|(k, _)| k.connection_id == connection_id)
            .map(|(_, logger)| logger.clone())
            .collect()
    }

    fn window_active(&self, connection_id: &str) -> bool {
        self.windows
            .read()
            .get(connection_id)
            .map(|w| w.until > Utc::now())
            .unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::LogInfo;
    use std::thread;

    fn registry() -> LoggerRegistry {
        LoggerRegistry::new(Config::default())
    }

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::new("conn-1")
            .with_sources(vec!["telemetry/a".into(), "telemetry/b".into()])
            .with_targets(vec!["events/out".into()])
    }

    #[test]
    fn test_get_logger_is_idempotent_per_key() {
        let registry = registry();
        let a = registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, Some("addr"));
        let b = registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, Some("addr"));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_absent_address_is_a_distinct_key() {
        let registry = registry();
        let with = registry.get_logger("conn-1", LogCategory::Connection, LogType::Other, Some("a"));
        let without = registry.get_logger("conn-1", LogCategory::Connection, LogType::Other, None);
        assert!(!Arc::ptr_eq(&with, &without));
    }

    #[test]
    fn test_concurrent_get_logger_returns_one_instance() {
        let registry = Arc::new(registry());
        let mut handles = vec![];
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, Some("a"))
            }));
        }
        let loggers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(loggers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_new_loggers_start_muted() {
        let registry = registry();
        let logger = registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, None);
        assert!(logger.is_muted());
        assert!(!registry.is_active_for_connection("conn-1"));
    }

    #[test]
    fn test_new_loggers_inherit_active_window() {
        let registry = registry();
        registry.unmute_for_connection("conn-1");
        let logger = registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, None);
        assert!(!logger.is_muted());
    }

    #[test]
    fn test_init_creates_one_logger_per_slot() {
        let registry = registry();
        registry.init_for_connection(&descriptor());
        // 2 sources + 1 target + responses + catch-all
        assert_eq!(registry.logger_count("conn-1"), 5);
    }

    #[test]
    fn test_init_replaces_existing_loggers() {
        let registry = registry();
        registry.init_for_connection(&descriptor());
        let before = registry.get_logger(
            "conn-1",
            LogCategory::Source,
            LogType::Consumed,
            Some("telemetry/a"),
        );

        registry.init_for_connection(&descriptor());
        let after = registry.get_logger(
            "conn-1",
            LogCategory::Source,
            LogType::Consumed,
            Some("telemetry/a"),
        );

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(registry.logger_count("conn-1"), 5);
    }

    #[test]
    fn test_unmute_opens_window_and_enables_writes() {
        let registry = registry();
        registry.init_for_connection(&descriptor());
        registry.unmute_for_connection("conn-1");

        let logger = registry.get_logger(
            "conn-1",
            LogCategory::Source,
            LogType::Consumed,
            Some("telemetry/a"),
        );
        logger.success(&LogInfo::new("corr")).unwrap();

        let logs = registry.aggregate_logs("conn-1");
        assert!(logs.enabled_since.is_some());
        assert!(logs.enabled_until.is_some());
        assert_eq!(logs.entries.len(), 1);
    }

    #[test]
    fn test_mute_clears_stores_and_drops_window() {
        let registry = registry();
        registry.init_for_connection(&descriptor());
        registry.unmute_for_connection("conn-1");

        let logger = registry.get_logger(
            "conn-1",
            LogCategory::Source,
            LogType::Consumed,
            Some("telemetry/a"),
        );
        logger.success(&LogInfo::new("corr")).unwrap();

        registry.mute_for_connection("conn-1");
        let logs = registry.aggregate_logs("conn-1");
        assert_eq!(logs.enabled_since, None);
        assert!(logs.entries.is_empty());

        // The stores were really cleared, not just hidden
        registry.unmute_for_connection("conn-1");
        assert!(registry.aggregate_logs("conn-1").entries.is_empty());
    }

    #[test]
    fn test_reset_clears_but_keeps_loggers() {
        let registry = registry();
        registry.init_for_connection(&descriptor());
        registry.unmute_for_connection("conn-1");

        let logger = registry.get_logger(
            "conn-1",
            LogCategory::Source,
            LogType::Consumed,
            Some("telemetry/a"),
        );
        logger.success(&LogInfo::new("corr")).unwrap();

        registry.reset_for_connection("conn-1");
        assert!(registry.aggregate_logs("conn-1").entries.is_empty());
        assert_eq!(registry.logger_count("conn-1"), 5);
        assert!(registry.is_active_for_connection("conn-1"));
    }

    #[test]
    fn test_aggregate_extends_window_while_active() {
        let registry = registry();
        registry.unmute_for_connection("conn-1");
        registry.get_logger("conn-1", LogCategory::Connection, LogType::Other, None);

        let first = registry.aggregate_logs("conn-1").enabled_until.unwrap();
        thread::sleep(std::time::Duration::from_millis(10));
        let second = registry.aggregate_logs("conn-1").enabled_until.unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_aggregate_sorts_entries_chronologically() {
        let registry = registry();
        registry.init_for_connection(&descriptor());
        registry.unmute_for_connection("conn-1");

        let base = Utc::now();
        let late = registry.get_logger(
            "conn-1",
            LogCategory::Target,
            LogType::Published,
            Some("events/out"),
        );
        let early = registry.get_logger(
            "conn-1",
            LogCategory::Source,
            LogType::Consumed,
            Some("telemetry/a"),
        );
        late.success(&LogInfo::new("late").at(base + chrono::Duration::seconds(5)))
            .unwrap();
        early
            .success(&LogInfo::new("early").at(base))
            .unwrap();

        let logs = registry.aggregate_logs("conn-1");
        assert_eq!(logs.entries[0].correlation_id, "early");
        assert_eq!(logs.entries[1].correlation_id, "late");
    }

    #[test]
    fn test_aggregate_applies_size_cap() {
        let mut config = Config::default();
        config.store.max_log_size_bytes = 400;
        let registry = LoggerRegistry::new(config);
        registry.unmute_for_connection("conn-1");

        let logger = registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, None);
        let base = Utc::now();
        for i in 0..20 {
            logger
                .success(&LogInfo::new(format!("corr-{}", i)).at(base + chrono::Duration::seconds(i)))
                .unwrap();
        }

        let logs = registry.aggregate_logs("conn-1");
        assert!(!logs.entries.is_empty());
        assert!(logs.entries.len() < 20);
        // Newest entry survives the cap
        assert_eq!(logs.entries.last().unwrap().correlation_id, "corr-19");
    }

    #[test]
    fn test_unreachable_collector_yields_inert_logger() {
        let mut config = Config::default();
        config.forward = Some(ForwardConfig {
            // Port out of range; endpoint resolution fails at creation
            endpoint: "127.0.0.1:99999".into(),
            ..Default::default()
        });
        let registry = LoggerRegistry::new(config);
        registry.unmute_for_connection("conn-1");

        let logger = registry.get_logger("conn-1", LogCategory::Source, LogType::Consumed, None);
        // Inert, but still safe to use
        logger.success(&LogInfo::new("corr")).unwrap();
        assert!(logger.entries().is_empty());
        assert!(!logger.is_muted());
    }
}
