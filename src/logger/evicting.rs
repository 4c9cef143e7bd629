//! In-memory logger backed by evicting queues
//!
//! The default logger implementation: one bounded queue for success
//! entries, one for failure entries (exceptions are recorded as failures).
//! Messages come from the pre-seeded templates for the logger's
//! category/type unless the caller overrides them, and may be enriched
//! with request headers/payload when debug logging is permitted both by
//! the logger instance and by the request itself.

use crate::config::StoreConfig;
use crate::connection::{ConnectionFailure, LogInfo};
use crate::entry::{LogCategory, LogEntry, LogLevel, LogType};
use crate::error::Result;
use crate::queue::EvictingQueue;
use crate::templates::{self, MessageSet};

/// Rendered failure text when a caller reports a failure without details
const UNSPECIFIED_FAILURE: &str = "not specified";

/// Bounded in-memory logger for one (category, type, address) slot
#[derive(Debug)]
pub struct EvictingLogger {
    category: LogCategory,
    kind: LogType,
    address: Option<String>,
    log_headers_and_payload: bool,
    templates: MessageSet,
    success: EvictingQueue<LogEntry>,
    failure: EvictingQueue<LogEntry>,
}

impl EvictingLogger {
    pub fn new(
        category: LogCategory,
        kind: LogType,
        address: Option<String>,
        config: &StoreConfig,
    ) -> Self {
        Self {
            category,
            kind,
            address,
            log_headers_and_payload: config.log_headers_and_payload,
            templates: templates::defaults(category, kind),
            success: EvictingQueue::with_capacity(config.success_capacity),
            failure: EvictingQueue::with_capacity(config.failure_capacity),
        }
    }

    // === Writes ===

    pub fn success(&self, info: &LogInfo) -> Result<()> {
        self.compose(info, LogLevel::Success, self.templates.success, &[])
    }

    pub fn success_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        self.compose(info, LogLevel::Success, message, args)
    }

    pub fn failure(&self, info: &LogInfo, failure: Option<&ConnectionFailure>) -> Result<()> {
        let rendered = failure
            .map(ConnectionFailure::render)
            .unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string());
        self.compose(
            info,
            LogLevel::Failure,
            self.templates.failure,
            &[rendered.as_str()],
        )
    }

    pub fn failure_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        self.compose(info, LogLevel::Failure, message, args)
    }

    pub fn exception(&self, info: &LogInfo, failure: Option<&ConnectionFailure>) -> Result<()> {
        let rendered = failure
            .map(ConnectionFailure::render)
            .unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string());
        self.compose(
            info,
            LogLevel::Failure,
            self.templates.exception,
            &[rendered.as_str()],
        )
    }

    pub fn exception_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        self.compose(info, LogLevel::Failure, message, args)
    }

    /// Store a pre-built entry
    pub fn record(&self, entry: LogEntry) -> Result<()> {
        match entry.level {
            LogLevel::Success => self.success.offer(entry),
            LogLevel::Failure => self.failure.offer(entry),
        }
        Ok(())
    }

    // === Reads ===

    /// Success entries followed by failure entries
    ///
    /// No ordering guarantee across the two queues; callers needing
    /// chronological order sort by timestamp.
    pub fn entries(&self) -> Vec<LogEntry> {
        let mut entries = self.success.snapshot();
        entries.extend(self.failure.snapshot());
        entries
    }

    // === Lifecycle ===

    pub fn clear(&self) {
        self.success.clear();
        self.failure.clear();
    }

    pub fn close(&self) {
        self.clear();
    }

    // === Internals ===

    fn compose(
        &self,
        info: &LogInfo,
        level: LogLevel,
        template: &str,
        args: &[&str],
    ) -> Result<()> {
        let message = self.enrich(info, templates::format(template, args));

        let mut entry = LogEntry::new(
            info.correlation_id.clone(),
            info.timestamp,
            self.category,
            self.kind,
            level,
            message,
        );
        if let Some(address) = &self.address {
            entry = entry.with_address(address.clone());
        }
        if let Some(entity) = &info.entity {
            entry = entry.with_entity(entity.clone());
        }
        self.record(entry)
    }

    /// Append header/payload detail when both the logger and the request allow it
    fn enrich(&self, info: &LogInfo, mut message: String) -> String {
        if !self.log_headers_and_payload || info.is_synthetic() {
            return message;
        }

        let scope = info.debug_scope();
        if scope.include_headers() && !info.headers.is_empty() {
            if scope.reveal_header_values() {
                message.push_str(&format!(" - Headers: {:?}", info.headers));
            } else {
                let keys: Vec<&String> = info.headers.keys().collect();
                message.push_str(&format!(" - Header keys: {:?}", keys));
            }
        }
        if scope.include_payload() {
            if let Some(payload) = info.payload() {
                message.push_str(&format!(" - Payload: {}", payload));
            }
        }
        message
    }
}
