//! Log entry types
//!
//! Core types for the structured, user-facing log records a connection
//! produces. Entries are immutable after construction; their serialized
//! JSON form defines both equality and the byte cost used by size-capped
//! exports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_CORRELATION_ID;

/// Logical phase of message flow a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// Messages consumed from a source address
    Source,
    /// Messages published to a target address
    Target,
    /// Command responses flowing back to the caller
    Response,
    /// Everything tied to the connection itself
    Connection,
}

/// Lifecycle event within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Consumed,
    Mapped,
    Dropped,
    Enforced,
    Acknowledged,
    Dispatched,
    Filtered,
    Published,
    Other,
}

/// Outcome level of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Success,
    Failure,
}

impl LogLevel {
    /// Lowercase wire name, as used in forwarded records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Response => "response",
            Self::Connection => "connection",
        }
    }
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumed => "consumed",
            Self::Mapped => "mapped",
            Self::Dropped => "dropped",
            Self::Enforced => "enforced",
            Self::Acknowledged => "acknowledged",
            Self::Dispatched => "dispatched",
            Self::Filtered => "filtered",
            Self::Published => "published",
            Self::Other => "other",
        }
    }
}

/// Typed reference to the entity a log entry concerns (e.g. a thing id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind, e.g. "thing" or "policy"
    pub kind: String,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// One structured, user-facing log record
///
/// Immutable after construction. The serialized length of an entry is what
/// the size-capped export counts against its byte budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub category: LogCategory,
    #[serde(rename = "type")]
    pub kind: LogType,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityRef>,
}

impl LogEntry {
    /// Create a new entry; an empty correlation id is replaced by the fallback
    pub fn new(
        correlation_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        category: LogCategory,
        kind: LogType,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        let correlation_id = correlation_id.into();
        let correlation_id = if correlation_id.is_empty() {
            FALLBACK_CORRELATION_ID.to_string()
        } else {
            correlation_id
        };
        Self {
            correlation_id,
            timestamp,
            category,
            kind,
            level,
            message: message.into(),
            address: None,
            entity: None,
        }
    }

    /// Attach the source/target address the entry belongs to
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Attach the entity the entry concerns
    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Serialized JSON length in bytes
    ///
    /// Used by size-capped exports. Serialization of an entry cannot fail
    /// (all fields are plain data); a length of 0 is returned defensively
    /// if it ever does.
    pub fn serialized_len(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(0)
    }
}
