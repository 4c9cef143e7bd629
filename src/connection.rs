//! Connection-facing collaborator types
//!
//! The logging layer does not own the connection domain model. It consumes
//! a small descriptor (id plus source/target topology), a per-call
//! `LogInfo` carrying request context, and a generic `ConnectionFailure`
//! for reporting failures without a custom message.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::constants::{DEBUG_LOG_HEADER, FALLBACK_CORRELATION_ID};
use crate::entry::EntityRef;

/// Lazily-computed payload text for debug enrichment
pub type PayloadFn = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Minimal view of a connection exposed to the logging layer
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    /// Stable connection id
    pub id: String,
    /// Source addresses messages are consumed from
    pub sources: Vec<String>,
    /// Target addresses messages are published to
    pub targets: Vec<String>,
    /// Number of parallel client workers serving this connection
    pub client_count: usize,
}

impl ConnectionDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sources: Vec::new(),
            targets: Vec::new(),
            client_count: 1,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_client_count(mut self, client_count: usize) -> Self {
        self.client_count = client_count;
        self
    }
}

/// Generic failure description used when reporting without a custom message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionFailure {
    pub message: String,
    pub description: Option<String>,
}

impl ConnectionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Message and description joined the way entries render them
    pub fn render(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} - {}", self.message, desc),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// How much of the request a log message may reveal
///
/// Parsed from the `debug-log` request header. Absent or unknown values
/// fall back to `Header` (keys only, no values, no payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugScope {
    /// No enrichment at all
    Off,
    /// Header keys only
    Header,
    /// Header keys plus payload
    Payload,
    /// Full header values plus payload
    All,
}

impl DebugScope {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "payload" => Self::Payload,
            "all" => Self::All,
            _ => Self::Header,
        }
    }

    /// Whether header keys may be appended to the message
    pub fn include_headers(&self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Whether full header values (not just keys) may be revealed
    pub fn reveal_header_values(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether the payload may be appended to the message
    pub fn include_payload(&self) -> bool {
        matches!(self, Self::Payload | Self::All)
    }
}

/// Per-call request context handed to a logger
///
/// Carries correlation id, timestamp, optional entity, request headers and
/// a lazily-computed payload. A `synthetic` info (no request context) never
/// gets debug enrichment.
#[derive(Clone)]
pub struct LogInfo {
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub entity: Option<EntityRef>,
    pub headers: BTreeMap<String, String>,
    payload: Option<PayloadFn>,
    synthetic: bool,
}

impl LogInfo {
    /// Context for a real request; empty correlation ids get the fallback
    pub fn new(correlation_id: impl Into<String>) -> Self {
        let correlation_id = correlation_id.into();
        let correlation_id = if correlation_id.is_empty() {
            FALLBACK_CORRELATION_ID.to_string()
        } else {
            correlation_id
        };
        Self {
            correlation_id,
            timestamp: Utc::now(),
            entity: None,
            headers: BTreeMap::new(),
            payload: None,
            synthetic: false,
        }
    }

    /// Context for a call with no backing request (lifecycle events etc.)
    pub fn synthetic() -> Self {
        Self {
            correlation_id: FALLBACK_CORRELATION_ID.to_string(),
            timestamp: Utc::now(),
            entity: None,
            headers: BTreeMap::new(),
            payload: None,
            synthetic: true,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach a payload supplier; invoked at most once per enriched entry
    pub fn with_payload<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.payload = Some(Arc::new(supplier));
        self
    }

    /// True when this info carries no request context
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Debug scope requested by the call's own headers
    pub fn debug_scope(&self) -> DebugScope {
        match self.headers.get(DEBUG_LOG_HEADER) {
            Some(value) => DebugScope::parse(value),
            None => DebugScope::Header,
        }
    }

    /// Compute the payload, if a supplier was attached
    pub fn payload(&self) -> Option<String> {
        self.payload.as_ref().and_then(|supplier| supplier())
    }
}

impl fmt::Debug for LogInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogInfo")
            .field("correlation_id", &self.correlation_id)
            .field("timestamp", &self.timestamp)
            .field("entity", &self.entity)
            .field("headers", &self.headers)
            .field("has_payload", &self.payload.is_some())
            .field("synthetic", &self.synthetic)
            .finish()
    }
}
