//! Centralized error types for the crate
//!
//! All errors are represented by the `LogError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, LogError>`.
//!
//! Note that errors rarely reach an embedding gateway: the muteable wrapper
//! and the registry boundary both swallow them (fault containment).

use std::fmt;

/// All connection-logging errors
#[derive(Debug)]
pub enum LogError {
    // === Forwarding ===
    /// Failed to bind the forwarder's UDP socket
    CollectorBind {
        endpoint: String,
        source: std::io::Error,
    },
    /// Collector endpoint could not be parsed as host:port
    CollectorEndpoint { endpoint: String },
    /// The forwarder's drain thread is gone; records can no longer be shipped
    ShipperClosed,

    // === Configuration ===
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },
    /// Config text could not be parsed
    ConfigParse { reason: String },

    // === Stores ===
    /// A logger delegate reported a write failure
    Delegate { reason: String },
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CollectorBind { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectorBind { endpoint, .. } => {
                write!(f, "Cannot bind forwarder socket for {}", endpoint)
            }
            Self::CollectorEndpoint { endpoint } => {
                write!(f, "Invalid collector endpoint: {}", endpoint)
            }
            Self::ShipperClosed => write!(f, "Log shipper is closed"),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::ConfigParse { reason } => write!(f, "Config parse error: {}", reason),
            Self::Delegate { reason } => write!(f, "Logger delegate failed: {}", reason),
        }
    }
}

/// Alias for Result with LogError
pub type Result<T> = std::result::Result<T, LogError>;
