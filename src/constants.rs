//! Crate-wide constants
//!
//! Centralized defaults to avoid duplication and ensure consistency.

// =============================================================================
// Store capacities
// =============================================================================

/// Default capacity of the per-logger success store
pub const DEFAULT_SUCCESS_CAPACITY: usize = 200;

/// Default capacity of the per-logger failure store
pub const DEFAULT_FAILURE_CAPACITY: usize = 200;

/// Default byte budget for one aggregated log export
pub const DEFAULT_MAX_LOG_SIZE_BYTES: usize = 250_000;

// =============================================================================
// Timing
// =============================================================================

/// Default duration a connection stays enabled for logging after unmute (seconds)
pub const DEFAULT_LOGGING_DURATION_SECS: u64 = 3600;

/// Default wait for the forwarder to drain its buffer on close (milliseconds)
pub const DEFAULT_FLUSH_WAIT_MS: u64 = 1000;

// =============================================================================
// Forwarding
// =============================================================================

/// Default collector endpoint for forwarded records
pub const DEFAULT_COLLECTOR_ENDPOINT: &str = "127.0.0.1:24224";

/// Default tag prefix for forwarded records (`<prefix>:<connection-id>`)
pub const DEFAULT_TAG_PREFIX: &str = "connection";

/// Capacity of the forwarder's in-process record buffer
pub const FORWARD_BUFFER_CAPACITY: usize = 1000;

// =============================================================================
// Identifiers
// =============================================================================

/// Correlation id recorded when a request carries none
pub const FALLBACK_CORRELATION_ID: &str = "<not-provided>";

/// Synthetic address used by the response-category logger
pub const RESPONSES_ADDRESS: &str = "_responses";

/// Request header that gates header/payload enrichment
pub const DEBUG_LOG_HEADER: &str = "debug-log";
