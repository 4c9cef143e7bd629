//! Per-connection diagnostic logging for IoT connectivity gateways
//!
//! Unlike operator logs, these are structured, bounded, queryable event
//! records ("message consumed", "mapping failed", "publish acknowledged")
//! that end users inspect to diagnose why *their* connection misbehaves.
//!
//! Building blocks, leaf to root:
//! - [`entry::LogEntry`] - immutable structured record
//! - [`queue::EvictingQueue`] - bounded FIFO that drops the oldest on overflow
//! - [`logger::ConnectionLogger`] - the logger variants (in-memory store,
//!   collector forwarder, fan-out, muteable wrapper, inert stand-in)
//! - [`registry::LoggerRegistry`] - keyed lookup, lifecycle hooks and
//!   size-capped aggregation, one per process
//! - [`aggregator`] - scatter-gather collection across parallel client
//!   workers, with deadline and partial-result fallback
//!
//! The one invariant everything here bends around: a failure inside
//! logging must never propagate to, or slow down, the connection's actual
//! message-processing path.

pub mod aggregator;
pub mod config;
pub mod connection;
pub mod constants;
pub mod entry;
pub mod error;
pub mod logger;
pub mod queue;
pub mod registry;
pub mod templates;
pub mod truncate;

pub use aggregator::{
    spawn_collector, CollectorHandle, CollectorOutcome, LogsRequest, LogsResponse, PartialLogs,
};
pub use config::{Config, ForwardConfig, StoreConfig};
pub use connection::{ConnectionDescriptor, ConnectionFailure, DebugScope, LogInfo};
pub use entry::{EntityRef, LogCategory, LogEntry, LogLevel, LogType};
pub use error::{LogError, Result};
pub use logger::ConnectionLogger;
pub use registry::{AggregatedLogs, LoggerRegistry, LogWindow, LoggerKey};

/// Initialize internal tracing for gateway debug output
///
/// Call early, before any logging occurs. Set `verbose` to true for
/// debug-level output.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .try_init();
}
