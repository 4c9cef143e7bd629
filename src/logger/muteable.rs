//! Muteable wrapper with fault containment
//!
//! Wraps a delegate logger and adds two orthogonal switches:
//!
//! - **muted** (the initial state): writes are discarded and reads return
//!   empty, without touching the delegate's stored entries. Flipping the
//!   flag is deliberately unsynchronized; a write racing a mute may land
//!   or not, which is acceptable for best-effort diagnostics.
//! - **faulted**: the first delegate error on any write permanently
//!   disables this logger instance. One-way, not reversible by
//!   mute/unmute. From then on every call is swallowed and traced.
//!
//! The faulted transition is the load-bearing invariant of the subsystem:
//! a failure inside logging must never propagate to, or abort, the
//! connection's message-processing path.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{trace, warn};

use super::ConnectionLogger;
use crate::entry::LogEntry;
use crate::error::Result;

/// Delegate wrapper with mute/unmute and permanent fault downgrade
pub struct MuteableLogger {
    muted: AtomicBool,
    faulted: AtomicBool,
    delegate: Box<ConnectionLogger>,
}

impl MuteableLogger {
    /// Wrap a delegate in the initial, muted state
    pub fn new(delegate: ConnectionLogger) -> Self {
        Self {
            muted: AtomicBool::new(true),
            faulted: AtomicBool::new(false),
            delegate: Box::new(delegate),
        }
    }

    /// Wrap a delegate that starts unmuted (connection already active)
    pub fn unmuted(delegate: ConnectionLogger) -> Self {
        let logger = Self::new(delegate);
        logger.muted.store(false, Ordering::Relaxed);
        logger
    }

    // === Mute state ===

    pub fn mute(&self) {
        self.muted.store(true, Ordering::Relaxed);
    }

    pub fn unmute(&self) {
        self.muted.store(false, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    // === Writes ===

    /// Run a write against the delegate, unless muted or faulted
    ///
    /// A delegate error trips the one-way faulted switch; it is never
    /// reported to the caller.
    pub(super) fn guarded<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&ConnectionLogger) -> Result<()>,
    {
        if self.faulted.load(Ordering::Relaxed) {
            trace!("dropping write to faulted logger");
            return Ok(());
        }
        if self.muted.load(Ordering::Relaxed) {
            trace!("dropping write to muted logger");
            return Ok(());
        }
        if let Err(e) = op(&self.delegate) {
            warn!(error = %e, "logger delegate failed, disabling this logger instance");
            self.faulted.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    // === Reads ===

    /// Delegate entries, or empty while muted or faulted
    pub fn entries(&self) -> Vec<LogEntry> {
        if self.muted.load(Ordering::Relaxed) || self.faulted.load(Ordering::Relaxed) {
            return Vec::new();
        }
        self.delegate.entries()
    }

    // === Lifecycle (pass through mute, swallowed once faulted) ===

    pub fn clear(&self) {
        if self.faulted.load(Ordering::Relaxed) {
            return;
        }
        self.delegate.clear();
    }

    pub fn close(&self) {
        if self.faulted.load(Ordering::Relaxed) {
            return;
        }
        self.delegate.close();
    }
}
