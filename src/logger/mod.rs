//! Connection logger variants and dispatch
//!
//! The logger capability is a small closed set of variants dispatched
//! through one enum, with no trait objects and no capability downcasts:
//!
//! - `Evicting` - bounded in-memory store (the default)
//! - `Forwarding` - mirrors entries to the external collector
//! - `Compound` - fan-out over several loggers
//! - `Muteable` - mute/unmute plus permanent fault downgrade
//! - `Exceptional` - inert stand-in when construction failed
//!
//! Write operations return `Result` so wrappers can contain delegate
//! faults; the registry surface never lets those errors escape.

pub mod compound;
pub mod evicting;
pub mod forward;
pub mod muteable;

pub use compound::CompoundLogger;
pub use evicting::EvictingLogger;
pub use forward::{ForwardingLogger, LogShipper};
pub use muteable::MuteableLogger;

use tracing::trace;

use crate::connection::{ConnectionFailure, LogInfo};
use crate::entry::LogEntry;
use crate::error::Result;

/// Inert logger standing in for one that could not be built
///
/// Stores nothing, forwards nothing, never fails.
pub struct ExceptionalLogger {
    reason: String,
}

impl ExceptionalLogger {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn swallow(&self) -> Result<()> {
        trace!(reason = %self.reason, "dropping write to exceptional logger");
        Ok(())
    }
}

/// Always-failing delegate for exercising fault containment
#[cfg(test)]
pub struct FailingLogger;

#[cfg(test)]
impl FailingLogger {
    fn fail(&self) -> Result<()> {
        Err(crate::error::LogError::Delegate {
            reason: "injected failure".into(),
        })
    }
}

/// One logger instance, of any variant
pub enum ConnectionLogger {
    Evicting(EvictingLogger),
    Forwarding(ForwardingLogger),
    Compound(CompoundLogger),
    Muteable(MuteableLogger),
    Exceptional(ExceptionalLogger),
    #[cfg(test)]
    Failing(FailingLogger),
}

impl ConnectionLogger {
    // === Writes ===

    pub fn success(&self, info: &LogInfo) -> Result<()> {
        match self {
            Self::Evicting(l) => l.success(info),
            Self::Forwarding(l) => l.success(info),
            Self::Compound(l) => l.fan_out(|c| c.success(info)),
            Self::Muteable(l) => l.guarded(|d| d.success(info)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    pub fn success_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        match self {
            Self::Evicting(l) => l.success_with(info, message, args),
            Self::Forwarding(l) => l.success_with(info, message, args),
            Self::Compound(l) => l.fan_out(|c| c.success_with(info, message, args)),
            Self::Muteable(l) => l.guarded(|d| d.success_with(info, message, args)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    pub fn failure(&self, info: &LogInfo, failure: Option<&ConnectionFailure>) -> Result<()> {
        match self {
            Self::Evicting(l) => l.failure(info, failure),
            Self::Forwarding(l) => l.failure(info, failure),
            Self::Compound(l) => l.fan_out(|c| c.failure(info, failure)),
            Self::Muteable(l) => l.guarded(|d| d.failure(info, failure)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    pub fn failure_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        match self {
            Self::Evicting(l) => l.failure_with(info, message, args),
            Self::Forwarding(l) => l.failure_with(info, message, args),
            Self::Compound(l) => l.fan_out(|c| c.failure_with(info, message, args)),
            Self::Muteable(l) => l.guarded(|d| d.failure_with(info, message, args)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    pub fn exception(&self, info: &LogInfo, failure: Option<&ConnectionFailure>) -> Result<()> {
        match self {
            Self::Evicting(l) => l.exception(info, failure),
            Self::Forwarding(l) => l.exception(info, failure),
            Self::Compound(l) => l.fan_out(|c| c.exception(info, failure)),
            Self::Muteable(l) => l.guarded(|d| d.exception(info, failure)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    pub fn exception_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        match self {
            Self::Evicting(l) => l.exception_with(info, message, args),
            Self::Forwarding(l) => l.exception_with(info, message, args),
            Self::Compound(l) => l.fan_out(|c| c.exception_with(info, message, args)),
            Self::Muteable(l) => l.guarded(|d| d.exception_with(info, message, args)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    /// Store or forward a pre-built entry
    pub fn record(&self, entry: LogEntry) -> Result<()> {
        match self {
            Self::Evicting(l) => l.record(entry),
            Self::Forwarding(l) => l.record(entry),
            Self::Compound(l) => l.fan_out(|c| c.record(entry.clone())),
            Self::Muteable(l) => l.guarded(|d| d.record(entry)),
            Self::Exceptional(l) => l.swallow(),
            #[cfg(test)]
            Self::Failing(l) => l.fail(),
        }
    }

    // === Reads ===

    pub fn entries(&self) -> Vec<LogEntry> {
        match self {
            Self::Evicting(l) => l.entries(),
            Self::Forwarding(l) => l.entries(),
            Self::Compound(l) => l.entries(),
            Self::Muteable(l) => l.entries(),
            Self::Exceptional(_) => Vec::new(),
            #[cfg(test)]
            Self::Failing(_) => Vec::new(),
        }
    }

    // === Mute state ===

    pub fn mute(&self) {
        match self {
            Self::Muteable(l) => l.mute(),
            Self::Compound(l) => l.mute(),
            _ => {}
        }
    }

    pub fn unmute(&self) {
        match self {
            Self::Muteable(l) => l.unmute(),
            Self::Compound(l) => l.unmute(),
            _ => {}
        }
    }

    pub fn is_muted(&self) -> bool {
        match self {
            Self::Muteable(l) => l.is_muted(),
            Self::Compound(l) => l.is_muted(),
            _ => false,
        }
    }

    /// Whether this variant carries a mute switch (directly or via children)
    pub(crate) fn mute_capable(&self) -> bool {
        match self {
            Self::Muteable(_) => true,
            Self::Compound(l) => l.mute_capable(),
            _ => false,
        }
    }

    // === Lifecycle ===

    pub fn clear(&self) {
        match self {
            Self::Evicting(l) => l.clear(),
            Self::Forwarding(l) => l.clear(),
            Self::Compound(l) => l.clear(),
            Self::Muteable(l) => l.clear(),
            Self::Exceptional(_) => {}
            #[cfg(test)]
            Self::Failing(_) => {}
        }
    }

    pub fn close(&self) {
        match self {
            Self::Evicting(l) => l.close(),
            Self::Forwarding(l) => l.close(),
            Self::Compound(l) => l.close(),
            Self::Muteable(l) => l.close(),
            Self::Exceptional(_) => {}
            #[cfg(test)]
            Self::Failing(_) => {}
        }
    }
}
