//! Fan-out over several loggers
//!
//! Forwards every call to each child in list order; used to drive the
//! in-memory store and the external forwarder from one call site. A child
//! failure does not stop the fan-out: later children still receive the
//! call and the first error is reported afterwards.

use super::ConnectionLogger;
use crate::entry::LogEntry;
use crate::error::Result;

/// Logger that forwards every call to a list of children
pub struct CompoundLogger {
    children: Vec<ConnectionLogger>,
}

impl CompoundLogger {
    pub fn new(children: Vec<ConnectionLogger>) -> Self {
        Self { children }
    }

    // === Writes ===

    /// Apply a write to every child, returning the first error last
    pub(super) fn fan_out<F>(&self, op: F) -> Result<()>
    where
        F: Fn(&ConnectionLogger) -> Result<()>,
    {
        let mut first_err = None;
        for child in &self.children {
            if let Err(e) = op(child) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // === Reads ===

    /// Concatenation of all children's entries, in child order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.children.iter().flat_map(|c| c.entries()).collect()
    }

    // === Mute state ===

    /// Propagate to children that support muting; others are unaffected
    pub fn mute(&self) {
        for child in &self.children {
            child.mute();
        }
    }

    pub fn unmute(&self) {
        for child in &self.children {
            child.unmute();
        }
    }

    /// True only if every mute-capable child is muted
    ///
    /// Children without a mute switch (the forwarder in particular) are
    /// ignored here; they are gated by their own level filter instead.
    /// With no mute-capable children at all this reports true.
    pub fn is_muted(&self) -> bool {
        self.children
            .iter()
            .filter(|c| c.mute_capable())
            .all(|c| c.is_muted())
    }

    pub(super) fn mute_capable(&self) -> bool {
        self.children.iter().any(|c| c.mute_capable())
    }

    // === Lifecycle ===

    pub fn clear(&self) {
        for child in &self.children {
            child.clear();
        }
    }

    /// Close every child; a failing child does not stop the others
    pub fn close(&self) {
        for child in &self.children {
            child.close();
        }
    }
}
