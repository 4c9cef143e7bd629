//! Size-capped truncation for log exports
//!
//! Exported log sets must fit a hard transport byte budget. The rule,
//! shared by registry aggregation and the distributed collector: keep the
//! newest entries, drop from the oldest end, and return the survivors in
//! chronological order.

use crate::entry::LogEntry;

/// Truncate `entries` so their summed serialized size fits `max_bytes`
///
/// Entries are ranked newest first and accepted greedily until the first
/// one that would exceed the budget; that entry and everything older is
/// dropped. The accepted set is returned oldest first.
pub fn truncate_to_size(mut entries: Vec<LogEntry>, max_bytes: usize) -> Vec<LogEntry> {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut kept = Vec::with_capacity(entries.len());
    let mut total = 0usize;
    for entry in entries {
        let len = entry.serialized_len();
        if total + len > max_bytes {
            break;
        }
        total += len;
        kept.push(entry);
    }

    kept.reverse();
    kept
}
