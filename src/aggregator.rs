//! Distributed log collection
//!
//! A connection may be served by several parallel client workers, each
//! holding its own registry slice. Answering "all logs for this
//! connection" means gathering one partial response per worker, merging
//! them, and fitting the result into the transport byte budget: bounded
//! scatter-gather with a deadline and a partial-result fallback.
//!
//! Each request spawns one single-use collector task. It processes one
//! message at a time, arms a single deadline, and terminates as soon as
//! it has replied, either with the complete merge, with whatever arrived
//! before the deadline, or with a timeout error when nothing arrived at
//! all.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::entry::LogEntry;
use crate::registry::AggregatedLogs;
use crate::truncate::truncate_to_size;

/// Request to collect all logs of a connection
#[derive(Debug, Clone)]
pub struct LogsRequest {
    pub connection_id: String,
    /// Caller context, echoed verbatim on every reply
    pub headers: BTreeMap<String, String>,
    /// Deadline for the whole collection round
    pub timeout: Duration,
    /// Byte budget for the merged reply
    pub max_log_size_bytes: usize,
}

/// One worker's slice of the connection's logs
#[derive(Debug, Clone, PartialEq)]
pub struct PartialLogs {
    pub connection_id: String,
    pub entries: Vec<LogEntry>,
    pub enabled_since: Option<DateTime<Utc>>,
    pub enabled_until: Option<DateTime<Utc>>,
}

impl PartialLogs {
    /// Wrap a local registry aggregate as one worker's partial response
    pub fn from_aggregate(connection_id: impl Into<String>, aggregate: AggregatedLogs) -> Self {
        Self {
            connection_id: connection_id.into(),
            entries: aggregate.entries,
            enabled_since: aggregate.enabled_since,
            enabled_until: aggregate.enabled_until,
        }
    }
}

/// Merged, size-capped reply for the original caller
#[derive(Debug, Clone, PartialEq)]
pub struct LogsResponse {
    pub connection_id: String,
    pub entries: Vec<LogEntry>,
    pub enabled_since: Option<DateTime<Utc>>,
    pub enabled_until: Option<DateTime<Utc>>,
    pub headers: BTreeMap<String, String>,
}

/// Terminal result of one collection round
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorOutcome {
    /// Merged logs, complete or partial if the deadline cut collection short
    Logs(LogsResponse),
    /// Nothing arrived before the deadline
    TimedOut {
        connection_id: String,
        headers: BTreeMap<String, String>,
    },
}

/// Caller's handle to a running collector
pub struct CollectorHandle {
    /// Feed one partial response per worker into the collector
    pub partials: mpsc::Sender<PartialLogs>,
    /// Resolves exactly once with the round's outcome
    pub outcome: oneshot::Receiver<CollectorOutcome>,
}

/// Start a collector expecting one partial response per client worker
pub fn spawn_collector(request: LogsRequest, expected: usize) -> CollectorHandle {
    let (partials_tx, partials_rx) = mpsc::channel(expected.max(1));
    let (outcome_tx, outcome_rx) = oneshot::channel();

    tokio::spawn(run_collector(request, expected, partials_rx, outcome_tx));

    CollectorHandle {
        partials: partials_tx,
        outcome: outcome_rx,
    }
}

async fn run_collector(
    request: LogsRequest,
    expected: usize,
    mut partials: mpsc::Receiver<PartialLogs>,
    outcome: oneshot::Sender<CollectorOutcome>,
) {
    let deadline = tokio::time::sleep(request.timeout);
    tokio::pin!(deadline);

    let mut merged: Option<PartialLogs> = None;
    let mut remaining = expected;

    let result = loop {
        if remaining == 0 {
            break CollectorOutcome::Logs(into_response(&request, merged));
        }

        tokio::select! {
            partial = partials.recv() => match partial {
                Some(partial) => {
                    if partial.connection_id != request.connection_id {
                        debug!(expected = %request.connection_id, got = %partial.connection_id,
                               "ignoring partial logs for unexpected connection");
                        continue;
                    }
                    merge_into(&mut merged, partial);
                    remaining -= 1;
                }
                // Every sender is gone; answer with what we have
                None => break finish(&request, merged),
            },
            _ = &mut deadline => {
                debug!(connection = %request.connection_id, outstanding = remaining,
                       "log collection deadline elapsed");
                break finish(&request, merged);
            }
        }
    };

    // Terminating here makes replying single-shot; the receiver being gone
    // is the caller's business, not ours.
    let _ = outcome.send(result);
}

/// Partial-success on any data, timeout error on none
fn finish(request: &LogsRequest, merged: Option<PartialLogs>) -> CollectorOutcome {
    match merged {
        Some(_) => CollectorOutcome::Logs(into_response(request, merged)),
        None => CollectorOutcome::TimedOut {
            connection_id: request.connection_id.clone(),
            headers: request.headers.clone(),
        },
    }
}

fn into_response(request: &LogsRequest, merged: Option<PartialLogs>) -> LogsResponse {
    let (entries, enabled_since, enabled_until) = match merged {
        Some(partial) => (partial.entries, partial.enabled_since, partial.enabled_until),
        None => (Vec::new(), None, None),
    };
    LogsResponse {
        connection_id: request.connection_id.clone(),
        entries: truncate_to_size(entries, request.max_log_size_bytes),
        enabled_since,
        enabled_until,
        headers: request.headers.clone(),
    }
}

/// Union of entries, earliest since, latest until
fn merge_into(merged: &mut Option<PartialLogs>, next: PartialLogs) {
    match merged {
        None => *merged = Some(next),
        Some(acc) => {
            acc.entries.extend(next.entries);
            acc.enabled_since = match (acc.enabled_since, next.enabled_since) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            acc.enabled_until = match (acc.enabled_until, next.enabled_until) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{LogCategory, LogLevel, LogType};
    use chrono::Duration as ChronoDuration;

    fn request(timeout_ms: u64) -> LogsRequest {
        let mut headers = BTreeMap::new();
        headers.insert("reply-to".to_string(), "client-7".to_string());
        LogsRequest {
            connection_id: "conn-1".to_string(),
            headers,
            timeout: Duration::from_millis(timeout_ms),
            max_log_size_bytes: 250_000,
        }
    }

    fn partial(worker: usize, entries: usize) -> PartialLogs {
        // Fixed base keeps every entry's serialized length identical, which
        // makes byte budgets in these tests exact.
        let base = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        PartialLogs {
            connection_id: "conn-1".to_string(),
            entries: (0..entries)
                .map(|i| {
                    LogEntry::new(
                        format!("w{}-corr-{}", worker, i),
                        base + ChronoDuration::milliseconds((worker * 100 + i) as i64),
                        LogCategory::Source,
                        LogType::Consumed,
                        LogLevel::Success,
                        "Message was consumed",
                    )
                })
                .collect(),
            enabled_since: Some(base - ChronoDuration::seconds(worker as i64)),
            enabled_until: Some(base + ChronoDuration::seconds(worker as i64)),
        }
    }

    #[tokio::test]
    async fn test_completes_when_all_workers_answer() {
        let handle = spawn_collector(request(5_000), 3);

        for worker in 1..=3 {
            handle.partials.send(partial(worker, 2)).await.unwrap();
        }

        match handle.outcome.await.unwrap() {
            CollectorOutcome::Logs(response) => {
                assert_eq!(response.connection_id, "conn-1");
                assert_eq!(response.entries.len(), 6);
                assert_eq!(response.headers.get("reply-to").unwrap(), "client-7");
                // earliest since, latest until across all workers
                assert!(response.enabled_since.unwrap() < response.enabled_until.unwrap());
            }
            other => panic!("expected logs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_with_partial_data_is_a_success() {
        let handle = spawn_collector(request(100), 3);
        handle.partials.send(partial(1, 2)).await.unwrap();

        match handle.outcome.await.unwrap() {
            CollectorOutcome::Logs(response) => {
                assert_eq!(response.entries.len(), 2);
            }
            other => panic!("expected partial logs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_with_no_data_times_out() {
        let handle = spawn_collector(request(50), 2);

        match handle.outcome.await.unwrap() {
            CollectorOutcome::TimedOut {
                connection_id,
                headers,
            } => {
                assert_eq!(connection_id, "conn-1");
                assert_eq!(headers.get("reply-to").unwrap(), "client-7");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_merged_result_is_truncated_to_budget() {
        let mut req = request(5_000);
        let per_entry = partial(1, 1).entries[0].serialized_len();
        req.max_log_size_bytes = per_entry * 3 + 1;

        let handle = spawn_collector(req, 2);
        handle.partials.send(partial(1, 4)).await.unwrap();
        handle.partials.send(partial(2, 4)).await.unwrap();

        match handle.outcome.await.unwrap() {
            CollectorOutcome::Logs(response) => {
                assert_eq!(response.entries.len(), 3);
                // Newest entries survive
                assert_eq!(response.entries.last().unwrap().correlation_id, "w2-corr-3");
            }
            other => panic!("expected logs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partials_for_other_connections_are_ignored() {
        let handle = spawn_collector(request(5_000), 1);

        let mut stray = partial(1, 2);
        stray.connection_id = "other-conn".to_string();
        handle.partials.send(stray).await.unwrap();
        handle.partials.send(partial(2, 2)).await.unwrap();

        match handle.outcome.await.unwrap() {
            CollectorOutcome::Logs(response) => {
                assert_eq!(response.entries.len(), 2);
                assert!(response.entries.iter().all(|e| e.correlation_id.starts_with("w2")));
            }
            other => panic!("expected logs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_expected_workers_completes_immediately() {
        let handle = spawn_collector(request(5_000), 0);

        match handle.outcome.await.unwrap() {
            CollectorOutcome::Logs(response) => {
                assert!(response.entries.is_empty());
                assert_eq!(response.enabled_since, None);
            }
            other => panic!("expected empty logs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_workers_finish_the_round_early() {
        let handle = spawn_collector(request(5_000), 3);
        handle.partials.send(partial(1, 2)).await.unwrap();
        drop(handle.partials);

        match handle.outcome.await.unwrap() {
            CollectorOutcome::Logs(response) => {
                assert_eq!(response.entries.len(), 2);
            }
            other => panic!("expected partial logs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_merge_keeps_widest_window() {
        let base = Utc::now();
        let mut merged = None;
        let mut a = partial(1, 1);
        a.enabled_since = Some(base);
        a.enabled_until = Some(base + ChronoDuration::seconds(10));
        let mut b = partial(2, 1);
        b.enabled_since = Some(base - ChronoDuration::seconds(5));
        b.enabled_until = Some(base + ChronoDuration::seconds(5));

        merge_into(&mut merged, a);
        merge_into(&mut merged, b);

        let merged = merged.unwrap();
        assert_eq!(merged.enabled_since, Some(base - ChronoDuration::seconds(5)));
        assert_eq!(merged.enabled_until, Some(base + ChronoDuration::seconds(10)));
        assert_eq!(merged.entries.len(), 2);
    }
}
