//! Log forwarding to an external collector
//!
//! Mirrors entries to a downstream log collector instead of storing them.
//! A single `LogShipper` per registry owns the UDP socket and a drain
//! thread; each `ForwardingLogger` tags its records with its connection id
//! and hands them to the shipper through a bounded channel. Shipping is
//! best-effort telemetry: a full buffer drops the record, an I/O failure
//! drops the datagram, and neither ever reaches the message path.
//!
//! Wire format, one JSON line per record:
//! `[tag, {"secs": …, "nanos": …}, {flat string record}]`

use std::collections::BTreeMap;
use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, trace, warn};

use crate::config::ForwardConfig;
use crate::connection::{ConnectionFailure, LogInfo};
use crate::entry::{LogCategory, LogEntry, LogLevel, LogType};
use crate::error::{LogError, Result};
use crate::templates::{self, MessageSet};

/// One record on its way to the collector
#[derive(Debug)]
struct WireRecord {
    tag: String,
    secs: i64,
    nanos: u32,
    fields: BTreeMap<String, String>,
}

enum ShipperMessage {
    Record(WireRecord),
    Flush(SyncSender<()>),
}

/// Owns the collector socket and the drain thread
///
/// Shared by every forwarding logger of a registry.
pub struct LogShipper {
    tx: SyncSender<ShipperMessage>,
}

impl LogShipper {
    /// Bind a local socket, connect it to the collector and start draining
    pub fn new(config: &ForwardConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone();
        let addr = endpoint
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| LogError::CollectorEndpoint {
                endpoint: endpoint.clone(),
            })?;

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| LogError::CollectorBind {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        socket.connect(addr).map_err(|e| LogError::CollectorBind {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let (tx, rx) = mpsc::sync_channel::<ShipperMessage>(config.buffer_capacity);

        thread::spawn(move || run_shipper(rx, socket));

        Ok(Self { tx })
    }

    /// Queue a record without blocking
    ///
    /// A full buffer drops the record (best-effort). A disconnected drain
    /// thread is a real fault and is reported to the caller.
    fn emit(&self, record: WireRecord) -> Result<()> {
        match self.tx.try_send(ShipperMessage::Record(record)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("forward buffer full, dropping log record");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(LogError::ShipperClosed),
        }
    }

    /// Wait until everything queued so far has been sent
    ///
    /// Returns false if the drain thread is gone or did not finish in time.
    pub fn flush(&self, wait: Duration) -> bool {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if self.tx.send(ShipperMessage::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv_timeout(wait).is_ok()
    }
}

/// Drain loop; runs until every shipper handle is dropped
fn run_shipper(rx: mpsc::Receiver<ShipperMessage>, socket: UdpSocket) {
    for message in rx {
        match message {
            ShipperMessage::Record(record) => {
                let line = json!([
                    record.tag,
                    { "secs": record.secs, "nanos": record.nanos },
                    record.fields
                ]);
                if let Err(e) = socket.send(line.to_string().as_bytes()) {
                    trace!(error = %e, "failed to ship log record");
                }
            }
            ShipperMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

/// Logger that forwards every permitted entry to the external collector
///
/// Retains nothing in memory: `entries()` is always empty and `clear()`
/// is a no-op.
pub struct ForwardingLogger {
    shipper: Arc<LogShipper>,
    tag: String,
    connection_id: String,
    category: LogCategory,
    kind: LogType,
    address: Option<String>,
    levels: Vec<LogLevel>,
    instance_id: Option<String>,
    context: BTreeMap<String, String>,
    flush_wait: Duration,
    templates: MessageSet,
}

impl ForwardingLogger {
    pub fn new(
        shipper: Arc<LogShipper>,
        config: &ForwardConfig,
        connection_id: impl Into<String>,
        category: LogCategory,
        kind: LogType,
        address: Option<String>,
    ) -> Self {
        let connection_id = connection_id.into();
        Self {
            shipper,
            tag: format!("{}:{}", config.tag_prefix, connection_id),
            connection_id,
            category,
            kind,
            address,
            levels: config.levels.clone(),
            instance_id: config.instance_id.clone(),
            context: config.context.clone(),
            flush_wait: config.flush_wait(),
            templates: templates::defaults(category, kind),
        }
    }

    // === Writes ===

    pub fn success(&self, info: &LogInfo) -> Result<()> {
        self.compose(info, LogLevel::Success, self.templates.success, &[])
    }

    pub fn success_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        self.compose(info, LogLevel::Success, message, args)
    }

    pub fn failure(&self, info: &LogInfo, failure: Option<&ConnectionFailure>) -> Result<()> {
        let rendered = failure
            .map(ConnectionFailure::render)
            .unwrap_or_else(|| "not specified".to_string());
        self.compose(
            info,
            LogLevel::Failure,
            self.templates.failure,
            &[rendered.as_str()],
        )
    }

    pub fn failure_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        self.compose(info, LogLevel::Failure, message, args)
    }

    pub fn exception(&self, info: &LogInfo, failure: Option<&ConnectionFailure>) -> Result<()> {
        let rendered = failure
            .map(ConnectionFailure::render)
            .unwrap_or_else(|| "not specified".to_string());
        self.compose(
            info,
            LogLevel::Failure,
            self.templates.exception,
            &[rendered.as_str()],
        )
    }

    pub fn exception_with(&self, info: &LogInfo, message: &str, args: &[&str]) -> Result<()> {
        self.compose(info, LogLevel::Failure, message, args)
    }

    /// Forward a pre-built entry, subject to the level filter
    pub fn record(&self, entry: LogEntry) -> Result<()> {
        if !self.levels.contains(&entry.level) {
            return Ok(());
        }

        let mut fields = self.context.clone();
        fields.insert("connectionId".into(), self.connection_id.clone());
        fields.insert("level".into(), entry.level.as_str().into());
        fields.insert("category".into(), entry.category.as_str().into());
        fields.insert("type".into(), entry.kind.as_str().into());
        fields.insert("correlationId".into(), entry.correlation_id.clone());
        fields.insert("message".into(), entry.message.clone());
        if let Some(address) = &entry.address {
            fields.insert("address".into(), address.clone());
        }
        if let Some(entity) = &entry.entity {
            fields.insert("entityType".into(), entity.kind.clone());
            fields.insert("entityId".into(), entity.id.clone());
        }
        if let Some(instance_id) = &self.instance_id {
            fields.insert("instanceId".into(), instance_id.clone());
        }

        self.shipper.emit(WireRecord {
            tag: self.tag.clone(),
            secs: entry.timestamp.timestamp(),
            nanos: entry.timestamp.timestamp_subsec_nanos(),
            fields,
        })
    }

    // === Reads ===

    /// Forwarding loggers retain nothing
    pub fn entries(&self) -> Vec<LogEntry> {
        Vec::new()
    }

    // === Lifecycle ===

    pub fn clear(&self) {}

    /// Flush the shipper, waiting up to the configured duration
    pub fn close(&self) {
        if !self.shipper.flush(self.flush_wait) {
            debug!(connection = %self.connection_id, "log shipper did not drain before close");
        }
    }

    // === Internals ===

    fn compose(
        &self,
        info: &LogInfo,
        level: LogLevel,
        template: &str,
        args: &[&str],
    ) -> Result<()> {
        let mut entry = LogEntry::new(
            info.correlation_id.clone(),
            info.timestamp,
            self.category,
            self.kind,
            level,
            templates::format(template, args),
        );
        if let Some(address) = &self.address {
            entry = entry.with_address(address.clone());
        }
        if let Some(entity) = &info.entity {
            entry = entry.with_entity(entity.clone());
        }
        self.record(entry)
    }
}
