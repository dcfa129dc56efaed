//! Scanner output channel.
//!
//! Everything the scanner reports to its host (scans from any source, user
//! facing errors, and the close notification) flows through one ordered
//! channel, so the host sees events in the order they were produced.

use tillscan_core::{ScanEvent, ScanSource};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Something the host should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerEvent {
    /// A payload was scanned.
    Scan(ScanEvent),

    /// A user-facing error message.
    Error(String),

    /// The user stopped the scanner.
    Closed,
}

impl ScannerEvent {
    /// The scan, if this is one.
    pub fn as_scan(&self) -> Option<&ScanEvent> {
        match self {
            Self::Scan(event) => Some(event),
            _ => None,
        }
    }
}

/// Sending side, cloned into every producer.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    tx: mpsc::UnboundedSender<ScannerEvent>,
}

impl Emitter {
    pub(crate) fn channel() -> (Self, ScannerEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, ScannerEvents { rx })
    }

    pub(crate) fn scan(&self, event: ScanEvent) {
        info!(text = %event.text, source = %event.source, "scan");
        self.send(ScannerEvent::Scan(event));
    }

    /// Build and emit a scan from raw text; blank text is dropped.
    pub(crate) fn scan_text(&self, raw: &str, source: ScanSource) -> bool {
        match ScanEvent::new(raw, source) {
            Some(event) => {
                self.scan(event);
                true
            }
            None => {
                debug!(%source, "dropped blank payload");
                false
            }
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        self.send(ScannerEvent::Error(message.into()));
    }

    pub(crate) fn closed(&self) {
        self.send(ScannerEvent::Closed);
    }

    fn send(&self, event: ScannerEvent) {
        // Host dropped its receiver; nothing left to notify.
        let _ = self.tx.send(event);
    }
}

/// Receiving side handed to the host.
#[derive(Debug)]
pub struct ScannerEvents {
    rx: mpsc::UnboundedReceiver<ScannerEvent>,
}

impl ScannerEvents {
    /// Wait for the next event. Returns `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<ScannerEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<ScannerEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<ScannerEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
