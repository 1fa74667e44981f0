//! Progress channels for a scrape run
//!
//! Scan progress (scroll loop) and history progress (backfill of new
//! products) are published on separate `watch` channels. Publishing never
//! waits for subscribers; late subscribers see the latest value.

use tokio::sync::watch;

use crate::domain::ProgressSink;

/// Publishing side of one progress channel
pub type ProgressChannel = watch::Sender<u8>;
pub type ProgressReceiver = watch::Receiver<u8>;

#[derive(Debug)]
pub struct ProgressChannels {
    pub scan: ProgressChannel,
    pub history: ProgressChannel,
}

impl ProgressChannels {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scan: watch::channel(0).0,
            history: watch::channel(0).0,
        }
    }

    pub fn subscribe_scan(&self) -> ProgressReceiver {
        self.scan.subscribe()
    }

    pub fn subscribe_history(&self) -> ProgressReceiver {
        self.history.subscribe()
    }

    /// Zero both channels before a new run.
    pub fn reset(&self) {
        self.scan.send_replace(0);
        self.history.send_replace(0);
    }
}

impl Default for ProgressChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for watch::Sender<u8> {
    fn report(&self, percent: u8) {
        self.send_replace(percent.min(100));
    }
}
