//! Clipboard change detection
//!
//! Each tick compares the source's change counter against the last one seen
//! and reads a full snapshot only when it moved. The new counter is adopted
//! before reading, so a change whose snapshot is unusable is not retried.

use tracing::{debug, warn};

use crate::clipboard::{ClipboardSource, Snapshot};

/// Poller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Armed,
}

/// Clipboard change detector
#[derive(Debug)]
pub struct Poller {
    state: PollerState,
    last_change_count: Option<u64>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller {
    pub fn new() -> Self {
        Self {
            state: PollerState::Idle,
            last_change_count: None,
        }
    }

    /// Start monitoring; the first tick afterwards always reads the clipboard
    pub fn arm(&mut self) {
        self.state = PollerState::Armed;
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn last_change_count(&self) -> Option<u64> {
        self.last_change_count
    }

    /// Check the source once, returning a snapshot if the clipboard changed
    pub fn tick(&mut self, source: &mut dyn ClipboardSource) -> Option<Snapshot> {
        if self.state == PollerState::Idle {
            return None;
        }

        let count = match source.change_count() {
            Ok(count) => count,
            Err(e) => {
                debug!("Failed to read {} clipboard change count: {}", source.name(), e);
                return None;
            }
        };

        if self.last_change_count == Some(count) {
            return None;
        }
        self.last_change_count = Some(count);

        match source.read_snapshot() {
            Ok(snapshot) if snapshot.is_empty() => None,
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Failed to read {} clipboard: {}", source.name(), e);
                None
            }
        }
    }

    /// Treat the source's current content as already seen
    ///
    /// Called after writing to the clipboard so our own write is not captured
    /// as a new copy event.
    pub fn adopt(&mut self, source: &mut dyn ClipboardSource) {
        match source.change_count() {
            Ok(count) => self.last_change_count = Some(count),
            Err(e) => debug!("Failed to read {} clipboard change count: {}", source.name(), e),
        }
    }
}
