//! In-process clipboard
//!
//! Used for headless operation and tests. Clones share the same state, so a
//! caller can keep a handle while the history service owns another.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{ClipboardError, ClipboardSource, Snapshot};
use crate::history::{Entry, ImagePayload, RichText};

#[derive(Debug, Default)]
struct State {
    change_count: u64,
    snapshot: Snapshot,
}

/// Clipboard held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<State>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the content, bumping the change counter
    pub fn set_snapshot(&self, snapshot: Snapshot) {
        let mut state = self.lock();
        state.snapshot = snapshot;
        state.change_count += 1;
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.set_snapshot(Snapshot::text(text));
    }

    pub fn set_rich_text(&self, text: impl Into<String>, rich: RichText) {
        self.set_snapshot(Snapshot::rich_text(text, rich));
    }

    pub fn set_image(&self, payload: ImagePayload) {
        self.set_snapshot(Snapshot::image(payload));
    }

    pub fn clear(&self) {
        self.set_snapshot(Snapshot::default());
    }

    /// Current content without touching the counter
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    pub fn current_change_count(&self) -> u64 {
        self.lock().change_count
    }
}

impl ClipboardSource for MemoryClipboard {
    fn change_count(&mut self) -> Result<u64, ClipboardError> {
        Ok(self.current_change_count())
    }

    fn read_snapshot(&mut self) -> Result<Snapshot, ClipboardError> {
        Ok(self.snapshot())
    }

    fn write(&mut self, entry: &Entry) -> Result<(), ClipboardError> {
        let snapshot = Snapshot::from_entry(entry)?;
        self.set_snapshot(snapshot);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
