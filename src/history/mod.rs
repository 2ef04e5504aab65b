//! Clipboard history management and persistence
//!
//! [`ClipboardHistory`] is the write-through front of the history: every
//! successful mutation of the [`EntryStore`] is followed by releasing the
//! sidecars of removed entries, saving the document, and then broadcasting a
//! [`HistoryEvent`]. Disk failures are logged and absorbed; the in-memory
//! list stays authoritative for the running session.

pub mod entry;
pub mod format;
pub mod storage;
pub mod store;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub use entry::{
    Entry, EntryContent, EntryId, EntryKind, ImagePayload, ImageState, RichText, RichTextFormat,
};
pub use storage::{Storage, StorageError};
pub use store::{EntryStore, StoreError};

use crate::clipboard::{ClipboardSource, Snapshot};
use crate::config::Config;

/// Buffered events per subscriber before it starts lagging
const EVENT_CAPACITY: usize = 64;

/// What a mutation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Captured,
    Promoted,
    PinToggled,
    Deleted,
    Cleared,
    Migrated,
}

/// Change notification; carries no entry data, observers re-read the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEvent {
    /// Increases by one with every notified mutation
    pub revision: u64,
    pub change: ChangeKind,
}

/// Main interface for clipboard history management
pub struct ClipboardHistory {
    store: EntryStore,
    storage: Storage,
    events: broadcast::Sender<HistoryEvent>,
    revision: u64,
}

impl ClipboardHistory {
    /// Open the history described by `config`
    pub fn open(config: &Config) -> Self {
        Self::with_storage(
            EntryStore::from_config(&config.history),
            Storage::new(&config.storage.data_dir),
        )
    }

    /// Load `storage` into `store`, merge the legacy pinned file and prune
    /// orphaned sidecars
    ///
    /// A document that cannot be read yields an empty history. Sidecars are
    /// then left alone, since nothing is known about which ones it referenced.
    pub fn with_storage(mut store: EntryStore, storage: Storage) -> Self {
        let (entries, loaded) = match storage.load() {
            Ok(entries) => (entries, true),
            Err(e) => {
                warn!(
                    "Failed to load history from {:?}, starting empty: {}",
                    storage.document_path(),
                    e
                );
                (Vec::new(), false)
            }
        };
        let evicted = store.restore(entries);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut history = Self {
            store,
            storage,
            events,
            revision: 0,
        };

        if !evicted.is_empty() {
            history.release(evicted);
            history.save();
        }
        history.migrate_legacy_if_present();
        if loaded {
            history.prune_orphan_sidecars();
        }

        info!(
            "Loaded {} entries ({} pinned)",
            history.store.len(),
            history.store.pinned_count()
        );
        history
    }

    /// Register an observer
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Sender side of the notification channel, for handing out subscriptions
    pub fn event_sender(&self) -> broadcast::Sender<HistoryEvent> {
        self.events.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    pub fn pinned(&self) -> &[Entry] {
        self.store.pinned()
    }

    pub fn unpinned(&self) -> &[Entry] {
        self.store.unpinned()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.store.get(id)
    }

    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.store.search(query)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Record a snapshot as a new entry
    pub fn capture(&mut self, snapshot: Snapshot) -> Result<EntryId, StoreError> {
        let captured = self.store.capture(snapshot, Utc::now())?;
        self.release(captured.evicted);
        self.commit(ChangeKind::Captured);
        Ok(captured.id)
    }

    /// Move an entry to the top of its partition and put it on `clipboard`
    ///
    /// A failed clipboard write is logged; the reorder still stands.
    pub fn promote(
        &mut self,
        id: EntryId,
        clipboard: &mut dyn ClipboardSource,
    ) -> Result<(), StoreError> {
        let entry = self.store.promote(id)?.clone();

        if let Err(e) = clipboard.write(&entry) {
            warn!("Failed to write entry {} to the {} clipboard: {}", id, clipboard.name(), e);
        }

        self.commit(ChangeKind::Promoted);
        Ok(())
    }

    /// Pin or unpin an entry; returns the new pinned state
    pub fn toggle_pin(&mut self, id: EntryId) -> Result<bool, StoreError> {
        let pinned = self.store.toggle_pin(id)?;
        self.commit(ChangeKind::PinToggled);
        Ok(pinned)
    }

    pub fn delete(&mut self, id: EntryId) -> Result<(), StoreError> {
        let removed = self.store.delete(id)?;
        self.release(vec![removed]);
        self.commit(ChangeKind::Deleted);
        Ok(())
    }

    /// Remove every entry, pinned ones included, and their sidecars
    pub fn clear(&mut self) {
        let removed = self.store.clear();
        let count = removed.len();
        self.release(removed);
        self.commit(ChangeKind::Cleared);
        info!("History cleared ({} entries removed)", count);
    }

    /// Merge the legacy pinned file into the history, once
    ///
    /// The legacy file is deleted only after the merged history was saved, so
    /// a failed save retries the merge on the next start. Returns the number of
    /// entries merged.
    pub fn migrate_legacy_if_present(&mut self) -> usize {
        let legacy = match self.storage.load_legacy_pinned() {
            Ok(Some(legacy)) => legacy,
            Ok(None) => return 0,
            Err(e) => {
                warn!("Failed to read legacy pinned file, leaving it in place: {}", e);
                return 0;
            }
        };

        let merged = self.store.merge_pinned(legacy);
        self.release(merged.evicted);

        match self.storage.save(self.store.entries()) {
            Ok(()) => {
                if let Err(e) = self.storage.remove_legacy_pinned() {
                    warn!("Failed to remove legacy pinned file: {}", e);
                }
            }
            Err(e) => warn!("Failed to save merged history, keeping legacy pinned file: {}", e),
        }

        info!("Migrated {} legacy pinned entries", merged.merged);
        if merged.merged > 0 {
            self.notify(ChangeKind::Migrated);
        }
        merged.merged
    }

    /// Delete sidecar files no entry refers to; returns the names removed
    pub fn prune_orphan_sidecars(&self) -> Vec<String> {
        self.storage
            .prune_orphan_sidecars(self.store.entries())
            .unwrap_or_else(|e| {
                warn!("Failed to prune orphaned images: {}", e);
                Vec::new()
            })
    }

    fn release(&self, removed: Vec<Entry>) {
        for entry in removed {
            match self.storage.delete_sidecar(&entry) {
                Ok(true) => debug!("Removed image sidecar for entry {}", entry.id()),
                Ok(false) => {}
                Err(e) => warn!("Failed to remove image sidecar for entry {}: {}", entry.id(), e),
            }
        }
    }

    fn save(&self) {
        if let Err(e) = self.storage.save(self.store.entries()) {
            warn!("Failed to save history to {:?}: {}", self.storage.document_path(), e);
        }
    }

    fn notify(&mut self, change: ChangeKind) {
        self.revision += 1;
        // No receivers is not an error
        let _ = self.events.send(HistoryEvent {
            revision: self.revision,
            change,
        });
    }

    fn commit(&mut self, change: ChangeKind) {
        self.save();
        self.notify(change);
    }
}
