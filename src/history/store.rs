//! In-memory ordered entry list
//!
//! The list is a pinned prefix followed by the unpinned remainder, each
//! partition ordered most recently captured or promoted first. Nothing here
//! touches the disk: removed entries are handed back so the caller can
//! release their sidecar files.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::entry::{Entry, EntryContent, EntryId};
use crate::clipboard::Snapshot;
use crate::config::HistoryConfig;

/// Failures reported by store operations; none of them mutate the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Snapshot had no usable content, or only whitespace text
    #[error("Clipboard content is empty")]
    Empty,

    /// Text already present in the history
    #[error("Duplicate of entry {0}")]
    Duplicate(EntryId),

    /// No entry with this id
    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    /// Pinning would exceed the pinned maximum
    #[error("Pin limit reached ({max} pinned entries)")]
    PinCapReached { max: usize },
}

/// Result of a successful capture
#[derive(Debug)]
pub struct Captured {
    pub id: EntryId,
    /// Entries evicted to make room, oldest last
    pub evicted: Vec<Entry>,
}

/// Result of merging legacy pinned entries
#[derive(Debug)]
pub struct Merged {
    pub merged: usize,
    pub evicted: Vec<Entry>,
}

/// Ordered, partitioned clipboard entries
#[derive(Debug, Clone)]
pub struct EntryStore {
    entries: Vec<Entry>,
    max_history_size: usize,
    max_pinned_size: usize,
}

impl EntryStore {
    pub fn new(max_history_size: usize, max_pinned_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_history_size,
            max_pinned_size,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.max_history_size, config.max_pinned_size)
    }

    /// Replace the contents with previously stored entries
    ///
    /// Duplicates are dropped and the list re-partitioned; if the history
    /// limit shrank since the entries were saved, the surplus unpinned
    /// entries are evicted and returned.
    pub fn restore(&mut self, entries: Vec<Entry>) -> Vec<Entry> {
        self.entries = normalize(entries);
        self.evict()
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    pub fn max_pinned_size(&self) -> usize {
        self.max_pinned_size
    }

    /// All entries, pinned first
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn pinned(&self) -> &[Entry] {
        &self.entries[..self.pinned_count()]
    }

    pub fn unpinned(&self) -> &[Entry] {
        &self.entries[self.pinned_count()..]
    }

    pub fn pinned_count(&self) -> usize {
        self.entries.partition_point(Entry::is_pinned)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    fn position(&self, id: EntryId) -> Result<usize, StoreError> {
        self.entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Entry whose plain text equals `text` exactly
    pub fn find_text(&self, text: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.plain_text() == Some(text))
    }

    /// Text entries containing `query`, case-insensitively, in list order
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.plain_text()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Resolve an id prefix; `None` when nothing or more than one entry matches
    pub fn find_by_prefix(&self, prefix: &str) -> Option<EntryId> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return None;
        }

        let mut matches = self
            .entries
            .iter()
            .map(Entry::id)
            .filter(|id| id.to_string().starts_with(&prefix));

        match (matches.next(), matches.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }

    /// Record a clipboard snapshot as the newest unpinned entry
    pub fn capture(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> Result<Captured, StoreError> {
        let content = snapshot.into_content().ok_or(StoreError::Empty)?;

        if let EntryContent::Text { plain, .. } = &content {
            if plain.trim().is_empty() {
                return Err(StoreError::Empty);
            }
            if let Some(existing) = self.find_text(plain) {
                return Err(StoreError::Duplicate(existing.id()));
            }
        }

        // Clamp so stamps never go backwards when the wall clock does
        let created_at = self
            .entries
            .iter()
            .map(Entry::created_at)
            .max()
            .map_or(now, |newest| newest.max(now));

        let entry = Entry::new(content, created_at);
        let id = entry.id();
        let index = self.pinned_count();
        self.entries.insert(index, entry);

        let evicted = self.evict();
        debug!("Captured entry {} ({} evicted)", id, evicted.len());

        Ok(Captured { id, evicted })
    }

    /// Move an entry to the head of its own partition
    pub fn promote(&mut self, id: EntryId) -> Result<&Entry, StoreError> {
        let index = self.position(id)?;
        let entry = self.entries.remove(index);
        let target = if entry.is_pinned() { 0 } else { self.pinned_count() };
        self.entries.insert(target, entry);
        Ok(&self.entries[target])
    }

    /// Flip the pinned flag, moving the entry to the head of its new partition
    ///
    /// Returns the new pinned state.
    pub fn toggle_pin(&mut self, id: EntryId) -> Result<bool, StoreError> {
        let index = self.position(id)?;

        if !self.entries[index].is_pinned() && self.pinned_count() >= self.max_pinned_size {
            return Err(StoreError::PinCapReached {
                max: self.max_pinned_size,
            });
        }

        let mut entry = self.entries.remove(index);
        let pinned = !entry.is_pinned();
        entry.set_pinned(pinned);

        let target = if pinned { 0 } else { self.pinned_count() };
        self.entries.insert(target, entry);

        Ok(pinned)
    }

    pub fn delete(&mut self, id: EntryId) -> Result<Entry, StoreError> {
        let index = self.position(id)?;
        Ok(self.entries.remove(index))
    }

    /// Remove everything, pinned entries included
    pub fn clear(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    /// Merge entries from the legacy pinned list ahead of the existing ones
    ///
    /// Entries whose id or text is already present are skipped. Merged entries
    /// are pinned while the pinned maximum allows; the rest land at the head of
    /// the unpinned partition. Legacy order is preserved within each group.
    pub fn merge_pinned(&mut self, legacy: Vec<Entry>) -> Merged {
        let mut room = self.max_pinned_size.saturating_sub(self.pinned_count());
        let mut pinned = Vec::new();
        let mut unpinned = Vec::new();

        for mut entry in legacy {
            let known = self.get(entry.id()).is_some()
                || entry.plain_text().is_some_and(|t| self.find_text(t).is_some())
                || pinned.iter().chain(unpinned.iter()).any(|e: &Entry| {
                    e.id() == entry.id()
                        || (e.plain_text().is_some() && e.plain_text() == entry.plain_text())
                });
            if known {
                continue;
            }

            if room > 0 {
                room -= 1;
                entry.set_pinned(true);
                pinned.push(entry);
            } else {
                entry.set_pinned(false);
                unpinned.push(entry);
            }
        }

        let merged = pinned.len() + unpinned.len();
        let existing_pinned = self.pinned_count();

        let mut rebuilt = pinned;
        rebuilt.extend(self.entries.drain(..existing_pinned));
        rebuilt.extend(unpinned);
        rebuilt.append(&mut self.entries);
        self.entries = rebuilt;

        Merged {
            merged,
            evicted: self.evict(),
        }
    }

    /// Drop the tail of the unpinned partition until the limit holds
    ///
    /// Pinned entries are never evicted, so the limit is left unenforced when
    /// only pinned entries remain.
    fn evict(&mut self) -> Vec<Entry> {
        let mut evicted = Vec::new();

        while self.entries.len() > self.max_history_size {
            match self.entries.last() {
                Some(last) if !last.is_pinned() => {
                    if let Some(entry) = self.entries.pop() {
                        evicted.push(entry);
                    }
                }
                _ => break,
            }
        }

        evicted
    }
}

/// Drop duplicate ids, then duplicate texts, keeping first occurrences, and
/// move pinned entries ahead of unpinned ones without reordering either group
pub(crate) fn normalize(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen_ids = HashSet::new();
    let mut seen_texts = HashSet::new();

    let unique: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| seen_ids.insert(entry.id()))
        .filter(|entry| match entry.plain_text() {
            Some(text) => seen_texts.insert(text.to_owned()),
            None => true,
        })
        .collect();

    let (mut pinned, unpinned): (Vec<Entry>, Vec<Entry>) =
        unique.into_iter().partition(Entry::is_pinned);
    pinned.extend(unpinned);
    pinned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::entry::test_support::image_payload;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn texts(entries: &[Entry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.plain_text().unwrap_or("<image>").to_string())
            .collect()
    }

    fn capture_text(store: &mut EntryStore, text: &str) -> EntryId {
        store.capture(Snapshot::text(text), Utc::now()).unwrap().id
    }

    fn assert_invariants(store: &EntryStore) {
        let entries = store.entries();
        let pinned = store.pinned_count();
        assert!(entries[..pinned].iter().all(Entry::is_pinned));
        assert!(entries[pinned..].iter().all(|e| !e.is_pinned()));

        let ids: HashSet<_> = entries.iter().map(Entry::id).collect();
        assert_eq!(ids.len(), entries.len());

        let plain: Vec<_> = entries.iter().filter_map(Entry::plain_text).collect();
        let unique: HashSet<_> = plain.iter().collect();
        assert_eq!(unique.len(), plain.len());

        assert!(pinned <= store.max_pinned_size());
        assert!(entries.len() <= store.max_history_size().max(pinned));
    }

    #[test]
    fn test_capture_inserts_newest_first() {
        let mut store = EntryStore::new(10, 3);
        capture_text(&mut store, "A");
        capture_text(&mut store, "B");

        assert_eq!(texts(store.entries()), vec!["B", "A"]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t  \n")]
    fn test_capture_rejects_blank_text(#[case] text: &str) {
        let mut store = EntryStore::new(10, 3);
        let result = store.capture(Snapshot::text(text), Utc::now());

        assert!(matches!(result, Err(StoreError::Empty)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_capture_rejects_empty_snapshot() {
        let mut store = EntryStore::new(10, 3);
        assert!(matches!(
            store.capture(Snapshot::default(), Utc::now()),
            Err(StoreError::Empty)
        ));
    }

    #[test]
    fn test_capture_rejects_duplicate_text_anywhere() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        capture_text(&mut store, "B");
        store.toggle_pin(a).unwrap();

        let result = store.capture(Snapshot::text("A"), Utc::now());
        assert_eq!(result.unwrap_err(), StoreError::Duplicate(a));
        assert_eq!(texts(store.entries()), vec!["A", "B"]);
    }

    #[test]
    fn test_dedup_is_exact_match() {
        let mut store = EntryStore::new(10, 3);
        capture_text(&mut store, "A");
        capture_text(&mut store, "A ");
        capture_text(&mut store, "a");

        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_images_are_never_deduplicated() {
        let mut store = EntryStore::new(10, 3);
        store.capture(Snapshot::image(image_payload(2)), Utc::now()).unwrap();
        store.capture(Snapshot::image(image_payload(2)), Utc::now()).unwrap();

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_capture_goes_below_pinned_prefix() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        store.toggle_pin(a).unwrap();
        capture_text(&mut store, "B");

        assert_eq!(texts(store.entries()), vec!["A", "B"]);
        assert!(store.entries()[0].is_pinned());
    }

    #[test]
    fn test_created_at_never_decreases() {
        let mut store = EntryStore::new(10, 3);
        let later = Utc::now();
        let earlier = later - chrono::Duration::seconds(30);

        store.capture(Snapshot::text("first"), later).unwrap();
        let second = store.capture(Snapshot::text("second"), earlier).unwrap().id;

        assert_eq!(store.get(second).unwrap().created_at(), later);
    }

    #[test]
    fn test_eviction_removes_oldest_unpinned() {
        let mut store = EntryStore::new(3, 2);
        let a = capture_text(&mut store, "A");
        capture_text(&mut store, "B");
        store.toggle_pin(a).unwrap();
        capture_text(&mut store, "C");

        let captured = store.capture(Snapshot::text("D"), Utc::now()).unwrap();
        assert_eq!(texts(&captured.evicted), vec!["B"]);
        assert_eq!(texts(store.entries()), vec!["A", "D", "C"]);
    }

    #[test]
    fn test_eviction_never_removes_pinned() {
        let mut store = EntryStore::new(2, 2);
        let a = capture_text(&mut store, "A");
        let b = capture_text(&mut store, "B");
        store.toggle_pin(a).unwrap();
        store.toggle_pin(b).unwrap();

        let captured = store.capture(Snapshot::text("C"), Utc::now()).unwrap();

        // The newcomer is the only unpinned entry, so it goes
        assert_eq!(texts(&captured.evicted), vec!["C"]);
        assert_eq!(texts(store.entries()), vec!["B", "A"]);
    }

    #[test]
    fn test_promote_unpinned_moves_to_unpinned_head() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        let b = capture_text(&mut store, "B");
        capture_text(&mut store, "C");
        store.toggle_pin(b).unwrap();

        let promoted = store.promote(a).unwrap().id();
        assert_eq!(promoted, a);
        assert_eq!(texts(store.entries()), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_promote_pinned_moves_to_pinned_head() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        let b = capture_text(&mut store, "B");
        capture_text(&mut store, "C");
        store.toggle_pin(a).unwrap();
        store.toggle_pin(b).unwrap();
        assert_eq!(texts(store.entries()), vec!["B", "A", "C"]);

        store.promote(a).unwrap();
        assert_eq!(texts(store.entries()), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut store = EntryStore::new(10, 3);
        capture_text(&mut store, "A");
        let missing = EntryId::new();

        assert_eq!(store.promote(missing).unwrap_err(), StoreError::NotFound(missing));
        assert_eq!(store.toggle_pin(missing).unwrap_err(), StoreError::NotFound(missing));
        assert_eq!(store.delete(missing).unwrap_err(), StoreError::NotFound(missing));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_pin_cap() {
        let mut store = EntryStore::new(10, 2);
        let ids: Vec<_> = ["A", "B", "C"].iter().map(|t| capture_text(&mut store, t)).collect();

        assert!(store.toggle_pin(ids[0]).unwrap());
        assert!(store.toggle_pin(ids[1]).unwrap());
        let before = store.entries().to_vec();

        assert_eq!(
            store.toggle_pin(ids[2]).unwrap_err(),
            StoreError::PinCapReached { max: 2 }
        );
        assert_eq!(store.entries(), before.as_slice());

        // Unpinning is always allowed at the cap
        assert!(!store.toggle_pin(ids[0]).unwrap());
        assert!(store.toggle_pin(ids[2]).unwrap());
    }

    #[test]
    fn test_unpin_moves_to_unpinned_head() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        capture_text(&mut store, "B");
        capture_text(&mut store, "C");
        store.toggle_pin(a).unwrap();
        assert_eq!(texts(store.entries()), vec!["A", "C", "B"]);

        store.toggle_pin(a).unwrap();
        assert_eq!(texts(store.entries()), vec!["A", "C", "B"]);
        assert_eq!(store.pinned_count(), 0);
    }

    #[test]
    fn test_partition_accessors() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        capture_text(&mut store, "B");
        store.toggle_pin(a).unwrap();

        assert_eq!(texts(store.pinned()), vec!["A"]);
        assert_eq!(texts(store.unpinned()), vec!["B"]);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");
        let b = capture_text(&mut store, "B");
        store.toggle_pin(b).unwrap();

        assert_eq!(store.delete(a).unwrap().id(), a);
        assert_eq!(texts(store.entries()), vec!["B"]);

        let cleared = store.clear();
        assert_eq!(cleared.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut store = EntryStore::new(10, 3);
        capture_text(&mut store, "Hello World");
        capture_text(&mut store, "goodbye");
        store.capture(Snapshot::image(image_payload(1)), Utc::now()).unwrap();

        assert_eq!(texts(&store.search("WORLD").into_iter().cloned().collect::<Vec<_>>()), vec!["Hello World"]);
        assert_eq!(store.search("o").len(), 2);
    }

    #[test]
    fn test_find_by_prefix() {
        let mut store = EntryStore::new(10, 3);
        let a = capture_text(&mut store, "A");

        let full = a.to_string();
        assert_eq!(store.find_by_prefix(&full[..8]), Some(a));
        assert_eq!(store.find_by_prefix(&full.to_uppercase()), Some(a));
        assert_eq!(store.find_by_prefix(""), None);
        assert_eq!(store.find_by_prefix("zzzz"), None);
    }

    #[test]
    fn test_spec_walkthrough() {
        let mut store = EntryStore::new(5, 3);
        let a = capture_text(&mut store, "A");
        capture_text(&mut store, "B");
        assert_eq!(texts(store.entries()), vec!["B", "A"]);

        store.toggle_pin(a).unwrap();
        assert_eq!(texts(store.entries()), vec!["A", "B"]);

        assert!(store.capture(Snapshot::text("A"), Utc::now()).is_err());
        assert_eq!(store.len(), 2);

        let mut evicted = Vec::new();
        for letter in 'C'..='Z' {
            let captured = store.capture(Snapshot::text(letter.to_string()), Utc::now()).unwrap();
            evicted.extend(captured.evicted);
        }

        assert_eq!(evicted[0].plain_text(), Some("B"));
        assert_eq!(store.len(), 5);
        assert!(store.get(a).unwrap().is_pinned());
        assert_eq!(texts(store.entries()), vec!["A", "Z", "Y", "X", "W"]);
    }

    #[test]
    fn test_restore_normalizes_and_evicts() {
        let now = Utc::now();
        let text = |t: &str, pinned: bool| {
            Entry::restore(
                EntryId::new(),
                EntryContent::Text {
                    plain: t.to_string(),
                    rich: None,
                },
                now,
                pinned,
            )
        };

        let first = text("A", false);
        let copy_of_first = first.clone();
        let entries = vec![first, text("B", true), copy_of_first, text("A", false), text("C", false)];

        let mut store = EntryStore::new(2, 3);
        let evicted = store.restore(entries);

        assert_eq!(texts(store.entries()), vec!["B", "A"]);
        assert_eq!(texts(&evicted), vec!["C"]);
    }

    #[test]
    fn test_merge_pinned_skips_known_and_respects_cap() {
        let mut store = EntryStore::new(10, 2);
        let existing = capture_text(&mut store, "existing");
        let same_id = store.get(existing).unwrap().clone();

        let legacy_text = |t: &str| {
            Entry::restore(
                EntryId::new(),
                EntryContent::Text {
                    plain: t.to_string(),
                    rich: None,
                },
                Utc::now(),
                true,
            )
        };
        let legacy = vec![
            legacy_text("one"),
            same_id,
            legacy_text("existing"),
            legacy_text("two"),
            legacy_text("three"),
            legacy_text("one"),
        ];

        let merged = store.merge_pinned(legacy);

        assert_eq!(merged.merged, 3);
        assert!(merged.evicted.is_empty());
        assert_eq!(texts(store.entries()), vec!["one", "two", "three", "existing"]);
        assert_eq!(store.pinned_count(), 2);
        assert_invariants(&store);
    }

    #[test]
    fn test_merge_pinned_twice_is_a_no_op() {
        let mut store = EntryStore::new(10, 5);
        let legacy = vec![Entry::restore(
            EntryId::new(),
            EntryContent::Text {
                plain: "legacy".to_string(),
                rich: None,
            },
            Utc::now(),
            true,
        )];

        assert_eq!(store.merge_pinned(legacy.clone()).merged, 1);
        let after_first = store.entries().to_vec();
        assert_eq!(store.merge_pinned(legacy).merged, 0);
        assert_eq!(store.entries(), after_first.as_slice());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Capture(u8),
        CaptureImage,
        Promote(usize),
        TogglePin(usize),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u8..30).prop_map(Op::Capture),
            1 => Just(Op::CaptureImage),
            1 => (0usize..40).prop_map(Op::Promote),
            2 => (0usize..40).prop_map(Op::TogglePin),
            1 => (0usize..40).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_for_any_sequence(ops in proptest::collection::vec(op_strategy(), 1..120)) {
            let mut store = EntryStore::new(8, 3);

            for op in ops {
                let pick = |store: &EntryStore, i: usize| {
                    let entries = store.entries();
                    (!entries.is_empty()).then(|| entries[i % entries.len()].id())
                };

                match op {
                    Op::Capture(n) => {
                        let before = store.len();
                        let text = format!("text {}", n);
                        let duplicate = store.find_text(&text).is_some();
                        let result = store.capture(Snapshot::text(text), Utc::now());
                        if duplicate {
                            prop_assert!(result.is_err());
                            prop_assert_eq!(store.len(), before);
                        }
                    }
                    Op::CaptureImage => {
                        store.capture(Snapshot::image(image_payload(1)), Utc::now()).unwrap();
                    }
                    Op::Promote(i) => {
                        if let Some(id) = pick(&store, i) {
                            store.promote(id).unwrap();
                        }
                    }
                    Op::TogglePin(i) => {
                        if let Some(id) = pick(&store, i) {
                            let pinned_before: Vec<_> = store.pinned().iter().map(Entry::id).collect();
                            match store.toggle_pin(id) {
                                Ok(_) => {}
                                Err(StoreError::PinCapReached { .. }) => {
                                    let pinned_after: Vec<_> = store.pinned().iter().map(Entry::id).collect();
                                    prop_assert_eq!(pinned_before, pinned_after);
                                }
                                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                            }
                        }
                    }
                    Op::Delete(i) => {
                        if let Some(id) = pick(&store, i) {
                            store.delete(id).unwrap();
                        }
                    }
                }

                assert_invariants(&store);
            }
        }

        #[test]
        fn prop_eviction_takes_unpinned_tail(count in 1usize..40, pins in 0usize..3) {
            let mut store = EntryStore::new(5, 3);
            let mut pinned_ids = Vec::new();
            for i in 0..pins {
                let id = capture_text(&mut store, &format!("pinned {}", i));
                store.toggle_pin(id).unwrap();
                pinned_ids.push(id);
            }

            for i in 0..count {
                let tail = store.unpinned().last().map(Entry::id);
                let full = store.len() == store.max_history_size();
                let captured = store.capture(Snapshot::text(format!("item {}", i)), Utc::now()).unwrap();

                if full {
                    prop_assert_eq!(captured.evicted.len(), 1);
                    prop_assert_eq!(Some(captured.evicted[0].id()), tail);
                } else {
                    prop_assert!(captured.evicted.is_empty());
                }
            }

            prop_assert_eq!(store.len(), (pins + count).min(5));
            for id in pinned_ids {
                prop_assert!(store.get(id).is_some_and(Entry::is_pinned));
            }
        }
    }
}
