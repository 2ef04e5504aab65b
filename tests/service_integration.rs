//! End-to-end tests: clipboard changes flowing through the running service

use std::time::Duration;

use clipshelf::clipboard::MemoryClipboard;
use clipshelf::config::Config;
use clipshelf::history::{ChangeKind, ClipboardHistory, HistoryEvent, RichText};
use clipshelf::service::HistoryService;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::broadcast::Receiver;
use tokio::time::timeout;

const POLL: Duration = Duration::from_millis(10);

async fn next_event(events: &mut Receiver<HistoryEvent>) -> HistoryEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no history event in time")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_copies_are_recorded_and_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_data_dir(temp_dir.path());
    let clipboard = MemoryClipboard::new();

    let (handle, task) =
        HistoryService::spawn(ClipboardHistory::open(&config), clipboard.clone(), POLL);
    let mut events = handle.subscribe();

    clipboard.set_text("first copy");
    assert_eq!(next_event(&mut events).await.change, ChangeKind::Captured);

    clipboard.set_rich_text("second copy", RichText::rtf(b"{\\rtf1 second copy}".to_vec()));
    assert_eq!(next_event(&mut events).await.change, ChangeKind::Captured);

    // Copying the same text again is not a new entry
    clipboard.set_text("first copy");
    tokio::time::sleep(POLL * 10).await;

    let entries = handle.entries().await.unwrap();
    let texts: Vec<_> = entries.iter().filter_map(|e| e.plain_text()).collect();
    assert_eq!(texts, vec!["second copy", "first copy"]);
    assert!(entries[0].rich_text().is_some());

    let first = entries[1].id();
    assert!(handle.toggle_pin(first).await.unwrap());

    handle.shutdown().await.unwrap();
    let history = task.await.unwrap();
    assert_eq!(history.revision(), 3);
    drop(history);

    let reopened = ClipboardHistory::open(&config);
    let texts: Vec<_> = reopened
        .entries()
        .iter()
        .filter_map(|e| e.plain_text())
        .collect();
    assert_eq!(texts, vec!["first copy", "second copy"]);
    assert!(reopened.get(first).unwrap().is_pinned());
}

#[tokio::test]
async fn test_promoted_entry_lands_on_clipboard() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_data_dir(temp_dir.path());
    let clipboard = MemoryClipboard::new();

    let (handle, task) =
        HistoryService::spawn(ClipboardHistory::open(&config), clipboard.clone(), POLL);
    let mut events = handle.subscribe();

    clipboard.set_text("older");
    next_event(&mut events).await;
    clipboard.set_text("newer");
    next_event(&mut events).await;

    let older = handle.search("older").await.unwrap()[0].id();
    handle.promote(older).await.unwrap();
    assert_eq!(next_event(&mut events).await.change, ChangeKind::Promoted);
    assert_eq!(clipboard.snapshot().plain_text.as_deref(), Some("older"));

    tokio::time::sleep(POLL * 10).await;
    assert!(events.try_recv().is_err());

    handle.shutdown().await.unwrap();
    let history = task.await.unwrap();
    assert_eq!(history.len(), 2);
}
