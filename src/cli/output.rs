//! Plain-text rendering for list output

use chrono::{DateTime, Local, Utc};

use crate::history::Entry;

/// Characters of entry text shown per line
const PREVIEW_CHARS: usize = 60;

/// Leading id characters shown; enough to pass back as a prefix
const SHORT_ID_LEN: usize = 8;

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn entry_line(entry: &Entry) -> String {
    let id = entry.id().to_string();
    format!(
        "{} {} [{}] {}",
        &id[..SHORT_ID_LEN],
        if entry.is_pinned() { "*" } else { " " },
        timestamp(entry.created_at()),
        entry.preview(PREVIEW_CHARS)
    )
}
