//! On-disk layout of the history document
//!
//! ```json
//! { "version": 1, "entries": [ { "id": "…", "kind": "text", … } ] }
//! ```
//!
//! Entries are written pinned first, each partition newest first. Image
//! bytes never appear in the document; `imageFileName` points into the
//! sidecar directory instead.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::entry::{Entry, EntryContent, EntryId, EntryKind, ImageState, RichText, RichTextFormat};
use super::storage::StorageError;

/// Current document version
pub const FORMAT_VERSION: u32 = 1;

/// One persisted entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub id: EntryId,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
    /// Base64 of the rich text bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text_format: Option<RichTextFormat>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file_name: Option<String>,
}

impl EntryRecord {
    pub fn from_entry(entry: &Entry) -> Self {
        let rich = entry.rich_text();

        Self {
            id: entry.id(),
            kind: entry.kind(),
            plain_text: entry.plain_text().map(str::to_owned),
            rich_text_blob: rich.map(|r| STANDARD.encode(&r.data)),
            rich_text_format: rich.map(|r| r.format),
            created_at: entry.created_at(),
            pinned: entry.is_pinned(),
            image_file_name: entry.image_file_name(),
        }
    }

    /// Build the in-memory entry; `image` is the sidecar lookup result
    ///
    /// A text record without text is unusable and rejected. A rich text blob
    /// that does not decode is dropped, keeping the plain text.
    pub fn into_entry(self, image: ImageState) -> Result<Entry, StorageError> {
        let content = match self.kind {
            EntryKind::Text => {
                let plain = self
                    .plain_text
                    .ok_or_else(|| StorageError::InvalidRecord(self.id, "text entry without text"))?;

                let rich = self.rich_text_blob.and_then(|blob| {
                    let data = STANDARD.decode(blob).ok()?;
                    Some(RichText {
                        format: self.rich_text_format.unwrap_or(RichTextFormat::Rtf),
                        data,
                    })
                });

                EntryContent::Text { plain, rich }
            }
            EntryKind::Image => EntryContent::Image(image),
        };

        let entry = Entry::restore(self.id, content, self.created_at, self.pinned);
        Ok(match self.image_file_name {
            Some(name) => entry.with_image_file_name(name),
            None => entry,
        })
    }
}

/// Versioned history document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub version: u32,
    pub entries: Vec<EntryRecord>,
}

impl HistoryDocument {
    pub fn new(entries: &[Entry]) -> Self {
        Self {
            version: FORMAT_VERSION,
            entries: entries.iter().map(EntryRecord::from_entry).collect(),
        }
    }
}

/// Versioned document with records left unparsed, so one bad record does not
/// sink the rest
#[derive(Debug, Deserialize)]
struct RawDocument {
    version: u32,
    entries: Vec<serde_json::Value>,
}

/// Anything accepted when reading: the versioned document or a bare record
/// array, as written by older versions and by the legacy pinned file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnyDocument {
    Versioned(RawDocument),
    Bare(Vec<serde_json::Value>),
}

/// Parse a document, returning its records in stored order
///
/// Records that do not match the record layout are logged and skipped.
pub fn parse_document(bytes: &[u8]) -> Result<Vec<EntryRecord>, StorageError> {
    let raw = match serde_json::from_slice::<AnyDocument>(bytes)? {
        AnyDocument::Versioned(doc) if doc.version > FORMAT_VERSION => {
            return Err(StorageError::UnsupportedVersion(doc.version));
        }
        AnyDocument::Versioned(doc) => doc.entries,
        AnyDocument::Bare(records) => records,
    };

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable record #{}: {}", index, e);
                None
            }
        })
        .collect())
}
