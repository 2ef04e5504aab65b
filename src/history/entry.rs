//! Clipboard history entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of an entry; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Entry kind; closed set, part of the on-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Image,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Text => f.write_str("text"),
            EntryKind::Image => f.write_str("image"),
        }
    }
}

/// Encoding of a rich text payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RichTextFormat {
    Rtf,
    Html,
}

impl RichTextFormat {
    /// MIME type used when talking to clipboards
    pub fn mime_type(&self) -> &'static str {
        match self {
            RichTextFormat::Rtf => "text/rtf",
            RichTextFormat::Html => "text/html",
        }
    }
}

/// Formatted representation of a text entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    pub format: RichTextFormat,
    pub data: Vec<u8>,
}

impl RichText {
    pub fn rtf(data: impl Into<Vec<u8>>) -> Self {
        Self {
            format: RichTextFormat::Rtf,
            data: data.into(),
        }
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self {
            format: RichTextFormat::Html,
            data: markup.into().into_bytes(),
        }
    }
}

/// Encoded image held by an image entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// PNG-encoded bytes, written verbatim to the sidecar file
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImagePayload {
    /// Wrap PNG bytes, reading the dimensions from the header
    pub fn from_png(png: Vec<u8>) -> Result<Self, image::ImageError> {
        let (width, height) = image::ImageReader::with_format(
            std::io::Cursor::new(&png),
            image::ImageFormat::Png,
        )
        .into_dimensions()?;

        Ok(Self { png, width, height })
    }

    /// Size of the encoded payload in bytes
    pub fn size(&self) -> usize {
        self.png.len()
    }
}

/// Image state of an image entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Loaded(ImagePayload),
    /// Sidecar was missing or undecodable at load time
    Missing,
}

/// Content of an entry; the variant decides the kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    Text {
        plain: String,
        rich: Option<RichText>,
    },
    Image(ImageState),
}

impl EntryContent {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryContent::Text { .. } => EntryKind::Text,
            EntryContent::Image(_) => EntryKind::Image,
        }
    }
}

/// One captured clipboard snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    id: EntryId,
    content: EntryContent,
    created_at: DateTime<Utc>,
    pinned: bool,
    /// Sidecar name recorded on disk when it differs from `{id}.png`
    image_file: Option<String>,
}

impl Entry {
    /// Create an unpinned entry with a fresh id
    pub fn new(content: EntryContent, created_at: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            content,
            created_at,
            pinned: false,
            image_file: None,
        }
    }

    /// Rebuild an entry from stored fields
    pub fn restore(
        id: EntryId,
        content: EntryContent,
        created_at: DateTime<Utc>,
        pinned: bool,
    ) -> Self {
        Self {
            id,
            content,
            created_at,
            pinned,
            image_file: None,
        }
    }

    /// Point an image entry at the sidecar its stored record names
    pub(crate) fn with_image_file_name(mut self, name: String) -> Self {
        if matches!(self.content, EntryContent::Image(_)) && name != sidecar_file_name(self.id) {
            self.image_file = Some(name);
        }
        self
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.content.kind()
    }

    pub fn content(&self) -> &EntryContent {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub(crate) fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    /// Plain text of a text entry; the dedup key
    pub fn plain_text(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Text { plain, .. } => Some(plain),
            EntryContent::Image(_) => None,
        }
    }

    pub fn rich_text(&self) -> Option<&RichText> {
        match &self.content {
            EntryContent::Text { rich, .. } => rich.as_ref(),
            EntryContent::Image(_) => None,
        }
    }

    /// Loaded image payload, if any
    pub fn image(&self) -> Option<&ImagePayload> {
        match &self.content {
            EntryContent::Image(ImageState::Loaded(payload)) => Some(payload),
            _ => None,
        }
    }

    /// Sidecar file name for image entries
    ///
    /// New entries use `{id}.png`; loaded entries keep whatever name their
    /// record referenced.
    pub fn image_file_name(&self) -> Option<String> {
        match self.content {
            EntryContent::Image(_) => Some(
                self.image_file
                    .clone()
                    .unwrap_or_else(|| sidecar_file_name(self.id)),
            ),
            EntryContent::Text { .. } => None,
        }
    }

    /// Single-line preview for listings
    pub fn preview(&self, max_chars: usize) -> String {
        match &self.content {
            EntryContent::Text { plain, .. } => {
                let line: String = plain
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                if line.chars().count() > max_chars {
                    let cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
                    format!("{}…", cut)
                } else {
                    line
                }
            }
            EntryContent::Image(ImageState::Loaded(payload)) => {
                format!("[image {}x{}]", payload.width, payload.height)
            }
            EntryContent::Image(ImageState::Missing) => "[image unavailable]".to_string(),
        }
    }
}

/// Deterministic sidecar name for an entry id
pub fn sidecar_file_name(id: EntryId) -> String {
    format!("{}.png", id)
}
