//! Clipboard abstraction layer
//!
//! The history only ever reads a change counter and a snapshot from the
//! clipboard, and writes an entry back when it is promoted. This module
//! provides the trait for that seam, an in-process implementation and the
//! system clipboard implementation.

use thiserror::Error;

use crate::history::{Entry, EntryContent, ImagePayload, ImageState, RichText};

pub mod memory;
pub mod system;

pub use memory::MemoryClipboard;
pub use system::SystemClipboard;

/// Maximum encoded image size accepted from the clipboard (8MB)
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

/// A single read of the clipboard's current formats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub rich_text: Option<RichText>,
    pub plain_text: Option<String>,
    pub image: Option<ImagePayload>,
}

impl Snapshot {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            plain_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn rich_text(text: impl Into<String>, rich: RichText) -> Self {
        Self {
            rich_text: Some(rich),
            plain_text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(payload: ImagePayload) -> Self {
        Self {
            image: Some(payload),
            ..Self::default()
        }
    }

    /// True when no format was readable
    pub fn is_empty(&self) -> bool {
        self.rich_text.is_none() && self.plain_text.is_none() && self.image.is_none()
    }

    /// Pick one representation: rich-bearing text, then plain text, then image
    ///
    /// Text is returned as read, even when blank; rejecting blank text is the
    /// store's job.
    pub fn into_content(self) -> Option<EntryContent> {
        match (self.rich_text, self.plain_text, self.image) {
            (Some(rich), Some(plain), _) => Some(EntryContent::Text {
                plain,
                rich: Some(rich),
            }),
            (None, Some(plain), _) => Some(EntryContent::Text { plain, rich: None }),
            (_, None, Some(image)) => Some(EntryContent::Image(ImageState::Loaded(image))),
            (_, None, None) => None,
        }
    }

    /// Snapshot that reproduces an entry's content
    pub fn from_entry(entry: &Entry) -> Result<Self, ClipboardError> {
        match entry.content() {
            EntryContent::Text { plain, rich } => Ok(Self {
                rich_text: rich.clone(),
                plain_text: Some(plain.clone()),
                image: None,
            }),
            EntryContent::Image(ImageState::Loaded(payload)) => Ok(Self::image(payload.clone())),
            EntryContent::Image(ImageState::Missing) => Err(ClipboardError::NoContent),
        }
    }
}

/// Clipboard source consumed by the poller and by promotion
pub trait ClipboardSource: Send {
    /// Monotonically increasing counter; changes whenever the content changes
    fn change_count(&mut self) -> Result<u64, ClipboardError>;

    /// Best-effort read of the current formats
    fn read_snapshot(&mut self) -> Result<Snapshot, ClipboardError>;

    /// Put an entry's content on the clipboard
    fn write(&mut self, entry: &Entry) -> Result<(), ClipboardError>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Platform-specific error
    #[error("Platform error: {0}")]
    Platform(String),

    /// Content too large
    #[error("Content too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// Image could not be encoded or decoded
    #[error("Image conversion failed: {0}")]
    Image(#[from] image::ImageError),

    /// No content available
    #[error("No clipboard content available")]
    NoContent,
}
