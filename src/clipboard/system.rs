//! System clipboard backed by arboard
//!
//! arboard exposes no change counter, so one is derived: each call to
//! `change_count` fingerprints the current content and bumps a local counter
//! whenever the fingerprint differs from the previous one.

use std::borrow::Cow;

use arboard::{Clipboard, ImageData};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder, ImageFormat};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{ClipboardError, ClipboardSource, Snapshot, MAX_IMAGE_BYTES};
use crate::history::{Entry, EntryContent, ImagePayload, ImageState, RichText, RichTextFormat};

/// System clipboard provider
#[derive(Debug, Default)]
pub struct SystemClipboard {
    counter: u64,
    fingerprint: Option<String>,
}

impl SystemClipboard {
    /// Create a provider, checking that the clipboard is reachable
    pub fn new() -> Result<Self, ClipboardError> {
        open()?;
        Ok(Self::default())
    }

    fn current_fingerprint(clipboard: &mut Clipboard) -> Option<String> {
        let mut hasher = Sha256::new();

        if let Ok(text) = clipboard.get_text() {
            hasher.update(b"text:");
            hasher.update(text.as_bytes());
        } else if let Ok(image) = clipboard.get_image() {
            hasher.update(b"image:");
            hasher.update((image.width as u64).to_le_bytes());
            hasher.update((image.height as u64).to_le_bytes());
            hasher.update(&image.bytes);
        } else {
            return None;
        }

        Some(hex::encode(hasher.finalize()))
    }
}

fn open() -> Result<Clipboard, ClipboardError> {
    Clipboard::new().map_err(|e| ClipboardError::Platform(format!("Failed to open clipboard: {}", e)))
}

fn encode_rgba_to_png(width: usize, height: usize, rgba: &[u8]) -> Result<Vec<u8>, ClipboardError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        rgba,
        width as u32,
        height as u32,
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// Pair plain text with the HTML flavor offered next to it, if any
fn text_snapshot(text: String, html: Option<String>) -> Snapshot {
    match html {
        Some(html) if !html.trim().is_empty() => Snapshot::rich_text(text, RichText::html(html)),
        _ => Snapshot::text(text),
    }
}

fn decode_png_rgba(png: &[u8]) -> Result<(usize, usize, Vec<u8>), ClipboardError> {
    let rgba = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width as usize, height as usize, rgba.into_raw()))
}

impl ClipboardSource for SystemClipboard {
    fn change_count(&mut self) -> Result<u64, ClipboardError> {
        let mut clipboard = open()?;
        let fingerprint = Self::current_fingerprint(&mut clipboard);

        if fingerprint != self.fingerprint {
            self.fingerprint = fingerprint;
            self.counter += 1;
        }

        Ok(self.counter)
    }

    fn read_snapshot(&mut self) -> Result<Snapshot, ClipboardError> {
        let mut clipboard = open()?;

        if let Ok(text) = clipboard.get_text() {
            let html = clipboard.get().html().ok();
            return Ok(text_snapshot(text, html));
        }

        match clipboard.get_image() {
            Ok(image) => {
                let png = encode_rgba_to_png(image.width, image.height, &image.bytes)?;
                if png.len() > MAX_IMAGE_BYTES {
                    return Err(ClipboardError::TooLarge {
                        size: png.len(),
                        max: MAX_IMAGE_BYTES,
                    });
                }
                Ok(Snapshot::image(ImagePayload {
                    png,
                    width: image.width as u32,
                    height: image.height as u32,
                }))
            }
            Err(arboard::Error::ContentNotAvailable) => Ok(Snapshot::default()),
            Err(e) => Err(ClipboardError::Platform(format!(
                "Failed to read clipboard: {}",
                e
            ))),
        }
    }

    fn write(&mut self, entry: &Entry) -> Result<(), ClipboardError> {
        let mut clipboard = open()?;

        let result = match entry.content() {
            EntryContent::Text { plain, rich } => match rich {
                Some(rich) if rich.format == RichTextFormat::Html => {
                    let html = String::from_utf8_lossy(&rich.data).into_owned();
                    clipboard.set_html(html.as_str(), Some(plain.as_str()))
                }
                Some(rich) => {
                    debug!("{} is not writable here, writing plain text", rich.format.mime_type());
                    clipboard.set_text(plain.as_str())
                }
                None => clipboard.set_text(plain.as_str()),
            },
            EntryContent::Image(ImageState::Loaded(payload)) => {
                let (width, height, bytes) = decode_png_rgba(&payload.png)?;
                clipboard.set_image(ImageData {
                    width,
                    height,
                    bytes: Cow::Owned(bytes),
                })
            }
            EntryContent::Image(ImageState::Missing) => return Err(ClipboardError::NoContent),
        };

        result.map_err(|e| ClipboardError::Platform(format!("Failed to write clipboard: {}", e)))
    }

    fn name(&self) -> &str {
        "system"
    }
}
