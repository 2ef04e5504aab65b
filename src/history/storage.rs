//! Disk persistence for clipboard history
//!
//! Layout under the data directory:
//!
//! - `history.json`: the history document (see [`super::format`])
//! - `images/{id}.png`: one sidecar per image entry
//! - `pinned.json`: legacy pinned list, merged once and then removed
//!
//! Documents and sidecars are written to a temporary file in the target
//! directory and renamed into place, so a crash leaves either the old or the
//! new file.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::entry::{Entry, EntryId, EntryKind, ImagePayload, ImageState};
use super::format::{parse_document, EntryRecord, HistoryDocument};
use super::store::normalize;

pub const DOCUMENT_FILE: &str = "history.json";
pub const LEGACY_PINNED_FILE: &str = "pinned.json";
pub const IMAGES_DIR: &str = "images";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Unsupported document version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid record {0}: {1}")]
    InvalidRecord(EntryId, &'static str),

    #[error("Invalid sidecar file name: {0}")]
    InvalidFileName(String),

    #[error("Undecodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Location of the history document and its sidecar directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    images: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let images = root.join(IMAGES_DIR);
        Self { root, images }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self) -> PathBuf {
        self.root.join(DOCUMENT_FILE)
    }

    pub fn legacy_pinned_path(&self) -> PathBuf {
        self.root.join(LEGACY_PINNED_FILE)
    }

    pub fn images_dir(&self) -> &Path {
        &self.images
    }

    pub fn sidecar_path(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        validate_file_name(file_name)?;
        Ok(self.images.join(file_name))
    }

    fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.images)?;
        Ok(())
    }

    /// Write the full ordered list plus any sidecars not yet on disk
    ///
    /// A sidecar that cannot be written is logged and skipped; the document
    /// still references it and the entry degrades on the next load.
    pub fn save(&self, entries: &[Entry]) -> Result<(), StorageError> {
        self.ensure_dirs()?;

        for entry in entries {
            if let (Some(payload), Some(name)) = (entry.image(), entry.image_file_name()) {
                if let Err(e) = self.write_sidecar(&name, payload) {
                    warn!("Failed to write image sidecar {}: {}", name, e);
                }
            }
        }

        let document = HistoryDocument::new(entries);
        let bytes = serde_json::to_vec_pretty(&document)?;
        write_atomic(&self.root, &self.document_path(), &bytes)?;

        debug!("Saved {} entries to {:?}", entries.len(), self.document_path());
        Ok(())
    }

    fn write_sidecar(&self, file_name: &str, payload: &ImagePayload) -> Result<(), StorageError> {
        let path = self.sidecar_path(file_name)?;
        // Entries are immutable, so an existing sidecar is already current
        if path.exists() {
            return Ok(());
        }
        write_atomic(&self.images, &path, &payload.png)
    }

    /// Read the document; a missing document is an empty history
    ///
    /// Records that cannot be turned into entries are skipped, duplicates are
    /// dropped and pinned entries moved to the front.
    pub fn load(&self) -> Result<Vec<Entry>, StorageError> {
        let Some(entries) = self.read_entries(&self.document_path())? else {
            return Ok(Vec::new());
        };
        Ok(normalize(entries))
    }

    /// Entries of the legacy pinned file, if it exists
    pub fn load_legacy_pinned(&self) -> Result<Option<Vec<Entry>>, StorageError> {
        self.read_entries(&self.legacy_pinned_path())
    }

    pub fn remove_legacy_pinned(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.legacy_pinned_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_entries(&self, path: &Path) -> Result<Option<Vec<Entry>>, StorageError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entries = parse_document(&bytes)?
            .into_iter()
            .filter_map(|record| {
                let image = match record.kind {
                    EntryKind::Image => self.load_image(&record),
                    EntryKind::Text => ImageState::Missing,
                };
                match record.into_entry(image) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping stored entry: {}", e);
                        None
                    }
                }
            })
            .collect();

        Ok(Some(entries))
    }

    fn load_image(&self, record: &EntryRecord) -> ImageState {
        let Some(name) = record.image_file_name.as_deref() else {
            warn!("Image entry {} has no sidecar reference", record.id);
            return ImageState::Missing;
        };

        let payload = self
            .sidecar_path(name)
            .and_then(|path| fs::read(path).map_err(StorageError::from))
            .and_then(|png| ImagePayload::from_png(png).map_err(StorageError::from));

        match payload {
            Ok(payload) => ImageState::Loaded(payload),
            Err(e) => {
                warn!("Image for entry {} unavailable ({}): {}", record.id, name, e);
                ImageState::Missing
            }
        }
    }

    /// Remove an entry's sidecar; `Ok(false)` when there was nothing to remove
    pub fn delete_sidecar(&self, entry: &Entry) -> Result<bool, StorageError> {
        let Some(name) = entry.image_file_name() else {
            return Ok(false);
        };

        match fs::remove_file(self.sidecar_path(&name)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete sidecar files not referenced by any of `entries`
    ///
    /// Returns the names removed. Individual delete failures are logged.
    pub fn prune_orphan_sidecars(&self, entries: &[Entry]) -> Result<Vec<String>, StorageError> {
        let referenced: HashSet<String> = entries.iter().filter_map(Entry::image_file_name).collect();

        let dir = match fs::read_dir(&self.images) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = Vec::new();
        for item in dir {
            let item = item?;
            if !item.file_type()?.is_file() {
                continue;
            }

            let name = item.file_name().to_string_lossy().into_owned();
            if referenced.contains(&name) {
                continue;
            }

            match fs::remove_file(item.path()) {
                Ok(()) => {
                    info!("Removed orphaned image: {}", name);
                    removed.push(name);
                }
                Err(e) => warn!("Failed to remove orphaned image {}: {}", name, e),
            }
        }

        Ok(removed)
    }
}

fn validate_file_name(name: &str) -> Result<(), StorageError> {
    let plain = Path::new(name).file_name() == Some(OsStr::new(name));
    if !plain || name.starts_with('.') {
        return Err(StorageError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
