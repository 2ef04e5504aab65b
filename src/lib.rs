//! # Clipshelf
//!
//! Clipboard history with pinning, persistence, and a change-driven poller.
//!
//! The [`history::ClipboardHistory`] keeps an ordered list of copied entries
//! (pinned ahead of unpinned, newest first within each group), saves it to a
//! JSON document with PNG sidecars, and notifies observers after every change.
//! [`service::HistoryService`] runs it alongside a [`poller::Poller`] on a
//! single tokio task.

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod history;
pub mod poller;
pub mod service;

pub use config::Config;

/// Result type alias for Clipshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Clipshelf operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Clipboard operation error
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] clipboard::ClipboardError),

    /// History rejected the operation
    #[error("History error: {0}")]
    Store(#[from] history::StoreError),

    /// History could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] history::StorageError),

    /// Service error
    #[error("Service error: {0}")]
    Service(#[from] service::ServiceError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
