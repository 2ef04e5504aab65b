use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::clipboard::SystemClipboard;
use crate::config::Config;
use crate::history::format::EntryRecord;
use crate::history::{ClipboardHistory, Entry, EntryId};
use crate::service::HistoryService;

mod output;

#[derive(Parser)]
#[command(name = "clipshelf")]
#[command(about = "Clipboard history with pinned entries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Record clipboard changes until interrupted")]
    Watch,

    #[command(about = "Show clipboard history")]
    List {
        #[arg(long, conflicts_with = "unpinned")]
        pinned: bool,

        #[arg(long)]
        unpinned: bool,

        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    #[command(about = "Find text entries containing a string")]
    Search { query: String },

    #[command(about = "Put an entry back on the clipboard")]
    Copy { id: String },

    #[command(about = "Pin or unpin an entry")]
    Pin { id: String },

    #[command(about = "Delete an entry")]
    Delete { id: String },

    #[command(about = "Delete every entry, pinned ones included")]
    Clear,

    #[command(about = "Show history and build information")]
    Status,

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Generate example configuration")]
    Init {
        #[arg(long)]
        force: bool,
    },

    #[command(about = "Validate configuration")]
    Validate,
}

pub struct CliHandler {
    config: Config,
    config_path: Option<PathBuf>,
    history: Option<ClipboardHistory>,
}

impl CliHandler {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = Config::load_config(config_path.as_deref())
            .context("Failed to load configuration")?;

        Ok(Self {
            config,
            config_path,
            history: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lazily open the persisted history when needed
    fn ensure_history(&mut self) -> &mut ClipboardHistory {
        let config = &self.config;
        self.history.get_or_insert_with(|| {
            info!("Opening history in {}", config.storage.data_dir.display());
            ClipboardHistory::open(config)
        })
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Watch => self.watch().await,
            Commands::List {
                pinned,
                unpinned,
                limit,
                json,
            } => self.list(pinned, unpinned, limit, json),
            Commands::Search { query } => self.search(&query),
            Commands::Copy { id } => self.copy(&id),
            Commands::Pin { id } => self.toggle_pin(&id),
            Commands::Delete { id } => self.delete(&id),
            Commands::Clear => self.clear(),
            Commands::Status => self.show_status(),
            Commands::Config { action } => self.handle_config_action(action),
        }
    }

    async fn watch(&mut self) -> Result<()> {
        let source = SystemClipboard::new().context("Clipboard is not available")?;
        let poll_interval = self.config.history.poll_interval();
        let history = match self.history.take() {
            Some(history) => history,
            None => ClipboardHistory::open(&self.config),
        };

        let (handle, task) = HistoryService::spawn(history, source, poll_interval);
        let mut events = handle.subscribe();
        println!("Watching clipboard, press Ctrl-C to stop");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => info!("History revision {}: {:?}", event.revision, event.change),
                    Err(RecvError::Lagged(missed)) => warn!("Missed {} history events", missed),
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    break;
                }
            }
        }

        handle.shutdown().await?;
        let history = task.await?;
        println!("Stopped with {} entries", history.len());
        self.history = Some(history);

        Ok(())
    }

    fn list(
        &mut self,
        pinned: bool,
        unpinned: bool,
        limit: Option<usize>,
        json: bool,
    ) -> Result<()> {
        let history = self.ensure_history();
        let entries = if pinned {
            history.pinned()
        } else if unpinned {
            history.unpinned()
        } else {
            history.entries()
        };
        let entries = &entries[..limit.map_or(entries.len(), |n| n.min(entries.len()))];

        if json {
            let records: Vec<EntryRecord> = entries.iter().map(EntryRecord::from_entry).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No clipboard history found");
            return Ok(());
        }

        println!("Clipboard History (showing {} entries):", entries.len());
        for entry in entries {
            println!("{}", output::entry_line(entry));
        }

        Ok(())
    }

    fn search(&mut self, query: &str) -> Result<()> {
        let matches = self.ensure_history().search(query);

        if matches.is_empty() {
            println!("No entries match '{}'", query);
            return Ok(());
        }

        for entry in matches {
            println!("{}", output::entry_line(entry));
        }

        Ok(())
    }

    fn resolve(&mut self, prefix: &str) -> Result<EntryId> {
        self.ensure_history()
            .store()
            .find_by_prefix(prefix)
            .ok_or_else(|| anyhow!("No single entry matches id '{}'", prefix))
    }

    fn copy(&mut self, prefix: &str) -> Result<()> {
        let id = self.resolve(prefix)?;
        let mut clipboard = SystemClipboard::new().context("Clipboard is not available")?;
        self.ensure_history().promote(id, &mut clipboard)?;
        println!("Copied {}", id);
        Ok(())
    }

    fn toggle_pin(&mut self, prefix: &str) -> Result<()> {
        let id = self.resolve(prefix)?;
        let pinned = self.ensure_history().toggle_pin(id)?;
        println!("{} {}", if pinned { "Pinned" } else { "Unpinned" }, id);
        Ok(())
    }

    fn delete(&mut self, prefix: &str) -> Result<()> {
        let id = self.resolve(prefix)?;
        self.ensure_history().delete(id)?;
        println!("Deleted {}", id);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let history = self.ensure_history();
        let removed = history.len();
        history.clear();
        println!("Cleared {} entries", removed);
        Ok(())
    }

    fn show_status(&mut self) -> Result<()> {
        let config_path = self
            .config_path
            .clone()
            .or_else(Config::default_config_path)
            .filter(|p| p.exists());
        let history = self.ensure_history();

        println!("Clipshelf Status:");
        println!("  Version: {}", crate::VERSION);
        println!(
            "  Build: {} ({}, {})",
            env!("CLIPSHELF_TARGET"),
            env!("CLIPSHELF_PROFILE"),
            env!("CLIPSHELF_BUILD_DATE")
        );
        match config_path {
            Some(path) => println!("  Config: {}", path.display()),
            None => println!("  Config: Default"),
        }
        println!("  Data: {}", history.storage().root().display());
        println!(
            "  Entries: {} ({} pinned)",
            history.len(),
            history.pinned().len()
        );
        println!(
            "  Limits: {} entries, {} pinned",
            history.store().max_history_size(),
            history.store().max_pinned_size()
        );
        if let Some(newest) = history.entries().iter().map(Entry::created_at).max() {
            println!("  Last capture: {}", output::timestamp(newest));
        }

        Ok(())
    }

    fn handle_config_action(&mut self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&self.config)?);
            }
            ConfigAction::Init { force } => {
                let path = Config::generate_example_config(self.config_path.as_deref(), force)?;
                println!("Example configuration written to {}", path.display());
            }
            ConfigAction::Validate => {
                // Already loaded and validated in CliHandler::new()
                println!("Configuration is valid");
            }
        }
        Ok(())
    }
}
