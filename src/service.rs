//! Single control task owning the clipboard history
//!
//! All mutations, whether triggered by the poller or by a [`HistoryHandle`],
//! run one at a time on the task spawned by [`HistoryService::spawn`]. The
//! handle is cheap to clone and is what UI code holds.

use std::ops::ControlFlow;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::clipboard::{ClipboardSource, Snapshot};
use crate::history::{ClipboardHistory, Entry, EntryId, HistoryEvent, StoreError};
use crate::poller::Poller;

/// Pending commands before callers wait for room
const COMMAND_CAPACITY: usize = 32;

/// Which part of the list to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    All,
    Pinned,
    Unpinned,
}

/// Errors seen by handle callers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Store rejected the operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The control task is gone
    #[error("History service has stopped")]
    Stopped,
}

enum Command {
    Capture(Snapshot, oneshot::Sender<Result<EntryId, StoreError>>),
    Promote(EntryId, oneshot::Sender<Result<(), StoreError>>),
    TogglePin(EntryId, oneshot::Sender<Result<bool, StoreError>>),
    Delete(EntryId, oneshot::Sender<Result<(), StoreError>>),
    Clear(oneshot::Sender<()>),
    List(Partition, oneshot::Sender<Vec<Entry>>),
    Search(String, oneshot::Sender<Vec<Entry>>),
    Shutdown,
}

/// Cloneable access to a running history service
#[derive(Clone)]
pub struct HistoryHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<HistoryEvent>,
}

/// Spawns the control task
pub struct HistoryService;

impl HistoryService {
    /// Start monitoring `source` every `poll_interval`
    ///
    /// The join handle yields the history back once the service shuts down.
    pub fn spawn<S>(
        history: ClipboardHistory,
        source: S,
        poll_interval: Duration,
    ) -> (HistoryHandle, JoinHandle<ClipboardHistory>)
    where
        S: ClipboardSource + 'static,
    {
        let (commands, receiver) = mpsc::channel(COMMAND_CAPACITY);
        let handle = HistoryHandle {
            commands,
            events: history.event_sender(),
        };

        let task = tokio::spawn(run(history, source, receiver, poll_interval));
        (handle, task)
    }
}

async fn run<S: ClipboardSource>(
    mut history: ClipboardHistory,
    mut source: S,
    mut commands: mpsc::Receiver<Command>,
    poll_interval: Duration,
) -> ClipboardHistory {
    let mut poller = Poller::new();
    poller.arm();

    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Monitoring {} clipboard every {:?}",
        source.name(),
        poll_interval
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(snapshot) = poller.tick(&mut source) {
                    match history.capture(snapshot) {
                        Ok(id) => debug!("Captured clipboard change as {}", id),
                        Err(e) => debug!("Ignored clipboard change: {}", e),
                    }
                }
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                if handle(&mut history, &mut poller, &mut source, command).is_break() {
                    break;
                }
            }
        }
    }

    info!("History service stopped");
    history
}

fn handle<S: ClipboardSource>(
    history: &mut ClipboardHistory,
    poller: &mut Poller,
    source: &mut S,
    command: Command,
) -> ControlFlow<()> {
    // A dropped reply receiver only means the caller stopped waiting
    match command {
        Command::Capture(snapshot, reply) => {
            let _ = reply.send(history.capture(snapshot));
        }
        Command::Promote(id, reply) => {
            let result = history.promote(id, source);
            if result.is_ok() {
                poller.adopt(source);
            }
            let _ = reply.send(result);
        }
        Command::TogglePin(id, reply) => {
            let _ = reply.send(history.toggle_pin(id));
        }
        Command::Delete(id, reply) => {
            let _ = reply.send(history.delete(id));
        }
        Command::Clear(reply) => {
            history.clear();
            let _ = reply.send(());
        }
        Command::List(partition, reply) => {
            let entries = match partition {
                Partition::All => history.entries(),
                Partition::Pinned => history.pinned(),
                Partition::Unpinned => history.unpinned(),
            };
            let _ = reply.send(entries.to_vec());
        }
        Command::Search(query, reply) => {
            let _ = reply.send(history.search(&query).into_iter().cloned().collect());
        }
        Command::Shutdown => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

impl HistoryHandle {
    /// Register an observer of history changes
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ServiceError::Stopped)?;
        response.await.map_err(|_| ServiceError::Stopped)
    }

    /// Record a snapshot as if it had been copied
    pub async fn capture(&self, snapshot: Snapshot) -> Result<EntryId, ServiceError> {
        Ok(self.request(|reply| Command::Capture(snapshot, reply)).await??)
    }

    /// Move an entry to the top of its partition and onto the clipboard
    pub async fn promote(&self, id: EntryId) -> Result<(), ServiceError> {
        Ok(self.request(|reply| Command::Promote(id, reply)).await??)
    }

    /// Returns the new pinned state
    pub async fn toggle_pin(&self, id: EntryId) -> Result<bool, ServiceError> {
        Ok(self.request(|reply| Command::TogglePin(id, reply)).await??)
    }

    pub async fn delete(&self, id: EntryId) -> Result<(), ServiceError> {
        Ok(self.request(|reply| Command::Delete(id, reply)).await??)
    }

    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.request(Command::Clear).await
    }

    pub async fn entries(&self) -> Result<Vec<Entry>, ServiceError> {
        self.request(|reply| Command::List(Partition::All, reply)).await
    }

    pub async fn pinned(&self) -> Result<Vec<Entry>, ServiceError> {
        self.request(|reply| Command::List(Partition::Pinned, reply)).await
    }

    pub async fn unpinned(&self) -> Result<Vec<Entry>, ServiceError> {
        self.request(|reply| Command::List(Partition::Unpinned, reply)).await
    }

    pub async fn search(&self, query: impl Into<String>) -> Result<Vec<Entry>, ServiceError> {
        let query = query.into();
        self.request(|reply| Command::Search(query, reply)).await
    }

    /// Stop the control task; pending commands queued before this still run
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| ServiceError::Stopped)
    }
}
