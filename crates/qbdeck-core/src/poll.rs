//! Periodic refresh of the torrent collection.
//!
//! # Design
//! - One task per poll stream; fetches never overlap because the delay only
//!   starts once a fetch has completed (fixed delay, not fixed rate).
//! - Any fetch failure parks the loop in [`PollStatus::NeedsLogin`] until the
//!   owner calls [`PollHandle::resume`] after re-authenticating.
//! - Dropping or cancelling the handle stops the task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::Torrent;
use crate::source::TorrentSource;

/// Delay between two fetches unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Poll loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between the end of one fetch and the start of the next.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Externally visible state of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Fetching on schedule.
    Live,
    /// Suspended after a failed fetch until [`PollHandle::resume`].
    NeedsLogin,
    /// Cancelled.
    Stopped,
}

/// One successful fetch of the collection.
#[derive(Debug, Clone)]
pub struct TorrentSnapshot {
    /// Monotonic counter of successful fetches, starting at 1.
    pub sequence: u64,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// The collection, shared read-only with every consumer.
    pub torrents: Arc<[Torrent]>,
}

#[derive(Debug, Clone, Copy)]
enum PollCommand {
    Refresh,
    Resume,
}

/// Owner handle of a running poll loop.
#[derive(Debug)]
pub struct PollHandle {
    commands: mpsc::UnboundedSender<PollCommand>,
    status: Arc<watch::Sender<PollStatus>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Current status.
    #[must_use]
    pub fn status(&self) -> PollStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollStatus> {
        self.status.subscribe()
    }

    /// Fetch immediately instead of waiting for the delay.
    ///
    /// Ignored while the loop waits for a login. Requests made while a fetch
    /// is in flight are satisfied by that fetch.
    pub fn refresh(&self) -> bool {
        self.commands.send(PollCommand::Refresh).is_ok()
    }

    /// Leave [`PollStatus::NeedsLogin`] and fetch immediately.
    pub fn resume(&self) -> bool {
        self.commands.send(PollCommand::Resume).is_ok()
    }

    /// Stop the loop at its next suspension point.
    pub fn cancel(mut self) {
        self.stop();
        debug!("poll loop cancelled");
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.status.send_replace(PollStatus::Stopped);
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start polling `source`.
///
/// `on_update` receives every successful fetch; `on_auth_required` fires
/// once each time a fetch fails and the loop suspends. Must be called from
/// within a tokio runtime.
pub fn poll_torrents<U, A>(
    source: Arc<dyn TorrentSource>,
    config: PollConfig,
    on_update: U,
    on_auth_required: A,
) -> PollHandle
where
    U: FnMut(TorrentSnapshot) + Send + 'static,
    A: FnMut() + Send + 'static,
{
    let (commands, receiver) = mpsc::unbounded_channel();
    let (status, _) = watch::channel(PollStatus::Live);
    let status = Arc::new(status);
    let task = tokio::spawn(run_loop(
        source,
        config.interval,
        receiver,
        Arc::clone(&status),
        on_update,
        on_auth_required,
    ));
    PollHandle {
        commands,
        status,
        task: Some(task),
    }
}

async fn run_loop<U, A>(
    source: Arc<dyn TorrentSource>,
    interval: Duration,
    mut commands: mpsc::UnboundedReceiver<PollCommand>,
    status: Arc<watch::Sender<PollStatus>>,
    mut on_update: U,
    mut on_auth_required: A,
) where
    U: FnMut(TorrentSnapshot) + Send + 'static,
    A: FnMut() + Send + 'static,
{
    let mut sequence = 0_u64;
    loop {
        match source.fetch_torrents().await {
            Ok(torrents) => {
                sequence += 1;
                debug!(sequence, torrents = torrents.len(), "torrent collection refreshed");
                status.send_if_modified(|current| {
                    let changed = *current != PollStatus::Live;
                    *current = PollStatus::Live;
                    changed
                });
                on_update(TorrentSnapshot {
                    sequence,
                    fetched_at: Utc::now(),
                    torrents: torrents.into(),
                });
            }
            Err(err) => {
                warn!(
                    operation = err.operation(),
                    error = %err,
                    "torrent refresh failed; waiting for login"
                );
                status.send_replace(PollStatus::NeedsLogin);
                on_auth_required();
                loop {
                    match commands.recv().await {
                        Some(PollCommand::Resume) => break,
                        Some(PollCommand::Refresh) => {}
                        None => return,
                    }
                }
                debug!("poll loop resumed");
                continue;
            }
        }

        if !drain_pending(&mut commands) {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            command = commands.recv() => {
                if command.is_none() {
                    return;
                }
            }
        }
    }
}

// Returns `false` once the handle is gone.
fn drain_pending(commands: &mut mpsc::UnboundedReceiver<PollCommand>) -> bool {
    loop {
        match commands.try_recv() {
            Ok(_) => {}
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}
