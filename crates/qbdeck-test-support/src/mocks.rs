//! Scripted in-memory backend.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use qbdeck_core::{
    FileEntry, FilePriority, PeersDelta, PieceState, SourceError, SourceResult, Torrent,
    TorrentProperties, TorrentSource, Tracker,
};

/// A priority change recorded by [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityUpdate {
    /// Torrent hash.
    pub hash: String,
    /// File indices.
    pub file_ids: Vec<u64>,
    /// Requested priority.
    pub priority: FilePriority,
}

/// Backend answering from queued responses.
///
/// Collection fetches pop the script in order; once it is exhausted the last
/// successful collection is repeated. Detail fetches for unknown hashes fail
/// with a `404` status.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<SourceResult<Vec<Torrent>>>>,
    last: Mutex<Vec<Torrent>>,
    fetches: AtomicUsize,
    properties: Mutex<HashMap<String, TorrentProperties>>,
    pieces: Mutex<HashMap<String, Vec<PieceState>>>,
    trackers: Mutex<HashMap<String, Vec<Tracker>>>,
    files: Mutex<HashMap<String, Vec<FileEntry>>>,
    peers: Mutex<HashMap<String, VecDeque<PeersDelta>>>,
    peer_rids: Mutex<Vec<i64>>,
    priority_updates: Mutex<Vec<PriorityUpdate>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn missing(operation: &'static str) -> SourceError {
    SourceError::Status {
        operation,
        status: 404,
        body: "Not Found".to_string(),
    }
}

/// Network failure as produced by an unreachable backend.
#[must_use]
pub fn network_failure(operation: &'static str) -> SourceError {
    SourceError::Network {
        operation,
        source: "connection refused".into(),
    }
}

impl ScriptedSource {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful collection fetch.
    #[must_use]
    pub fn then_torrents(self, torrents: Vec<Torrent>) -> Self {
        lock(&self.script).push_back(Ok(torrents));
        self
    }

    /// Queue a failed collection fetch.
    #[must_use]
    pub fn then_failure(self, error: SourceError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Register properties for a hash.
    #[must_use]
    pub fn with_properties(self, hash: &str, properties: TorrentProperties) -> Self {
        lock(&self.properties).insert(hash.to_string(), properties);
        self
    }

    /// Register piece states for a hash.
    #[must_use]
    pub fn with_pieces(self, hash: &str, pieces: Vec<PieceState>) -> Self {
        lock(&self.pieces).insert(hash.to_string(), pieces);
        self
    }

    /// Register trackers for a hash.
    #[must_use]
    pub fn with_trackers(self, hash: &str, trackers: Vec<Tracker>) -> Self {
        lock(&self.trackers).insert(hash.to_string(), trackers);
        self
    }

    /// Register files for a hash.
    #[must_use]
    pub fn with_files(self, hash: &str, files: Vec<FileEntry>) -> Self {
        lock(&self.files).insert(hash.to_string(), files);
        self
    }

    /// Queue a peer response for a hash.
    #[must_use]
    pub fn then_peers(self, hash: &str, delta: PeersDelta) -> Self {
        lock(&self.peers)
            .entry(hash.to_string())
            .or_default()
            .push_back(delta);
        self
    }

    /// Number of collection fetches served.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Response ids sent with peer requests, in order.
    #[must_use]
    pub fn peer_rids(&self) -> Vec<i64> {
        lock(&self.peer_rids).clone()
    }

    /// Priority changes received, in order.
    #[must_use]
    pub fn priority_updates(&self) -> Vec<PriorityUpdate> {
        lock(&self.priority_updates).clone()
    }
}

#[async_trait]
impl TorrentSource for ScriptedSource {
    async fn fetch_torrents(&self) -> SourceResult<Vec<Torrent>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.script).pop_front();
        match next {
            Some(Ok(torrents)) => {
                lock(&self.last).clone_from(&torrents);
                Ok(torrents)
            }
            Some(Err(error)) => Err(error),
            None => Ok(lock(&self.last).clone()),
        }
    }

    async fn fetch_properties(&self, hash: &str) -> SourceResult<TorrentProperties> {
        lock(&self.properties)
            .get(hash)
            .cloned()
            .ok_or_else(|| missing("torrents.properties"))
    }

    async fn fetch_piece_states(&self, hash: &str) -> SourceResult<Vec<PieceState>> {
        lock(&self.pieces)
            .get(hash)
            .cloned()
            .ok_or_else(|| missing("torrents.piece_states"))
    }

    async fn fetch_trackers(&self, hash: &str) -> SourceResult<Vec<Tracker>> {
        lock(&self.trackers)
            .get(hash)
            .cloned()
            .ok_or_else(|| missing("torrents.trackers"))
    }

    async fn fetch_peers(&self, hash: &str, rid: i64) -> SourceResult<PeersDelta> {
        lock(&self.peer_rids).push(rid);
        lock(&self.peers)
            .get_mut(hash)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| missing("sync.torrent_peers"))
    }

    async fn fetch_files(&self, hash: &str) -> SourceResult<Vec<FileEntry>> {
        lock(&self.files)
            .get(hash)
            .cloned()
            .ok_or_else(|| missing("torrents.files"))
    }

    async fn set_file_priority(
        &self,
        hash: &str,
        file_ids: &[u64],
        priority: FilePriority,
    ) -> SourceResult<()> {
        lock(&self.priority_updates).push(PriorityUpdate {
            hash: hash.to_string(),
            file_ids: file_ids.to_vec(),
            priority,
        });
        Ok(())
    }
}
