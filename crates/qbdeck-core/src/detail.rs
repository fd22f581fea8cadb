//! Per-torrent detail loading and the stale-response guard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{FileEntry, Peer, TorrentProperties, Tracker};
use crate::peers::PeerTable;
use crate::pieces::{PieceBucket, summarize_pieces};
use crate::source::{SourceResult, TorrentSource};

/// Proof of which selection a detail request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    hash: String,
    generation: u64,
}

impl DetailTicket {
    /// Hash the request was issued for.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

#[derive(Debug, Default)]
struct Selection {
    current: Option<String>,
    generation: u64,
}

/// Tracks the selected torrent so late responses for older selections are
/// dropped.
///
/// Clones share the same selection, so a request in flight observes
/// re-selections made elsewhere.
#[derive(Debug, Clone, Default)]
pub struct DetailGuard {
    selection: Arc<Mutex<Selection>>,
}

impl DetailGuard {
    fn lock(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Select `hash` and issue a ticket for the requests that follow.
    ///
    /// Re-selecting the same hash also invalidates older tickets, so only
    /// the latest request for a hash is accepted.
    pub fn select(&self, hash: &str) -> DetailTicket {
        let mut selection = self.lock();
        selection.generation += 1;
        selection.current = Some(hash.to_string());
        DetailTicket {
            hash: hash.to_string(),
            generation: selection.generation,
        }
    }

    /// Drop the selection; every outstanding ticket becomes stale.
    pub fn clear(&self) {
        let mut selection = self.lock();
        selection.generation += 1;
        selection.current = None;
    }

    /// Selected hash.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Whether `ticket` belongs to the latest selection.
    #[must_use]
    pub fn is_current(&self, ticket: &DetailTicket) -> bool {
        let selection = self.lock();
        ticket.generation == selection.generation
            && selection.current.as_deref() == Some(ticket.hash())
    }

    /// Pass `value` through when `ticket` is current, otherwise drop it.
    pub fn accept<T>(&self, ticket: &DetailTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(hash = ticket.hash(), "discarding stale detail response");
            None
        }
    }
}

/// Everything shown for one selected torrent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailView {
    /// Torrent hash.
    pub hash: String,
    /// Generic properties, `None` when the fetch failed.
    pub properties: Option<TorrentProperties>,
    /// Number of pieces reported by the backend.
    pub piece_count: usize,
    /// Downsampled piece states.
    pub pieces: Vec<PieceBucket>,
    /// Trackers.
    pub trackers: Vec<Tracker>,
    /// Connected peers sorted by `ip:port`.
    pub peers: Vec<Peer>,
    /// Files.
    pub files: Vec<FileEntry>,
}

/// Fetch every detail panel of the ticket's torrent concurrently.
///
/// Each panel degrades independently: a failed fetch is logged and leaves
/// that panel empty. `peers` carries the incremental peer state between
/// calls and is reset when the peer fetch fails.
///
/// Returns `None`, leaving `peers` untouched, when `guard` moved on to
/// another selection while the fetches were in flight.
pub async fn load_detail(
    source: &dyn TorrentSource,
    guard: &DetailGuard,
    ticket: &DetailTicket,
    peers: &mut PeerTable,
) -> Option<DetailView> {
    let hash = ticket.hash();
    let (properties, pieces, trackers, peer_delta, files) = tokio::join!(
        source.fetch_properties(hash),
        source.fetch_piece_states(hash),
        source.fetch_trackers(hash),
        source.fetch_peers(hash, peers.rid()),
        source.fetch_files(hash),
    );
    guard.accept(ticket, ())?;

    let pieces = panel(hash, "pieces", pieces).unwrap_or_default();
    let peer_list = match panel(hash, "peers", peer_delta) {
        Some(delta) => {
            peers.apply(delta);
            peers.peers().into_iter().map(|(_, peer)| peer).collect()
        }
        None => {
            *peers = PeerTable::default();
            Vec::new()
        }
    };

    let view = DetailView {
        hash: hash.to_string(),
        properties: panel(hash, "properties", properties),
        piece_count: pieces.len(),
        pieces: summarize_pieces(&pieces),
        trackers: panel(hash, "trackers", trackers).unwrap_or_default(),
        peers: peer_list,
        files: panel(hash, "files", files).unwrap_or_default(),
    };
    Some(view)
}

fn panel<T>(hash: &str, name: &'static str, result: SourceResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                hash,
                panel = name,
                operation = err.operation(),
                error = %err,
                "detail panel unavailable"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_selection_invalidates_older_ticket() {
        let guard = DetailGuard::default();
        let first = guard.select("aaa");
        let second = guard.select("bbb");
        assert_eq!(guard.accept(&first, 1), None);
        assert_eq!(guard.accept(&second, 2), Some(2));
    }

    #[test]
    fn reselecting_same_hash_keeps_only_latest() {
        let guard = DetailGuard::default();
        let first = guard.select("aaa");
        let second = guard.select("aaa");
        assert!(!guard.is_current(&first));
        assert!(guard.is_current(&second));
    }

    #[test]
    fn clones_observe_the_same_selection() {
        let guard = DetailGuard::default();
        let ticket = guard.select("aaa");
        guard.clone().select("bbb");
        assert_eq!(guard.current().as_deref(), Some("bbb"));
        assert!(!guard.is_current(&ticket));
    }

    #[test]
    fn clearing_selection_discards_everything() {
        let guard = DetailGuard::default();
        let ticket = guard.select("aaa");
        guard.clear();
        assert_eq!(guard.current(), None);
        assert!(!guard.is_current(&ticket));
        assert_eq!(guard.accept(&ticket, ()), None);
    }
}
