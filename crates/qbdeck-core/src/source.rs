//! Backend collaborator consumed by the poll loop and the detail view.

use std::error::Error;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    FileEntry, FilePriority, PeersDelta, PieceState, Torrent, TorrentProperties, Tracker,
};

/// Failure reported by a [`TorrentSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backend rejected the session.
    #[error("backend rejected the session")]
    Unauthorized {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The request could not be delivered or the response not received.
    #[error("backend request failed")]
    Network {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered with a non-success status.
    #[error("backend returned an error status")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, trimmed.
        body: String,
    },
    /// The response body could not be decoded.
    #[error("backend response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying decoding failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl SourceError {
    /// Operation that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Unauthorized { operation }
            | Self::Network { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => *operation,
        }
    }

    /// Whether re-authenticating may fix the failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Convenience alias for backend results.
pub type SourceResult<T> = Result<T, SourceError>;

/// Read and write access to a torrent backend.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Full torrent collection.
    async fn fetch_torrents(&self) -> SourceResult<Vec<Torrent>>;

    /// Generic properties of one torrent.
    async fn fetch_properties(&self, hash: &str) -> SourceResult<TorrentProperties>;

    /// Per-piece states of one torrent.
    async fn fetch_piece_states(&self, hash: &str) -> SourceResult<Vec<PieceState>>;

    /// Trackers of one torrent.
    async fn fetch_trackers(&self, hash: &str) -> SourceResult<Vec<Tracker>>;

    /// Peer changes of one torrent since response id `rid`.
    async fn fetch_peers(&self, hash: &str, rid: i64) -> SourceResult<PeersDelta>;

    /// Files of one torrent.
    async fn fetch_files(&self, hash: &str) -> SourceResult<Vec<FileEntry>>;

    /// Change the priority of the given files.
    async fn set_file_priority(
        &self,
        hash: &str,
        file_ids: &[u64],
        priority: FilePriority,
    ) -> SourceResult<()>;
}
