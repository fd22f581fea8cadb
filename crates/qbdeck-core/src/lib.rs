#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Client-side state pipeline for a qBittorrent WebUI front-end.
//!
//! Layout:
//! - `model.rs`: wire DTOs for torrents, properties, pieces, trackers, peers, files
//! - `status.rs`: status groups and their membership table
//! - `host.rs`: tracker URL to hostname derivation
//! - `classify.rs`: single-pass aggregation over a torrent collection
//! - `tree.rs`: navigation trees built from the aggregates
//! - `filter.rs`: predicate filters and the selection composer
//! - `pieces.rs`: piece-state downsampling
//! - `source.rs`: backend collaborator trait and its error type
//! - `poll.rs`: periodic refresh task
//! - `detail.rs` / `peers.rs`: per-torrent detail loading and peer deltas
//! - `format.rs`: display helpers shared by renderers

pub mod classify;
pub mod detail;
pub mod filter;
pub mod format;
pub mod host;
pub mod model;
pub mod peers;
pub mod pieces;
pub mod poll;
pub mod source;
pub mod status;
pub mod tree;

pub use classify::{Aggregate, Classification, FolderArena, FolderEntry, folder_segments};
pub use detail::{DetailGuard, DetailTicket, DetailView, load_detail};
pub use filter::{
    Dimension, FilterComposer, FilterError, FilterSet, MatchMode, Predicate, SelectionPolicy,
    compose_filter,
};
pub use host::{UNKNOWN_HOST, host_name};
pub use model::{
    FileEntry, FilePriority, Peer, PeersDelta, PieceState, Torrent, TorrentProperties,
    TorrentState, Tracker, TrackerStatus,
};
pub use peers::PeerTable;
pub use pieces::{MAX_PIECE_BUCKETS, PieceBucket, summarize_pieces, summarize_pieces_with};
pub use poll::{PollConfig, PollHandle, PollStatus, TorrentSnapshot, poll_torrents};
pub use source::{SourceError, SourceResult, TorrentSource};
pub use status::StatusGroup;
pub use tree::{GroupingNode, NodeKey, Taxonomies, Taxonomy, build_trees, classify};
