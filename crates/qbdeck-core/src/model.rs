//! Wire DTOs returned by the qBittorrent WebUI API.
//!
//! Every record is deserialized leniently: missing fields fall back to their
//! defaults so that older and newer server versions decode into the same
//! shape. Records are replaced wholesale on every refresh.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Raw lifecycle state reported for a torrent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TorrentState {
    /// Some error occurred.
    #[serde(rename = "error")]
    Error,
    /// Data files are missing.
    #[serde(rename = "missingFiles")]
    MissingFiles,
    /// Seeding with data being transferred.
    #[serde(rename = "uploading")]
    Uploading,
    /// Paused after completion.
    #[serde(rename = "pausedUP")]
    PausedUp,
    /// Queued for seeding.
    #[serde(rename = "queuedUP")]
    QueuedUp,
    /// Seeding without connected peers.
    #[serde(rename = "stalledUP")]
    StalledUp,
    /// Completed and being rechecked.
    #[serde(rename = "checkingUP")]
    CheckingUp,
    /// Forced seeding.
    #[serde(rename = "forcedUP")]
    ForcedUp,
    /// Allocating disk space.
    #[serde(rename = "allocating")]
    Allocating,
    /// Downloading with data being transferred.
    #[serde(rename = "downloading")]
    Downloading,
    /// Fetching metadata.
    #[serde(rename = "metaDL")]
    MetaDl,
    /// Paused before completion.
    #[serde(rename = "pausedDL")]
    PausedDl,
    /// Queued for download.
    #[serde(rename = "queuedDL")]
    QueuedDl,
    /// Downloading without connected peers.
    #[serde(rename = "stalledDL")]
    StalledDl,
    /// Incomplete and being rechecked.
    #[serde(rename = "checkingDL")]
    CheckingDl,
    /// Forced download.
    #[serde(rename = "forcedDL")]
    ForcedDl,
    /// Checking resume data on startup.
    #[serde(rename = "checkingResumeData")]
    CheckingResumeData,
    /// Moving to another location.
    #[serde(rename = "moving")]
    Moving,
    /// Unknown or unrecognized state.
    #[default]
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl TorrentState {
    /// Every state in wire order.
    pub const ALL: [Self; 19] = [
        Self::Error,
        Self::MissingFiles,
        Self::Uploading,
        Self::PausedUp,
        Self::QueuedUp,
        Self::StalledUp,
        Self::CheckingUp,
        Self::ForcedUp,
        Self::Allocating,
        Self::Downloading,
        Self::MetaDl,
        Self::PausedDl,
        Self::QueuedDl,
        Self::StalledDl,
        Self::CheckingDl,
        Self::ForcedDl,
        Self::CheckingResumeData,
        Self::Moving,
        Self::Unknown,
    ];

    /// Wire representation of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::MissingFiles => "missingFiles",
            Self::Uploading => "uploading",
            Self::PausedUp => "pausedUP",
            Self::QueuedUp => "queuedUP",
            Self::StalledUp => "stalledUP",
            Self::CheckingUp => "checkingUP",
            Self::ForcedUp => "forcedUP",
            Self::Allocating => "allocating",
            Self::Downloading => "downloading",
            Self::MetaDl => "metaDL",
            Self::PausedDl => "pausedDL",
            Self::QueuedDl => "queuedDL",
            Self::StalledDl => "stalledDL",
            Self::CheckingDl => "checkingDL",
            Self::ForcedDl => "forcedDL",
            Self::CheckingResumeData => "checkingResumeData",
            Self::Moving => "moving",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for TorrentState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One row of `/api/v2/torrents/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Torrent {
    /// Info-hash, the identity of the record.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Raw lifecycle state.
    pub state: TorrentState,
    /// First working tracker URL, empty when none is working.
    pub tracker: String,
    /// Directory the payload is saved into.
    pub save_path: String,
    /// Size of the selected files in bytes.
    pub size: u64,
    /// Size of every file in the torrent in bytes, `-1` until metadata arrives.
    pub total_size: i64,
    /// Completion in the range 0.0-1.0.
    pub progress: f64,
    /// Download rate in bytes per second.
    pub dlspeed: u64,
    /// Upload rate in bytes per second.
    pub upspeed: u64,
    /// Bytes downloaded.
    pub downloaded: u64,
    /// Bytes uploaded.
    pub uploaded: u64,
    /// Bytes of the selection already completed.
    pub completed: u64,
    /// Bytes left to download.
    pub amount_left: u64,
    /// Share ratio.
    pub ratio: f64,
    /// Estimated seconds to completion, `8640000` when unbounded.
    pub eta: i64,
    /// Connected seeds.
    pub num_seeds: i64,
    /// Seeds in the swarm.
    pub num_complete: i64,
    /// Connected leechers.
    pub num_leechs: i64,
    /// Leechers in the swarm.
    pub num_incomplete: i64,
    /// Epoch seconds when the torrent was added.
    pub added_on: i64,
    /// Epoch seconds when the torrent completed, negative when it has not.
    pub completion_on: i64,
    /// Epoch seconds of the last transfer.
    pub last_activity: i64,
    /// Epoch seconds when a complete copy was last seen.
    pub seen_complete: i64,
    /// Category name, empty when uncategorized.
    pub category: String,
    /// Comma-separated tag list.
    pub tags: String,
    /// Queue position, `-1` when not queued.
    pub priority: i64,
}

/// Response of `/api/v2/torrents/properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorrentProperties {
    /// Directory the payload is saved into.
    pub save_path: String,
    /// Epoch seconds of torrent creation.
    pub creation_date: i64,
    /// Piece size in bytes, `-1` without metadata.
    pub piece_size: i64,
    /// Torrent comment.
    pub comment: String,
    /// Bytes wasted on failed hash checks.
    pub total_wasted: u64,
    /// Bytes uploaded over the torrent lifetime.
    pub total_uploaded: u64,
    /// Bytes downloaded over the torrent lifetime.
    pub total_downloaded: u64,
    /// Upload limit in bytes per second, `-1` when unlimited.
    pub up_limit: i64,
    /// Download limit in bytes per second, `-1` when unlimited.
    pub dl_limit: i64,
    /// Seconds the torrent has been active.
    pub time_elapsed: i64,
    /// Seconds the torrent has been seeding.
    pub seeding_time: i64,
    /// Open connections.
    pub nb_connections: i64,
    /// Connection limit.
    pub nb_connections_limit: i64,
    /// Share ratio.
    pub share_ratio: f64,
    /// Epoch seconds when the torrent was added.
    pub addition_date: i64,
    /// Epoch seconds when the torrent completed.
    pub completion_date: i64,
    /// Creator application.
    pub created_by: String,
    /// Average download rate.
    pub dl_speed_avg: u64,
    /// Current download rate.
    pub dl_speed: u64,
    /// Estimated seconds to completion.
    pub eta: i64,
    /// Epoch seconds when a complete copy was last seen.
    pub last_seen: i64,
    /// Connected peers.
    pub peers: i64,
    /// Peers in the swarm.
    pub peers_total: i64,
    /// Pieces already held, `-1` without metadata.
    pub pieces_have: i64,
    /// Number of pieces, `-1` without metadata.
    pub pieces_num: i64,
    /// Seconds until the next announce.
    pub reannounce: i64,
    /// Connected seeds.
    pub seeds: i64,
    /// Seeds in the swarm.
    pub seeds_total: i64,
    /// Size of every file in bytes, `-1` without metadata.
    pub total_size: i64,
    /// Average upload rate.
    pub up_speed_avg: u64,
    /// Current upload rate.
    pub up_speed: u64,
}

/// State of a single piece from `/api/v2/torrents/pieceStates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PieceState {
    /// Piece not yet downloaded.
    NotDownloaded,
    /// Piece currently being downloaded.
    Downloading,
    /// Piece downloaded and verified.
    Downloaded,
}

impl TryFrom<u8> for PieceState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotDownloaded),
            1 => Ok(Self::Downloading),
            2 => Ok(Self::Downloaded),
            other => Err(format!("unknown piece state {other}")),
        }
    }
}

impl From<PieceState> for u8 {
    fn from(value: PieceState) -> Self {
        match value {
            PieceState::NotDownloaded => 0,
            PieceState::Downloading => 1,
            PieceState::Downloaded => 2,
        }
    }
}

/// Tracker announce status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TrackerStatus {
    /// Tracker is disabled (used for the DHT, PeX and LSD rows).
    #[default]
    Disabled,
    /// Tracker has not been contacted yet.
    NotContacted,
    /// Tracker has been contacted and is working.
    Working,
    /// Tracker is updating.
    Updating,
    /// Tracker has been contacted but is not working.
    NotWorking,
}

impl TrackerStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::NotContacted => "Not contacted",
            Self::Working => "Working",
            Self::Updating => "Updating",
            Self::NotWorking => "Not working",
        }
    }
}

impl TryFrom<u8> for TrackerStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::NotContacted),
            2 => Ok(Self::Working),
            3 => Ok(Self::Updating),
            4 => Ok(Self::NotWorking),
            other => Err(format!("unknown tracker status {other}")),
        }
    }
}

impl From<TrackerStatus> for u8 {
    fn from(value: TrackerStatus) -> Self {
        match value {
            TrackerStatus::Disabled => 0,
            TrackerStatus::NotContacted => 1,
            TrackerStatus::Working => 2,
            TrackerStatus::Updating => 3,
            TrackerStatus::NotWorking => 4,
        }
    }
}

/// One row of `/api/v2/torrents/trackers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tracker {
    /// Announce URL, or a pseudo URL such as `** [DHT] **`.
    pub url: String,
    /// Announce status.
    pub status: TrackerStatus,
    /// Tier, `-1` for the pseudo rows.
    #[serde(deserialize_with = "lenient_tier")]
    pub tier: i64,
    /// Peers reported by the tracker.
    pub num_peers: i64,
    /// Seeds reported by the tracker.
    pub num_seeds: i64,
    /// Leechers reported by the tracker.
    pub num_leeches: i64,
    /// Completed downloads reported by the tracker.
    pub num_downloaded: i64,
    /// Last announce message.
    pub msg: String,
}

// Older servers send an empty string for the pseudo rows.
fn lenient_tier<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(number) => number.as_i64().unwrap_or(-1),
        serde_json::Value::String(text) => text.trim().parse().unwrap_or(-1),
        _ => -1,
    })
}

/// Peer record materialized from `/api/v2/sync/torrentPeers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Peer {
    /// Remote address.
    pub ip: String,
    /// Remote port.
    pub port: u16,
    /// Client identification string.
    pub client: String,
    /// Connection type (`BT`, `μTP`, ...).
    pub connection: String,
    /// Country name when geolocation is enabled.
    pub country: String,
    /// ISO country code when geolocation is enabled.
    pub country_code: String,
    /// Peer flags.
    pub flags: String,
    /// Peer progress in the range 0.0-1.0.
    pub progress: f64,
    /// Download rate from the peer.
    pub dl_speed: u64,
    /// Upload rate to the peer.
    pub up_speed: u64,
    /// Bytes downloaded from the peer.
    pub downloaded: u64,
    /// Bytes uploaded to the peer.
    pub uploaded: u64,
    /// How interesting the peer's pieces are to us.
    pub relevance: f64,
    /// Files the peer is currently transferring.
    pub files: String,
}

/// Incremental response of `/api/v2/sync/torrentPeers`.
///
/// Peer entries carry only the fields that changed since `rid` unless
/// `full_update` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeersDelta {
    /// Response id to send with the next request.
    pub rid: i64,
    /// Whether the response replaces all previously known peers.
    pub full_update: bool,
    /// Whether the server has peer flags display enabled.
    pub show_flags: Option<bool>,
    /// Changed peers keyed by `ip:port`.
    pub peers: Option<serde_json::Map<String, serde_json::Value>>,
    /// Keys of peers that disconnected.
    pub peers_removed: Option<Vec<String>>,
}

/// Download priority of a single file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum FilePriority {
    /// Do not download the file.
    DoNotDownload,
    /// Default priority.
    #[default]
    Normal,
    /// High priority.
    High,
    /// Maximal priority.
    Maximal,
}

impl FilePriority {
    /// Numeric value used on the wire.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::DoNotDownload => 0,
            Self::Normal => 1,
            Self::High => 6,
            Self::Maximal => 7,
        }
    }

    /// Short label for renderers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DoNotDownload => "skip",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Maximal => "maximal",
        }
    }
}

impl TryFrom<i8> for FilePriority {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DoNotDownload),
            1 => Ok(Self::Normal),
            6 => Ok(Self::High),
            7 => Ok(Self::Maximal),
            other => Err(format!("unknown file priority {other}")),
        }
    }
}

impl From<FilePriority> for i8 {
    fn from(value: FilePriority) -> Self {
        value.as_i8()
    }
}

impl FromStr for FilePriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" | "0" => Ok(Self::DoNotDownload),
            "normal" | "1" => Ok(Self::Normal),
            "high" | "6" => Ok(Self::High),
            "maximal" | "max" | "7" => Ok(Self::Maximal),
            other => Err(format!("unknown file priority '{other}'")),
        }
    }
}

/// One row of `/api/v2/torrents/files`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEntry {
    /// File index used by priority updates.
    pub index: u64,
    /// Path relative to the torrent root.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Completion in the range 0.0-1.0.
    pub progress: f64,
    /// Download priority.
    pub priority: FilePriority,
    /// Whether the file is seeding.
    pub is_seed: Option<bool>,
    /// First and last piece index of the file.
    pub piece_range: Vec<u64>,
    /// Availability, `-1` when unknown.
    pub availability: f64,
}
