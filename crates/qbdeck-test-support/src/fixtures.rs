//! Torrent fixtures.

use qbdeck_core::{Torrent, TorrentState};

/// Builder for [`Torrent`] records with sensible defaults.
#[derive(Debug, Clone)]
pub struct TorrentBuilder {
    torrent: Torrent,
}

impl TorrentBuilder {
    /// Start a torrent identified by `hash`, named after it.
    #[must_use]
    pub fn new(hash: &str) -> Self {
        Self {
            torrent: Torrent {
                hash: hash.to_string(),
                name: hash.to_string(),
                state: TorrentState::StalledUp,
                progress: 1.0,
                ..Torrent::default()
            },
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.torrent.name = name.to_string();
        self
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(mut self, state: TorrentState) -> Self {
        self.torrent.state = state;
        self
    }

    /// Tracker URL.
    #[must_use]
    pub fn tracker(mut self, url: &str) -> Self {
        self.torrent.tracker = url.to_string();
        self
    }

    /// Save path.
    #[must_use]
    pub fn save_path(mut self, path: &str) -> Self {
        self.torrent.save_path = path.to_string();
        self
    }

    /// Selected and total size in bytes.
    #[must_use]
    pub fn size(mut self, bytes: u64) -> Self {
        self.torrent.size = bytes;
        self.torrent.total_size = i64::try_from(bytes).unwrap_or(i64::MAX);
        self
    }

    /// Torrent still fetching metadata: no known size yet.
    #[must_use]
    pub fn metadata_pending(mut self) -> Self {
        self.torrent.state = TorrentState::MetaDl;
        self.torrent.size = 0;
        self.torrent.total_size = -1;
        self
    }

    /// Finish the record.
    #[must_use]
    pub fn build(self) -> Torrent {
        self.torrent
    }
}

/// Mixed collection covering every status group, two trackers, a trackerless
/// torrent, nested folders and an unassigned state.
#[must_use]
pub fn sample_collection() -> Vec<Torrent> {
    vec![
        TorrentBuilder::new("a1")
            .name("debian-12.iso")
            .state(TorrentState::Downloading)
            .tracker("http://tracker.example.com:6969/announce")
            .save_path("/data/iso/")
            .size(600)
            .build(),
        TorrentBuilder::new("b2")
            .name("ubuntu-24.04.iso")
            .state(TorrentState::StalledUp)
            .tracker("http://tracker.example.com:6969/announce")
            .save_path("/data/iso/")
            .size(900)
            .build(),
        TorrentBuilder::new("c3")
            .name("Some.Show.S01")
            .state(TorrentState::PausedDl)
            .tracker("udp://open.tracker.org:1337/announce")
            .save_path("/data/tv/some-show")
            .size(2_000)
            .build(),
        TorrentBuilder::new("d4")
            .name("archive.tar")
            .state(TorrentState::MissingFiles)
            .save_path("/backup")
            .size(50)
            .build(),
        TorrentBuilder::new("e5")
            .name("relocating")
            .state(TorrentState::Moving)
            .tracker("udp://open.tracker.org:1337/announce")
            .save_path("/data/tv")
            .size(10)
            .build(),
        TorrentBuilder::new("f6")
            .name("recheck")
            .state(TorrentState::CheckingResumeData)
            .build(),
    ]
}
