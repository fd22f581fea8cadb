//! Status groups: named buckets over raw torrent states.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::TorrentState;

/// Named bucket aggregating raw lifecycle states.
///
/// Groups overlap: a downloading torrent is both `Download` and `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    /// Torrents fetching data.
    Download,
    /// Paused torrents.
    Pause,
    /// Seeding torrents.
    Upload,
    /// Torrents being rechecked.
    Check,
    /// Torrents currently transferring.
    Active,
    /// Torrents in an error state.
    Error,
}

impl StatusGroup {
    /// Display order of the status tree.
    pub const ALL: [Self; 6] = [
        Self::Download,
        Self::Pause,
        Self::Upload,
        Self::Check,
        Self::Active,
        Self::Error,
    ];

    /// Raw states that belong to the group.
    #[must_use]
    pub const fn states(self) -> &'static [TorrentState] {
        match self {
            Self::Download => &[
                TorrentState::Downloading,
                TorrentState::MetaDl,
                TorrentState::StalledDl,
                TorrentState::QueuedDl,
                TorrentState::ForcedDl,
            ],
            Self::Pause => &[TorrentState::PausedDl, TorrentState::PausedUp],
            Self::Upload => &[
                TorrentState::Uploading,
                TorrentState::StalledUp,
                TorrentState::QueuedUp,
                TorrentState::ForcedUp,
            ],
            Self::Check => &[
                TorrentState::CheckingUp,
                TorrentState::CheckingDl,
                TorrentState::CheckingResumeData,
            ],
            Self::Active => &[
                TorrentState::Downloading,
                TorrentState::MetaDl,
                TorrentState::Uploading,
            ],
            Self::Error => &[TorrentState::Error, TorrentState::MissingFiles],
        }
    }

    /// Whether `state` is a member of the group.
    #[must_use]
    pub fn contains(self, state: TorrentState) -> bool {
        self.states().contains(&state)
    }

    /// Groups `state` belongs to, in display order.
    pub fn groups_of(state: TorrentState) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |group| group.contains(state))
    }

    /// Stable key used in node identifiers and on the command line.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Pause => "pause",
            Self::Upload => "upload",
            Self::Check => "check",
            Self::Active => "active",
            Self::Error => "error",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Download => "Downloading",
            Self::Pause => "Paused",
            Self::Upload => "Seeding",
            Self::Check => "Checking",
            Self::Active => "Active",
            Self::Error => "Error",
        }
    }

    /// Icon identifier.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Download => "pi-arrow-circle-down",
            Self::Pause => "pi-pause",
            Self::Upload => "pi-arrow-circle-up",
            Self::Check => "pi-sync",
            Self::Active => "pi-arrow-right-arrow-left",
            Self::Error => "pi-exclamation-triangle",
        }
    }
}

impl Display for StatusGroup {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

impl FromStr for StatusGroup {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.key().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown status group '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloading_is_both_download_and_active() {
        let groups: Vec<_> = StatusGroup::groups_of(TorrentState::Downloading).collect();
        assert_eq!(groups, vec![StatusGroup::Download, StatusGroup::Active]);
    }

    #[test]
    fn unassigned_states_have_no_group() {
        for state in [
            TorrentState::Allocating,
            TorrentState::Moving,
            TorrentState::Unknown,
        ] {
            assert_eq!(StatusGroup::groups_of(state).count(), 0, "{state}");
        }
    }

    #[test]
    fn every_other_state_has_a_group() {
        let unassigned = [
            TorrentState::Allocating,
            TorrentState::Moving,
            TorrentState::Unknown,
        ];
        for state in TorrentState::ALL {
            if !unassigned.contains(&state) {
                assert!(StatusGroup::groups_of(state).next().is_some(), "{state}");
            }
        }
    }

    #[test]
    fn keys_parse_back() {
        for group in StatusGroup::ALL {
            assert_eq!(group.key().parse::<StatusGroup>(), Ok(group));
        }
        assert!("seeding".parse::<StatusGroup>().is_err());
    }
}
