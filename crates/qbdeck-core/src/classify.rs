//! Single-pass aggregation of a torrent collection.
//!
//! # Design
//! - One walk over the collection fills every aggregate (status groups,
//!   tracker hosts, folder prefixes) so refreshes stay linear.
//! - Tracker hosts and folder prefixes keep first-seen order.
//! - Folder prefixes live in an arena indexed by joined path; nesting is
//!   expressed through child index lists and converted to nodes later.

use std::collections::HashMap;

use serde::Serialize;

use crate::host::host_name;
use crate::model::Torrent;
use crate::status::StatusGroup;

/// Count and cumulative size of the torrents in a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    /// Number of member torrents.
    pub count: u64,
    /// Sum of member sizes in bytes.
    pub size: u64,
}

impl Aggregate {
    /// Account for one more member of `size` bytes.
    pub const fn record(&mut self, size: u64) {
        self.count += 1;
        self.size = self.size.saturating_add(size);
    }
}

/// Non-empty segments of a save path, splitting on both separators.
pub fn folder_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|segment| !segment.is_empty())
}

fn is_rooted(path: &str) -> bool {
    path.starts_with(['/', '\\'])
}

/// Whether `path` lies at or below the folder identified by `prefix`.
///
/// Matching is by whole segments, so `/data/tv` is not below `/data/t`.
/// Absolute and relative paths never match each other, mirroring the
/// separate roots the folder arena builds for them.
#[must_use]
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if is_rooted(path) != is_rooted(prefix) {
        return false;
    }
    let mut path_segments = folder_segments(path);
    let mut matched_any = false;
    for expected in folder_segments(prefix) {
        match path_segments.next() {
            Some(actual) if actual == expected => matched_any = true,
            _ => return false,
        }
    }
    matched_any
}

/// One distinct folder prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    /// Joined path of the prefix, the stable folder key.
    pub path: String,
    /// Last segment of the prefix.
    pub label: String,
    /// Torrents saved at or below the prefix.
    pub aggregate: Aggregate,
    /// Arena indices of the direct sub-folders, in first-seen order.
    pub children: Vec<usize>,
}

/// Arena of folder prefixes keyed by joined path.
#[derive(Debug, Clone, Default)]
pub struct FolderArena {
    entries: Vec<FolderEntry>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl FolderArena {
    /// Walk `save_path` left to right and account `size` on every prefix.
    ///
    /// Returns `false` when the path has no segments and nothing was recorded.
    pub fn record(&mut self, save_path: &str, size: u64) -> bool {
        let mut key = String::new();
        if is_rooted(save_path) {
            key.push('/');
        }
        let mut parent: Option<usize> = None;
        for (depth, segment) in folder_segments(save_path).enumerate() {
            if depth > 0 {
                key.push('/');
            }
            key.push_str(segment);
            let slot = match self.index.get(&key) {
                Some(&slot) => slot,
                None => self.insert(key.clone(), segment, parent),
            };
            self.entries[slot].aggregate.record(size);
            parent = Some(slot);
        }
        parent.is_some()
    }

    fn insert(&mut self, path: String, label: &str, parent: Option<usize>) -> usize {
        let slot = self.entries.len();
        self.index.insert(path.clone(), slot);
        self.entries.push(FolderEntry {
            path,
            label: label.to_string(),
            aggregate: Aggregate::default(),
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.entries[parent].children.push(slot),
            None => self.roots.push(slot),
        }
        slot
    }

    /// All prefixes in creation order.
    #[must_use]
    pub fn entries(&self) -> &[FolderEntry] {
        &self.entries
    }

    /// Arena indices of the top-level prefixes.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Entry at an arena index.
    #[must_use]
    pub fn entry(&self, slot: usize) -> Option<&FolderEntry> {
        self.entries.get(slot)
    }

    /// Entry for a joined path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FolderEntry> {
        self.index.get(path).and_then(|&slot| self.entries.get(slot))
    }

    /// Number of distinct prefixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no prefix was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregates of one torrent collection.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Every torrent in the collection.
    pub total: Aggregate,
    /// Torrents whose state belongs to no status group.
    pub uncategorized: Aggregate,
    /// Torrents that contributed at least one folder prefix.
    pub foldered: Aggregate,
    status: [Aggregate; StatusGroup::ALL.len()],
    trackers: Vec<(String, Aggregate)>,
    tracker_index: HashMap<String, usize>,
    folders: FolderArena,
}

impl Classification {
    /// Classify `torrents` in a single pass.
    #[must_use]
    pub fn from_torrents(torrents: &[Torrent]) -> Self {
        let mut classification = Self::default();
        for torrent in torrents {
            classification.record(torrent);
        }
        tracing::debug!(
            torrents = classification.total.count,
            trackers = classification.trackers.len(),
            folders = classification.folders.len(),
            uncategorized = classification.uncategorized.count,
            "classified torrent collection"
        );
        classification
    }

    fn record(&mut self, torrent: &Torrent) {
        self.total.record(torrent.size);

        let mut grouped = false;
        for group in StatusGroup::groups_of(torrent.state) {
            self.status[group as usize].record(torrent.size);
            grouped = true;
        }
        if !grouped {
            self.uncategorized.record(torrent.size);
        }

        let host = host_name(&torrent.tracker);
        let slot = match self.tracker_index.get(&host) {
            Some(&slot) => slot,
            None => {
                let slot = self.trackers.len();
                self.tracker_index.insert(host.clone(), slot);
                self.trackers.push((host, Aggregate::default()));
                slot
            }
        };
        self.trackers[slot].1.record(torrent.size);

        if self.folders.record(&torrent.save_path, torrent.size) {
            self.foldered.record(torrent.size);
        }
    }

    /// Aggregate of one status group.
    #[must_use]
    pub const fn status(&self, group: StatusGroup) -> Aggregate {
        self.status[group as usize]
    }

    /// Status aggregates in display order.
    pub fn status_groups(&self) -> impl Iterator<Item = (StatusGroup, Aggregate)> + '_ {
        StatusGroup::ALL
            .into_iter()
            .map(|group| (group, self.status(group)))
    }

    /// Tracker hosts with their aggregates, in first-seen order.
    #[must_use]
    pub fn trackers(&self) -> &[(String, Aggregate)] {
        &self.trackers
    }

    /// Aggregate for one tracker host.
    #[must_use]
    pub fn tracker(&self, host: &str) -> Option<Aggregate> {
        self.tracker_index
            .get(host)
            .map(|&slot| self.trackers[slot].1)
    }

    /// Folder prefix arena.
    #[must_use]
    pub const fn folders(&self) -> &FolderArena {
        &self.folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TorrentState;

    fn torrent(hash: &str, state: TorrentState, tracker: &str, path: &str, size: u64) -> Torrent {
        Torrent {
            hash: hash.to_string(),
            name: hash.to_string(),
            state,
            tracker: tracker.to_string(),
            save_path: path.to_string(),
            size,
            ..Torrent::default()
        }
    }

    #[test]
    fn groups_overlap_and_unassigned_states_are_counted() {
        let torrents = vec![
            torrent("a", TorrentState::Downloading, "", "", 10),
            torrent("b", TorrentState::PausedUp, "", "", 20),
            torrent("c", TorrentState::Moving, "", "", 30),
        ];
        let classification = Classification::from_torrents(&torrents);
        assert_eq!(classification.status(StatusGroup::Download).count, 1);
        assert_eq!(classification.status(StatusGroup::Active).count, 1);
        assert_eq!(classification.status(StatusGroup::Pause).count, 1);
        assert_eq!(classification.status(StatusGroup::Upload).count, 0);
        assert_eq!(
            classification.uncategorized,
            Aggregate { count: 1, size: 30 }
        );
        assert_eq!(classification.total.count, 3);
    }

    #[test]
    fn trackers_keep_first_seen_order_and_sum_sizes() {
        let torrents = vec![
            torrent("a", TorrentState::Uploading, "http://b.example/announce", "", 5),
            torrent("b", TorrentState::Uploading, "udp://a.example:80/announce", "", 7),
            torrent("c", TorrentState::Uploading, "http://b.example:8080/x", "", 11),
            torrent("d", TorrentState::Uploading, "", "", 13),
        ];
        let classification = Classification::from_torrents(&torrents);
        let hosts: Vec<_> = classification
            .trackers()
            .iter()
            .map(|(host, aggregate)| (host.as_str(), aggregate.count, aggregate.size))
            .collect();
        assert_eq!(
            hosts,
            vec![
                ("b.example", 2, 16),
                ("a.example", 1, 7),
                ("unknown", 1, 13)
            ]
        );
    }

    #[test]
    fn folder_prefixes_are_counted_per_level() {
        let torrents = vec![
            torrent("a", TorrentState::Uploading, "", "/a/b/c", 1),
            torrent("b", TorrentState::Uploading, "", "/a/b/", 2),
            torrent("c", TorrentState::Uploading, "", "/a/d", 4),
            torrent("d", TorrentState::Uploading, "", "", 8),
        ];
        let classification = Classification::from_torrents(&torrents);
        let folders = classification.folders();
        assert_eq!(folders.len(), 4);
        assert_eq!(folders.get("/a").map(|f| f.aggregate.count), Some(3));
        assert_eq!(folders.get("/a/b").map(|f| f.aggregate.count), Some(2));
        assert_eq!(folders.get("/a/b/c").map(|f| f.aggregate.size), Some(1));
        assert_eq!(folders.get("/a/d").map(|f| f.aggregate.count), Some(1));
        assert_eq!(folders.roots().len(), 1);
        assert_eq!(classification.foldered.count, 3);
    }

    #[test]
    fn windows_paths_split_on_backslashes() {
        let torrents = vec![torrent(
            "a",
            TorrentState::Uploading,
            "",
            "C:\\Downloads\\tv\\",
            1,
        )];
        let classification = Classification::from_torrents(&torrents);
        let paths: Vec<_> = classification
            .folders()
            .entries()
            .iter()
            .map(|entry| entry.path.as_str())
            .collect();
        assert_eq!(paths, vec!["C:", "C:/Downloads", "C:/Downloads/tv"]);
    }

    #[test]
    fn segment_prefix_rejects_partial_segments() {
        assert!(path_has_prefix("/a/b/c", "/a/b"));
        assert!(path_has_prefix("/a/b/", "/a/b"));
        assert!(!path_has_prefix("/ab", "/a"));
        assert!(!path_has_prefix("/a", "/a/b"));
        assert!(!path_has_prefix("/a", ""));
        assert!(path_has_prefix("C:\\Downloads\\tv", "C:/Downloads"));
        assert!(!path_has_prefix("data/y", "/data"));
        assert!(!path_has_prefix("/data/x", "data"));
    }

    #[test]
    fn absolute_and_relative_paths_form_separate_roots() {
        let torrents = vec![
            torrent("a", TorrentState::Uploading, "", "/data/x", 1),
            torrent("b", TorrentState::Uploading, "", "data/y", 2),
        ];
        let classification = Classification::from_torrents(&torrents);
        let folders = classification.folders();
        assert_eq!(folders.roots().len(), 2);
        for entry in folders.entries() {
            let shown = torrents
                .iter()
                .filter(|torrent| path_has_prefix(&torrent.save_path, &entry.path))
                .count();
            assert_eq!(
                u64::try_from(shown).ok(),
                Some(entry.aggregate.count),
                "folder {}",
                entry.path
            );
        }
    }
}
