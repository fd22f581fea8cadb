//! Predicate filters over the torrent collection and the selection composer.
//!
//! # Design
//! - A [`FilterSet`] holds at most one [`Predicate`] per [`Dimension`]; all
//!   dimensions AND together.
//! - Predicates own their test closure, so a set can be cloned and handed to
//!   renderers as an immutable snapshot.
//! - Selecting a navigation node goes through [`compose_filter`], which
//!   remembers the selected node and tears down the previous selection
//!   according to the [`SelectionPolicy`].

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::path_has_prefix;
use crate::host::host_name;
use crate::model::Torrent;
use crate::status::StatusGroup;
use crate::tree::NodeKey;

/// Field family a predicate constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Free-text search over name, save path and tracker.
    Global,
    /// Status group membership.
    State,
    /// Tracker hostname.
    Tracker,
    /// Folder prefix of the save path.
    SavePath,
}

impl Dimension {
    /// Wire-style name of the dimension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::State => "state",
            Self::Tracker => "tracker",
            Self::SavePath => "save_path",
        }
    }
}

/// How a predicate interprets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Accepts everything.
    Universal,
    /// Case-insensitive substring.
    Contains,
    /// Case-insensitive regular expression.
    Regex,
    /// Status group membership.
    StatusGroup,
    /// Tracker hostname equality.
    HostEquals,
    /// Whole-segment save path prefix.
    PathPrefix,
}

/// Errors raised while building filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Search pattern is not a valid regular expression.
    #[error("invalid search pattern")]
    InvalidPattern {
        /// Pattern supplied by the caller.
        pattern: String,
        /// Underlying regex failure.
        #[source]
        source: regex::Error,
    },
}

type TorrentTest = Arc<dyn Fn(&Torrent) -> bool + Send + Sync>;

/// A single filter: descriptor plus test closure.
#[derive(Clone)]
pub struct Predicate {
    dimension: Dimension,
    value: String,
    mode: MatchMode,
    test: TorrentTest,
}

impl Predicate {
    fn new(
        dimension: Dimension,
        value: impl Into<String>,
        mode: MatchMode,
        test: impl Fn(&Torrent) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            dimension,
            value: value.into(),
            mode,
            test: Arc::new(test),
        }
    }

    /// Predicate that accepts every torrent.
    #[must_use]
    pub fn universal(dimension: Dimension) -> Self {
        Self::new(dimension, String::new(), MatchMode::Universal, |_| true)
    }

    /// Global text search over name, save path and tracker URL.
    ///
    /// An empty query yields the universal predicate.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] when `regex` is set and the
    /// query does not compile.
    pub fn search(query: &str, regex: bool) -> Result<Self, FilterError> {
        if query.is_empty() {
            return Ok(Self::universal(Dimension::Global));
        }
        if regex {
            let pattern = RegexBuilder::new(query)
                .case_insensitive(true)
                .build()
                .map_err(|source| FilterError::InvalidPattern {
                    pattern: query.to_string(),
                    source,
                })?;
            return Ok(Self::new(
                Dimension::Global,
                query,
                MatchMode::Regex,
                move |torrent| {
                    pattern.is_match(&torrent.name)
                        || pattern.is_match(&torrent.save_path)
                        || pattern.is_match(&torrent.tracker)
                },
            ));
        }
        let needle = query.to_lowercase();
        Ok(Self::new(
            Dimension::Global,
            query,
            MatchMode::Contains,
            move |torrent| {
                [&torrent.name, &torrent.save_path, &torrent.tracker]
                    .into_iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            },
        ))
    }

    /// Status group membership of the torrent state.
    #[must_use]
    pub fn status(group: StatusGroup) -> Self {
        Self::new(
            Dimension::State,
            group.key(),
            MatchMode::StatusGroup,
            move |torrent| group.contains(torrent.state),
        )
    }

    /// Hostname equality of the tracker URL.
    #[must_use]
    pub fn tracker(host: &str) -> Self {
        let host = host.to_string();
        Self::new(
            Dimension::Tracker,
            host.clone(),
            MatchMode::HostEquals,
            move |torrent| host_name(&torrent.tracker) == host,
        )
    }

    /// Save path at or below `path`.
    #[must_use]
    pub fn folder(path: &str) -> Self {
        let prefix = path.to_string();
        Self::new(
            Dimension::SavePath,
            prefix.clone(),
            MatchMode::PathPrefix,
            move |torrent| path_has_prefix(&torrent.save_path, &prefix),
        )
    }

    /// Predicate installed when `key` is selected, `None` for roots.
    #[must_use]
    pub fn for_node(key: &NodeKey) -> Option<Self> {
        match key {
            NodeKey::Root(_) => None,
            NodeKey::Status(group) => Some(Self::status(*group)),
            NodeKey::Tracker(host) => Some(Self::tracker(host)),
            NodeKey::Folder(path) => Some(Self::folder(path)),
        }
    }

    /// Dimension the predicate constrains.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Value the predicate tests against.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Match mode.
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether the predicate accepts everything.
    #[must_use]
    pub const fn is_universal(&self) -> bool {
        matches!(self.mode, MatchMode::Universal)
    }

    /// Evaluate the predicate.
    #[must_use]
    pub fn matches(&self, torrent: &Torrent) -> bool {
        (self.test)(torrent)
    }
}

impl Debug for Predicate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Predicate")
            .field("dimension", &self.dimension)
            .field("value", &self.value)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.value == other.value && self.mode == other.mode
    }
}

/// What happens to the previous selection when another taxonomy is chosen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Only one taxonomy filters at a time.
    #[default]
    Exclusive,
    /// Filters from different taxonomies AND together.
    Stacked,
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Ok(Self::Exclusive),
            "stacked" => Ok(Self::Stacked),
            other => Err(format!("unknown selection policy '{other}'")),
        }
    }
}

/// Active filters plus the node that produced the structural one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: BTreeMap<Dimension, Predicate>,
    selection: Option<NodeKey>,
}

impl FilterSet {
    /// Predicate installed for `dimension`.
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&Predicate> {
        self.predicates.get(&dimension)
    }

    /// Whether `dimension` currently restricts anything.
    #[must_use]
    pub fn is_active(&self, dimension: Dimension) -> bool {
        self.get(dimension)
            .is_some_and(|predicate| !predicate.is_universal())
    }

    /// Predicates that restrict the collection.
    pub fn active(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates
            .values()
            .filter(|predicate| !predicate.is_universal())
    }

    /// Node whose selection produced the current structural filter.
    #[must_use]
    pub const fn selection(&self) -> Option<&NodeKey> {
        self.selection.as_ref()
    }

    /// Whether `torrent` passes every dimension.
    #[must_use]
    pub fn matches(&self, torrent: &Torrent) -> bool {
        self.predicates
            .values()
            .all(|predicate| predicate.matches(torrent))
    }

    /// Visible torrents in collection order.
    #[must_use]
    pub fn apply<'a>(&self, torrents: &'a [Torrent]) -> Vec<&'a Torrent> {
        torrents
            .iter()
            .filter(|torrent| self.matches(torrent))
            .collect()
    }

    /// Copy of the set with the global search replaced.
    ///
    /// # Errors
    ///
    /// Propagates [`FilterError::InvalidPattern`] for bad regex queries.
    pub fn with_search(&self, query: &str, regex: bool) -> Result<Self, FilterError> {
        let mut next = self.clone();
        next.install(Predicate::search(query, regex)?);
        Ok(next)
    }

    /// Copy of the set with the selected node's dimension reset.
    #[must_use]
    pub fn deselect(&self) -> Self {
        let mut next = self.clone();
        if let Some(previous) = next.selection.take() {
            next.reset(previous.taxonomy().dimension());
        }
        next
    }

    fn install(&mut self, predicate: Predicate) {
        self.predicates.insert(predicate.dimension(), predicate);
    }

    fn reset(&mut self, dimension: Dimension) {
        self.install(Predicate::universal(dimension));
    }
}

/// Filter set resulting from selecting `key` on top of `current`.
///
/// Re-selecting the current node returns `current` unchanged. Roots install
/// no predicate and reset their own dimension. Under
/// [`SelectionPolicy::Exclusive`] a selection in another taxonomy also resets
/// the previously selected dimension.
#[must_use]
pub fn compose_filter(current: &FilterSet, key: &NodeKey, policy: SelectionPolicy) -> FilterSet {
    if current.selection.as_ref() == Some(key) {
        return current.clone();
    }

    let mut next = current.clone();
    if policy == SelectionPolicy::Exclusive
        && let Some(previous) = &current.selection
        && previous.taxonomy() != key.taxonomy()
    {
        next.reset(previous.taxonomy().dimension());
    }

    match Predicate::for_node(key) {
        Some(predicate) => next.install(predicate),
        None => next.reset(key.taxonomy().dimension()),
    }
    next.selection = Some(key.clone());
    tracing::debug!(
        selection = %key,
        active = next.active().count(),
        "filter selection changed"
    );
    next
}

/// Sole writer of the active filter set.
#[derive(Debug, Clone, Default)]
pub struct FilterComposer {
    filters: FilterSet,
    policy: SelectionPolicy,
}

impl FilterComposer {
    /// Composer with no active filters.
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            filters: FilterSet::default(),
            policy,
        }
    }

    /// Selection policy in effect.
    #[must_use]
    pub const fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Current filter set.
    #[must_use]
    pub const fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Immutable copy for renderers.
    #[must_use]
    pub fn snapshot(&self) -> FilterSet {
        self.filters.clone()
    }

    /// Apply a node selection.
    pub fn select_node(&mut self, key: &NodeKey) -> &FilterSet {
        self.filters = compose_filter(&self.filters, key, self.policy);
        &self.filters
    }

    /// Clear the structural selection.
    pub fn deselect(&mut self) -> &FilterSet {
        self.filters = self.filters.deselect();
        &self.filters
    }

    /// Replace the global search.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] and leaves the filters
    /// untouched when the regex does not compile.
    pub fn set_search(&mut self, query: &str, regex: bool) -> Result<&FilterSet, FilterError> {
        self.filters = self.filters.with_search(query, regex)?;
        Ok(&self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TorrentState;
    use crate::tree::Taxonomy;

    fn torrent(name: &str, state: TorrentState, tracker: &str, path: &str) -> Torrent {
        Torrent {
            hash: name.to_string(),
            name: name.to_string(),
            state,
            tracker: tracker.to_string(),
            save_path: path.to_string(),
            ..Torrent::default()
        }
    }

    fn collection() -> Vec<Torrent> {
        vec![
            torrent(
                "Debian",
                TorrentState::Downloading,
                "http://example.com/announce",
                "/data/iso",
            ),
            torrent(
                "Ubuntu",
                TorrentState::Uploading,
                "http://example.com/announce",
                "/data/iso",
            ),
            torrent(
                "Show",
                TorrentState::Downloading,
                "udp://other.org:80",
                "/data/tv",
            ),
        ]
    }

    fn names<'a>(rows: &[&'a Torrent]) -> Vec<&'a str> {
        rows.iter().map(|torrent| torrent.name.as_str()).collect()
    }

    #[test]
    fn empty_set_accepts_everything() {
        let torrents = collection();
        assert_eq!(FilterSet::default().apply(&torrents).len(), 3);
    }

    #[test]
    fn stacked_policy_keeps_both_taxonomies() {
        let torrents = collection();
        let tracker = NodeKey::Tracker("example.com".to_string());
        let status = NodeKey::Status(StatusGroup::Download);
        let filters = compose_filter(&FilterSet::default(), &tracker, SelectionPolicy::Stacked);
        let filters = compose_filter(&filters, &status, SelectionPolicy::Stacked);
        assert!(filters.is_active(Dimension::Tracker));
        assert!(filters.is_active(Dimension::State));
        assert_eq!(names(&filters.apply(&torrents)), vec!["Debian"]);
    }

    #[test]
    fn exclusive_policy_resets_previous_taxonomy() {
        let torrents = collection();
        let tracker = NodeKey::Tracker("example.com".to_string());
        let status = NodeKey::Status(StatusGroup::Download);
        let filters = compose_filter(&FilterSet::default(), &tracker, SelectionPolicy::Exclusive);
        let filters = compose_filter(&filters, &status, SelectionPolicy::Exclusive);
        assert!(!filters.is_active(Dimension::Tracker));
        assert_eq!(
            filters.get(Dimension::Tracker).map(Predicate::mode),
            Some(MatchMode::Universal)
        );
        assert_eq!(names(&filters.apply(&torrents)), vec!["Debian", "Show"]);
    }

    #[test]
    fn selecting_same_node_twice_is_idempotent() {
        let key = NodeKey::Status(StatusGroup::Upload);
        let once = compose_filter(&FilterSet::default(), &key, SelectionPolicy::Exclusive);
        let twice = compose_filter(&once, &key, SelectionPolicy::Exclusive);
        assert_eq!(once, twice);
    }

    #[test]
    fn switching_within_taxonomy_replaces_in_place() {
        let torrents = collection();
        let filters = compose_filter(
            &FilterSet::default(),
            &NodeKey::Status(StatusGroup::Download),
            SelectionPolicy::Exclusive,
        );
        let filters = compose_filter(
            &filters,
            &NodeKey::Status(StatusGroup::Upload),
            SelectionPolicy::Exclusive,
        );
        assert_eq!(filters.active().count(), 1);
        assert_eq!(names(&filters.apply(&torrents)), vec!["Ubuntu"]);
    }

    #[test]
    fn root_selection_clears_previous_filter() {
        let torrents = collection();
        let filters = compose_filter(
            &FilterSet::default(),
            &NodeKey::Folder("/data/tv".to_string()),
            SelectionPolicy::Exclusive,
        );
        assert_eq!(names(&filters.apply(&torrents)), vec!["Show"]);
        let filters = compose_filter(
            &filters,
            &NodeKey::Root(Taxonomy::Status),
            SelectionPolicy::Exclusive,
        );
        assert_eq!(filters.active().count(), 0);
        assert_eq!(filters.apply(&torrents).len(), 3);
    }

    #[test]
    fn folder_filter_matches_whole_segments() {
        let torrents = vec![
            torrent("a", TorrentState::Uploading, "", "/a/b"),
            torrent("ab", TorrentState::Uploading, "", "/ab"),
        ];
        let filters = compose_filter(
            &FilterSet::default(),
            &NodeKey::Folder("/a".to_string()),
            SelectionPolicy::Exclusive,
        );
        assert_eq!(names(&filters.apply(&torrents)), vec!["a"]);
    }

    #[test]
    fn search_ands_with_structural_filters() {
        let torrents = collection();
        let mut composer = FilterComposer::new(SelectionPolicy::Exclusive);
        composer.select_node(&NodeKey::Status(StatusGroup::Download));
        composer.set_search("DEB", false).expect("plain search");
        assert_eq!(names(&composer.filters().apply(&torrents)), vec!["Debian"]);
        composer.set_search("", false).expect("clear search");
        assert_eq!(composer.filters().apply(&torrents).len(), 2);
    }

    #[test]
    fn search_covers_path_and_tracker() {
        let torrents = collection();
        let by_path = FilterSet::default().with_search("/TV", false).expect("search");
        assert_eq!(names(&by_path.apply(&torrents)), vec!["Show"]);
        let by_tracker = FilterSet::default().with_search("other.org", false).expect("search");
        assert_eq!(names(&by_tracker.apply(&torrents)), vec!["Show"]);
    }

    #[test]
    fn regex_search_is_case_insensitive_and_validated() {
        let torrents = collection();
        let filters = FilterSet::default()
            .with_search("^(debian|ubuntu)$", true)
            .expect("valid regex");
        assert_eq!(names(&filters.apply(&torrents)), vec!["Debian", "Ubuntu"]);

        let mut composer = FilterComposer::default();
        let err = composer.set_search("(", true).expect_err("invalid regex");
        assert!(matches!(err, FilterError::InvalidPattern { .. }));
        assert!(composer.filters().get(Dimension::Global).is_none());
    }

    #[test]
    fn deselect_resets_selected_dimension() {
        let torrents = collection();
        let mut composer = FilterComposer::new(SelectionPolicy::Stacked);
        composer.select_node(&NodeKey::Tracker("other.org".to_string()));
        assert_eq!(composer.filters().apply(&torrents).len(), 1);
        let filters = composer.deselect();
        assert!(filters.selection().is_none());
        assert_eq!(filters.apply(&torrents).len(), 3);
    }

    #[test]
    fn unknown_tracker_node_matches_trackerless_torrents() {
        let torrents = vec![
            torrent("a", TorrentState::Uploading, "", ""),
            torrent("b", TorrentState::Uploading, "http://x.org/a", ""),
        ];
        let filters = compose_filter(
            &FilterSet::default(),
            &NodeKey::Tracker(crate::host::UNKNOWN_HOST.to_string()),
            SelectionPolicy::Exclusive,
        );
        assert_eq!(names(&filters.apply(&torrents)), vec!["a"]);
    }
}
