//! Navigation trees built from classification aggregates.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::classify::{Aggregate, Classification, FolderArena};
use crate::filter::Dimension;
use crate::model::Torrent;
use crate::status::StatusGroup;

/// One of the three classification trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Taxonomy {
    /// Status groups.
    Status,
    /// Tracker hosts.
    Tracker,
    /// Folder prefixes.
    Folder,
}

impl Taxonomy {
    /// Key of the synthetic root node.
    #[must_use]
    pub const fn root_key(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Tracker => "trackers",
            Self::Folder => "folders",
        }
    }

    /// Prefix used for the keys of child nodes.
    #[must_use]
    pub const fn child_prefix(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Tracker => "tracker",
            Self::Folder => "folder",
        }
    }

    /// Filter dimension driven by selections in this taxonomy.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Status => Dimension::State,
            Self::Tracker => Dimension::Tracker,
            Self::Folder => Dimension::SavePath,
        }
    }

    const fn root_label(self) -> &'static str {
        match self {
            Self::Status => "All",
            Self::Tracker => "Trackers",
            Self::Folder => "Folders",
        }
    }

    const fn root_icon(self) -> &'static str {
        match self {
            Self::Status => "pi-home",
            Self::Tracker => "pi-globe",
            Self::Folder => "pi-folder",
        }
    }
}

/// Stable identity of a navigation node.
///
/// Renders as `status`, `trackers`, `folders` for the roots and as
/// `status:<group>`, `tracker:<host>`, `folder:<path>` for children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// Synthetic root of a taxonomy.
    Root(Taxonomy),
    /// Status group node.
    Status(StatusGroup),
    /// Tracker host node.
    Tracker(String),
    /// Folder prefix node keyed by joined path.
    Folder(String),
}

impl NodeKey {
    /// Taxonomy the node belongs to.
    #[must_use]
    pub const fn taxonomy(&self) -> Taxonomy {
        match self {
            Self::Root(taxonomy) => *taxonomy,
            Self::Status(_) => Taxonomy::Status,
            Self::Tracker(_) => Taxonomy::Tracker,
            Self::Folder(_) => Taxonomy::Folder,
        }
    }

    /// Whether the node is a synthetic root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }
}

impl Display for NodeKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(taxonomy) => formatter.write_str(taxonomy.root_key()),
            Self::Status(group) => write!(formatter, "status:{}", group.key()),
            Self::Tracker(host) => write!(formatter, "tracker:{host}"),
            Self::Folder(path) => write!(formatter, "folder:{path}"),
        }
    }
}

impl FromStr for NodeKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        for taxonomy in [Taxonomy::Status, Taxonomy::Tracker, Taxonomy::Folder] {
            if value == taxonomy.root_key() {
                return Ok(Self::Root(taxonomy));
            }
        }
        let (kind, rest) = value
            .split_once(':')
            .ok_or_else(|| format!("node key '{value}' must look like <kind>:<value>"))?;
        if rest.is_empty() {
            return Err(format!("node key '{value}' has an empty value"));
        }
        match kind {
            "status" => rest.parse().map(Self::Status),
            "tracker" => Ok(Self::Tracker(rest.to_string())),
            "folder" => Ok(Self::Folder(rest.to_string())),
            other => Err(format!("unknown node kind '{other}'")),
        }
    }
}

impl Serialize for NodeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Node of a navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupingNode {
    /// Stable identity.
    pub key: NodeKey,
    /// Display label.
    pub label: String,
    /// Icon identifier.
    pub icon: &'static str,
    /// Count and cumulative size of the torrents under the node.
    #[serde(flatten)]
    pub aggregate: Aggregate,
    /// Ordered children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GroupingNode>,
}

impl GroupingNode {
    fn root(taxonomy: Taxonomy, aggregate: Aggregate, children: Vec<Self>) -> Self {
        Self {
            key: NodeKey::Root(taxonomy),
            label: taxonomy.root_label().to_string(),
            icon: taxonomy.root_icon(),
            aggregate,
            children,
        }
    }

    /// Depth-first search for `key`.
    #[must_use]
    pub fn find(&self, key: &NodeKey) -> Option<&Self> {
        if &self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Pre-order walk yielding each node with its depth below `self`.
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, &Self)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// The three navigation trees of one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomies {
    /// Status tree rooted at `All`.
    pub status: GroupingNode,
    /// Flat tracker list rooted at `Trackers`.
    pub trackers: GroupingNode,
    /// Folder hierarchy rooted at `Folders`.
    pub folders: GroupingNode,
}

impl Taxonomies {
    /// Tree for `taxonomy`.
    #[must_use]
    pub const fn tree(&self, taxonomy: Taxonomy) -> &GroupingNode {
        match taxonomy {
            Taxonomy::Status => &self.status,
            Taxonomy::Tracker => &self.trackers,
            Taxonomy::Folder => &self.folders,
        }
    }

    /// Node identified by `key` in the matching tree.
    #[must_use]
    pub fn find(&self, key: &NodeKey) -> Option<&GroupingNode> {
        self.tree(key.taxonomy()).find(key)
    }
}

/// Classify `torrents` and build the navigation trees.
#[must_use]
pub fn classify(torrents: &[Torrent]) -> Taxonomies {
    build_trees(&Classification::from_torrents(torrents))
}

/// Build the navigation trees from precomputed aggregates.
#[must_use]
pub fn build_trees(classification: &Classification) -> Taxonomies {
    let status_children = classification
        .status_groups()
        .map(|(group, aggregate)| GroupingNode {
            key: NodeKey::Status(group),
            label: group.label().to_string(),
            icon: group.icon(),
            aggregate,
            children: Vec::new(),
        })
        .collect();

    let tracker_children = classification
        .trackers()
        .iter()
        .map(|(host, aggregate)| GroupingNode {
            key: NodeKey::Tracker(host.clone()),
            label: host.clone(),
            icon: "pi-server",
            aggregate: *aggregate,
            children: Vec::new(),
        })
        .collect();

    let folders = classification.folders();
    let folder_children = folders
        .roots()
        .iter()
        .filter_map(|&slot| folder_node(folders, slot))
        .collect();

    Taxonomies {
        status: GroupingNode::root(Taxonomy::Status, classification.total, status_children),
        trackers: GroupingNode::root(Taxonomy::Tracker, classification.total, tracker_children),
        folders: GroupingNode::root(Taxonomy::Folder, classification.foldered, folder_children),
    }
}

fn folder_node(arena: &FolderArena, slot: usize) -> Option<GroupingNode> {
    let entry = arena.entry(slot)?;
    Some(GroupingNode {
        key: NodeKey::Folder(entry.path.clone()),
        label: entry.label.clone(),
        icon: "pi-folder",
        aggregate: entry.aggregate,
        children: entry
            .children
            .iter()
            .filter_map(|&child| folder_node(arena, child))
            .collect(),
    })
}
