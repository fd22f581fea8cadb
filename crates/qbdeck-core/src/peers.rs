//! Peer table maintained from incremental `sync/torrentPeers` responses.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::model::{Peer, PeersDelta};

/// Known peers of one torrent plus the response id for the next request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerTable {
    rid: i64,
    show_flags: bool,
    peers: BTreeMap<String, Map<String, Value>>,
}

impl PeerTable {
    /// Response id to send with the next request.
    #[must_use]
    pub const fn rid(&self) -> i64 {
        self.rid
    }

    /// Whether the server wants peer flags displayed.
    #[must_use]
    pub const fn show_flags(&self) -> bool {
        self.show_flags
    }

    /// Number of known peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peer is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Merge a response into the table.
    ///
    /// A full update replaces every peer; otherwise changed fields are merged
    /// into the existing records and removed peers are dropped.
    pub fn apply(&mut self, delta: PeersDelta) {
        if delta.full_update {
            self.peers.clear();
        }
        if let Some(show_flags) = delta.show_flags {
            self.show_flags = show_flags;
        }
        for (key, changes) in delta.peers.unwrap_or_default() {
            let Value::Object(changes) = changes else {
                continue;
            };
            self.peers.entry(key).or_default().extend(changes);
        }
        for key in delta.peers_removed.unwrap_or_default() {
            self.peers.remove(&key);
        }
        self.rid = delta.rid;
    }

    /// Materialized peers keyed by `ip:port`, sorted by key.
    ///
    /// Records that do not decode are skipped.
    #[must_use]
    pub fn peers(&self) -> Vec<(String, Peer)> {
        self.peers
            .iter()
            .filter_map(|(key, fields)| {
                serde_json::from_value(Value::Object(fields.clone()))
                    .ok()
                    .map(|peer| (key.clone(), peer))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delta(value: Value) -> PeersDelta {
        serde_json::from_value(value).expect("decode delta")
    }

    #[test]
    fn partial_updates_merge_fields() {
        let mut table = PeerTable::default();
        table.apply(delta(json!({
            "rid": 1,
            "full_update": true,
            "show_flags": true,
            "peers": {
                "10.0.0.1:6881": {"ip": "10.0.0.1", "port": 6881, "client": "qBittorrent", "dl_speed": 10}
            }
        })));
        table.apply(delta(json!({
            "rid": 2,
            "peers": {"10.0.0.1:6881": {"dl_speed": 99}}
        })));
        let peers = table.peers();
        assert_eq!(table.rid(), 2);
        assert!(table.show_flags());
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].1.client, "qBittorrent");
        assert_eq!(peers[0].1.dl_speed, 99);
    }

    #[test]
    fn removed_peers_are_dropped_and_full_update_resets() {
        let mut table = PeerTable::default();
        table.apply(delta(json!({
            "rid": 1,
            "full_update": true,
            "peers": {"a:1": {"ip": "a"}, "b:2": {"ip": "b"}}
        })));
        table.apply(delta(json!({"rid": 2, "peers_removed": ["a:1"]})));
        assert_eq!(table.len(), 1);
        table.apply(delta(json!({
            "rid": 3,
            "full_update": true,
            "peers": {"c:3": {"ip": "c"}}
        })));
        let keys: Vec<_> = table.peers().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["c:3"]);
    }
}
