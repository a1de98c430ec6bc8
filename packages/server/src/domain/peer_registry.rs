//! Per-session registry of peer connections.

use std::{collections::HashMap, sync::Arc};

use super::{entity::PeerEntry, overlay::PeerStream, value_object::PeerId};

/// Mapping from full peer identifier to [`PeerEntry`].
///
/// Owned by exactly one session. Disconnected peers stay in the map with
/// `connected == false` so their short identifier remains attributable.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<PeerId, PeerEntry>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly established connection, replacing any previous entry
    /// for the same peer.
    pub fn insert(&mut self, entry: PeerEntry) {
        self.peers.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&PeerEntry> {
        self.peers.get(peer_id)
    }

    /// Set the display username of a peer. Last writer wins.
    ///
    /// Returns `false` if the peer is unknown.
    pub fn rename(&mut self, peer_id: &PeerId, username: &str) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(entry) => {
                entry.username = username.to_string();
                true
            }
            None => false,
        }
    }

    /// Mark a peer as disconnected.
    ///
    /// Returns `true` only on the connected → disconnected transition.
    pub fn mark_disconnected(&mut self, peer_id: &PeerId) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(entry) if entry.connected => {
                entry.connected = false;
                true
            }
            _ => false,
        }
    }

    /// Streams of every peer currently marked connected.
    pub fn connected_streams(&self) -> Vec<(PeerId, Arc<dyn PeerStream>)> {
        self.peers
            .values()
            .filter(|entry| entry.connected)
            .map(|entry| (entry.id.clone(), entry.stream.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
