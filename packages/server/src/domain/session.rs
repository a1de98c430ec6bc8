//! Session: one client's active room membership.

use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};

use super::{
    error::OverlayError,
    overlay::OverlayHandle,
    peer_registry::PeerRegistry,
    value_object::{PeerId, RoomName, Username},
};

/// Peer registry shared between a session and its relay task.
pub type SharedPeerRegistry = Arc<Mutex<PeerRegistry>>;

/// Identity attributes chosen by the user when joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub username: Username,
    pub room: RoomName,
}

/// Bundles the overlay handle, the peer registry and the relay task of one
/// room membership.
///
/// A session must be torn down with [`Session::destroy`]; dropping it only
/// stops the relay task.
pub struct Session {
    identity: SessionIdentity,
    local_peer_id: PeerId,
    joined_at: i64,
    overlay: Box<dyn OverlayHandle>,
    peers: SharedPeerRegistry,
    relay: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(
        identity: SessionIdentity,
        overlay: Box<dyn OverlayHandle>,
        peers: SharedPeerRegistry,
        joined_at: i64,
    ) -> Self {
        let local_peer_id = overlay.public_key();
        Self {
            identity,
            local_peer_id,
            joined_at,
            overlay,
            peers,
            relay: None,
        }
    }

    /// Attach the task consuming this session's overlay events.
    pub fn attach_relay(&mut self, relay: JoinHandle<()>) {
        if let Some(previous) = self.relay.replace(relay) {
            previous.abort();
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    pub fn joined_at(&self) -> i64 {
        self.joined_at
    }

    pub fn peers(&self) -> &SharedPeerRegistry {
        &self.peers
    }

    /// Stop the relay, destroy the overlay handle and clear the registry.
    ///
    /// Once this returns no event of the session reaches the client, even if
    /// the overlay destruction failed.
    pub async fn destroy(mut self) -> Result<(), OverlayError> {
        if let Some(relay) = self.relay.take() {
            relay.abort();
            // Cancellation is the expected outcome here.
            let _ = relay.await;
        }
        let result = self.overlay.destroy().await;
        self.peers.lock().await.clear();
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(relay) = self.relay.take() {
            relay.abort();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("local_peer_id", &self.local_peer_id)
            .field("joined_at", &self.joined_at)
            .finish_non_exhaustive()
    }
}
