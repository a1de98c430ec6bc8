//! UseCase: ピアイベントの中継
//!
//! One relay task runs per session. It consumes the session's overlay events
//! in order and drives each peer through Connected → Disconnected:
//!
//! - `Connection`: register the peer as `Unknown`, send it our join
//!   announcement, notify the client with `peer-connected`.
//! - `Data`: parse the frame, record announced usernames, relay the frame to
//!   the client with the sender decorated by the peer's short id.
//! - `Closed` / `Error`: mark the peer disconnected (the entry is kept) and
//!   notify the client with `peer-disconnected`, once per peer.

use std::sync::Arc;

use swarmchat_shared::time::Clock;
use tokio::task::JoinHandle;

use crate::domain::{
    ChatMessage, ClientEvent, ConnectionId, MessagePusher, OverlayEvent, OverlayEvents,
    PeerEntry, PeerFrame, PeerId, PeerStream, SessionIdentity, SharedPeerRegistry,
    UNKNOWN_USERNAME,
};

/// Translates the overlay events of one session into client envelopes.
pub struct PeerRelay {
    connection_id: ConnectionId,
    identity: SessionIdentity,
    peers: SharedPeerRegistry,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl PeerRelay {
    pub fn new(
        connection_id: ConnectionId,
        identity: SessionIdentity,
        peers: SharedPeerRegistry,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connection_id,
            identity,
            peers,
            message_pusher,
            clock,
        }
    }

    /// Consume `events` on a new task until the overlay handle goes away.
    pub fn spawn(self, events: OverlayEvents) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    pub async fn run(self, mut events: OverlayEvents) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::debug!(
            "[{}] Overlay event stream of '{}' ended",
            self.identity.username,
            self.connection_id
        );
    }

    pub async fn handle_event(&self, event: OverlayEvent) {
        match event {
            OverlayEvent::Connection { peer, stream } => self.on_connection(peer, stream).await,
            OverlayEvent::Data { peer, payload } => self.on_data(peer, &payload).await,
            OverlayEvent::Closed { peer } => self.on_closed(peer).await,
            OverlayEvent::Error { peer, reason } => {
                tracing::error!("Connection error from peer {}: {}", peer.short(), reason);
                self.on_closed(peer).await;
            }
        }
    }

    async fn on_connection(&self, peer: PeerId, stream: Arc<dyn PeerStream>) {
        tracing::info!(
            "[{}] New peer connection from: {}",
            self.identity.username,
            peer.short()
        );

        {
            // The announcement is written before the entry becomes visible to
            // senders, so it always precedes chat content on this stream.
            let mut peers = self.peers.lock().await;
            self.announce_to(&peer, stream.as_ref());
            peers.insert(PeerEntry::new(peer.clone(), stream));
        }

        self.notify(ClientEvent::PeerConnected {
            peer_id: peer.short().to_string(),
        })
        .await;
    }

    fn announce_to(&self, peer: &PeerId, stream: &dyn PeerStream) {
        let announcement = ChatMessage::join_announcement(
            &self.identity.username,
            &self.identity.room,
            self.clock.now_millis(),
        );
        let written = announcement
            .to_frame()
            .map_err(|e| e.to_string())
            .and_then(|frame| stream.write(frame).map_err(|e| e.to_string()));
        if let Err(e) = written {
            tracing::warn!("Failed to send join announcement to {}: {}", peer.short(), e);
        }
    }

    async fn on_data(&self, peer: PeerId, payload: &[u8]) {
        let frame = match PeerFrame::parse(payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Error parsing peer message from {}: {}", peer.short(), e);
                return;
            }
        };

        let known_username = {
            let mut peers = self.peers.lock().await;
            if let Some(username) = frame.announced_username() {
                peers.rename(&peer, username);
            }
            peers
                .get(&peer)
                .map(|entry| entry.username.clone())
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string())
        };

        tracing::debug!(
            "[{}] Relaying {} frame from {}",
            self.identity.username,
            frame.kind().unwrap_or("untyped"),
            peer.short()
        );
        let message = frame.decorate(peer.short(), &known_username);
        self.notify(ClientEvent::Message(message)).await;
    }

    async fn on_closed(&self, peer: PeerId) {
        let transitioned = self.peers.lock().await.mark_disconnected(&peer);
        if !transitioned {
            return;
        }
        tracing::info!("Peer disconnected: {}", peer.short());
        self.notify(ClientEvent::PeerDisconnected {
            peer_id: peer.short().to_string(),
        })
        .await;
    }

    async fn notify(&self, event: ClientEvent) {
        if let Err(e) = self
            .message_pusher
            .push_to(&self.connection_id, event)
            .await
        {
            tracing::debug!(
                "Dropping peer event for client '{}': {}",
                self.connection_id,
                e
            );
        }
    }
}
