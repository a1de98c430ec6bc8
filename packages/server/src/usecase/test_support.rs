//! Shared fixtures for use case tests.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use swarmchat_shared::time::{Clock, FixedClock};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        ClientRepository, ConnectionId, Discovery, JoinOptions, MessagePusher, OverlayError,
        OverlayEvent, OverlayEvents, OverlayHandle, OverlayNetwork, PeerId, PeerRegistry,
        PeerStream, RoomName, Session, SessionIdentity, SharedPeerRegistry, Topic, Username,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher, overlay::LoopbackOverlay,
        repository::InMemoryClientRepository,
    },
};

use super::{
    ConnectClientUseCase, DisconnectClientUseCase, JoinRoomUseCase, LeaveRoomUseCase,
    SendMessageUseCase,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(50);

pub(crate) struct Fixture {
    pub repository: Arc<InMemoryClientRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub overlay: LoopbackOverlay,
}

impl Fixture {
    pub const NOW: i64 = 1_700_000_000_000;

    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryClientRepository::new()),
            pusher: Arc::new(WebSocketMessagePusher::default()),
            overlay: LoopbackOverlay::new(),
        }
    }

    pub fn repository(&self) -> Arc<dyn ClientRepository> {
        self.repository.clone()
    }

    pub fn pusher(&self) -> Arc<dyn MessagePusher> {
        self.pusher.clone()
    }

    pub fn overlay(&self) -> Arc<dyn OverlayNetwork> {
        Arc::new(self.overlay.clone())
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(Self::NOW))
    }

    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectClientUseCase::new(self.repository(), self.pusher())
            .execute(tx)
            .await
            .unwrap();
        (connection_id, rx)
    }

    pub fn join_room(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(self.repository(), self.pusher(), self.overlay(), self.clock())
    }

    pub fn send_message(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(self.repository(), self.pusher(), self.clock())
    }

    pub fn leave_room(&self) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(self.repository(), self.pusher())
    }

    pub fn disconnect_client(&self) -> DisconnectClientUseCase {
        DisconnectClientUseCase::new(self.repository(), self.pusher())
    }

    /// Open a handle acting as a remote peer in `room`.
    pub async fn open_peer(&self, room: &str) -> (Box<dyn OverlayHandle>, OverlayEvents) {
        let (mut handle, events) = self.overlay.open().await.unwrap();
        handle
            .join(RoomName::new(room.to_string()).topic(), JoinOptions::BOTH)
            .await
            .unwrap();
        (handle, events)
    }
}

/// Overlay handle whose teardown always fails.
pub(crate) struct FailingTeardownHandle;

impl FailingTeardownHandle {
    pub const REASON: &'static str = "teardown refused";
}

#[async_trait]
impl OverlayHandle for FailingTeardownHandle {
    fn public_key(&self) -> PeerId {
        PeerId::from_public_key(&[9; 32])
    }

    async fn join(&mut self, _topic: Topic, _options: JoinOptions) -> Result<Discovery, OverlayError> {
        let (flushed, discovery) = Discovery::channel();
        let _ = flushed.send(Ok(()));
        Ok(discovery)
    }

    async fn destroy(&mut self) -> Result<(), OverlayError> {
        Err(OverlayError::Provider(Self::REASON.to_string()))
    }
}

impl Fixture {
    /// Put a session backed by [`FailingTeardownHandle`] into the connection's slot.
    pub async fn install_failing_session(&self, connection_id: &ConnectionId, room: &str) {
        let slot = self.repository.get(connection_id).await.unwrap();
        let identity = SessionIdentity {
            username: Username::new("bob".to_string()),
            room: RoomName::new(room.to_string()),
        };
        let peers: SharedPeerRegistry = Arc::new(Mutex::new(PeerRegistry::new()));
        *slot.lock().await = Some(Session::new(
            identity,
            Box::new(FailingTeardownHandle),
            peers,
            Self::NOW,
        ));
    }

    /// Whether the connection currently holds a session.
    pub async fn has_session(&self, connection_id: &ConnectionId) -> bool {
        match self.repository.get(connection_id).await {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }
}

/// Next envelope pushed to a client, parsed as JSON.
pub(crate) async fn next_envelope(rx: &mut mpsc::UnboundedReceiver<String>) -> Value {
    let text = tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for envelope")
        .expect("client channel closed");
    serde_json::from_str(&text).unwrap()
}

/// Assert that nothing is pushed to the client for a short while.
pub(crate) async fn assert_no_envelope(rx: &mut mpsc::UnboundedReceiver<String>) {
    if let Ok(Some(text)) = tokio::time::timeout(QUIET_PERIOD, rx.recv()).await {
        panic!("unexpected envelope: {}", text);
    }
}

pub(crate) async fn expect_connection(events: &mut OverlayEvents) -> (PeerId, Arc<dyn PeerStream>) {
    match tokio::time::timeout(RECV_TIMEOUT, events.recv()).await {
        Ok(Some(OverlayEvent::Connection { peer, stream })) => (peer, stream),
        other => panic!("expected connection, got {:?}", other),
    }
}

/// Next data frame received by a simulated peer, parsed as JSON.
pub(crate) async fn expect_data(events: &mut OverlayEvents) -> Value {
    match tokio::time::timeout(RECV_TIMEOUT, events.recv()).await {
        Ok(Some(OverlayEvent::Data { payload, .. })) => serde_json::from_slice(&payload).unwrap(),
        other => panic!("expected data, got {:?}", other),
    }
}

pub(crate) async fn expect_closed(events: &mut OverlayEvents) -> PeerId {
    match tokio::time::timeout(RECV_TIMEOUT, events.recv()).await {
        Ok(Some(OverlayEvent::Closed { peer })) => peer,
        other => panic!("expected close, got {:?}", other),
    }
}
