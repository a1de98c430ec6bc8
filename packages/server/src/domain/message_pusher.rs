//! MessagePusher trait 定義
//!
//! クライアント接続へのエンベロープ送信を抽象化します。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します。

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// Outbound channel of one client connection (JSON text frames).
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Client-facing events produced by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The connection joined a room; carries the local short peer id.
    JoinSuccess { peer_id: String },
    /// A peer frame, already decorated with the peer's short id.
    Message(Map<String, Value>),
    PeerConnected { peer_id: String },
    PeerDisconnected { peer_id: String },
    SendSuccess,
    LeaveSuccess,
    Error { message: String },
}

impl ClientEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Delivers [`ClientEvent`]s to client connections.
///
/// Pushing is fire-and-forget: it only enqueues the encoded envelope.
#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: ClientEvent,
    ) -> Result<(), MessagePushError>;
}
