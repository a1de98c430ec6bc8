//! UseCase: メッセージ送信処理
//!
//! チャットメッセージを組み立て、接続中の全ピアのストリームに書き込みます。
//! 個々のピアへの配送は待たず、保証もしません（書き込み失敗はログのみ）。

use std::sync::Arc;

use swarmchat_shared::time::Clock;

use crate::domain::{ChatMessage, ClientEvent, ClientRepository, ConnectionId, MessagePusher};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn ClientRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 書き込みを試みたピアの数（`send-success` は通知済み）
    /// * `Err(SendMessageError::NotInRoom)` - ルームに参加していない
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        content: String,
    ) -> Result<usize, SendMessageError> {
        let Some(slot) = self.repository.get(connection_id).await else {
            return Err(SendMessageError::NotInRoom);
        };
        let current = slot.lock().await;
        let Some(session) = current.as_ref() else {
            return Err(SendMessageError::NotInRoom);
        };

        let identity = session.identity();
        let message = ChatMessage::chat(
            &identity.username,
            &identity.room,
            content,
            self.clock.now_millis(),
        );
        let frame = message
            .to_frame()
            .map_err(|e| SendMessageError::Encode(e.to_string()))?;

        let targets = session.peers().lock().await.connected_streams();
        for (peer, stream) in &targets {
            if let Err(e) = stream.write(frame.clone()) {
                tracing::warn!("Failed to write chat message to {}: {}", peer.short(), e);
            }
        }
        tracing::debug!(
            "[{}] Broadcast chat message to {} peer(s) in \"{}\"",
            identity.username,
            targets.len(),
            identity.room
        );

        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, ClientEvent::SendSuccess)
            .await
        {
            tracing::warn!("Failed to push send-success to '{}': {}", connection_id, e);
        }
        Ok(targets.len())
    }
}
