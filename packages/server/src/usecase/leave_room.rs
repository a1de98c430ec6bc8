//! UseCase: ルーム退出処理
//!
//! セッションがあればオーバーレイハンドルの破棄完了を待ってから `leave-success` を返します。
//! セッションが無くても `leave-success` を返します（冪等）。

use std::sync::Arc;

use crate::domain::{ClientEvent, ClientRepository, ConnectionId, MessagePusher};

use super::error::LeaveRoomError;

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn ClientRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ルーム退出を実行
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - セッションを破棄した場合は `true`（`leave-success` は通知済み）
    /// * `Err(LeaveRoomError)` - 破棄に失敗（セッションは取り除かれている）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Result<bool, LeaveRoomError> {
        let mut left = false;
        if let Some(slot) = self.repository.get(connection_id).await {
            let mut current = slot.lock().await;
            if let Some(session) = current.take() {
                let room = session.identity().room.clone();
                session.destroy().await.map_err(LeaveRoomError::Teardown)?;
                tracing::info!("Client '{}' left room \"{}\"", connection_id, room);
                left = true;
            }
        }

        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, ClientEvent::LeaveSuccess)
            .await
        {
            tracing::warn!("Failed to push leave-success to '{}': {}", connection_id, e);
        }
        Ok(left)
    }
}
