//! UseCase: クライアント切断処理
//!
//! 接続レジストリからの削除は無条件に行い、その後セッションを破棄します。
//! 破棄の失敗は報告先が無いためログのみです。

use std::sync::Arc;

use crate::domain::{ClientRepository, ConnectionId, MessagePusher};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    repository: Arc<dyn ClientRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// クライアント切断を実行
    ///
    /// # Returns
    ///
    /// 接続が登録されていた場合は `true`
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        let slot = self.repository.remove(connection_id).await;
        self.message_pusher.unregister_client(connection_id).await;

        let Some(slot) = slot else {
            tracing::warn!("Client '{}' was not registered", connection_id);
            return false;
        };

        let session = slot.lock().await.take();
        if let Some(session) = session {
            let room = session.identity().room.clone();
            match session.destroy().await {
                Ok(()) => tracing::info!(
                    "Client '{}' disconnected, left room \"{}\"",
                    connection_id,
                    room
                ),
                Err(e) => tracing::error!(
                    "Client '{}' disconnected, failed to tear down room \"{}\": {}",
                    connection_id,
                    room,
                    e
                ),
            }
        } else {
            tracing::info!("Client '{}' disconnected", connection_id);
        }
        tracing::debug!(
            "{} connection(s) remain",
            self.repository.count().await
        );
        true
    }
}
