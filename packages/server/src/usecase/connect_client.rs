//! UseCase: クライアント接続処理
//!
//! 接続 ID を払い出し、セッションを持たない空のスロットを登録します。

use std::sync::Arc;

use crate::domain::{
    ClientRepository, ConnectionId, MessagePusher, PusherChannel, RepositoryError,
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// Repository（接続レジストリの抽象化）
    repository: Arc<dyn ClientRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectClientUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのエンベロープ送信用チャンネル
    ///
    /// # Returns
    ///
    /// 払い出された接続 ID
    pub async fn execute(&self, sender: PusherChannel) -> Result<ConnectionId, RepositoryError> {
        let connection_id = ConnectionId::generate();
        self.repository.insert(connection_id.clone()).await?;
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Client '{}' connected", connection_id);
        Ok(connection_id)
    }
}
