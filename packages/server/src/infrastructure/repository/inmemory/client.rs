//! InMemory Client Repository 実装
//!
//! ドメイン層が定義する ClientRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。状態はプロセスの生存期間のみ保持されます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientRepository, ConnectionId, RepositoryError, SessionSlot};

/// インメモリ Client Repository 実装
///
/// 外側の Mutex は挿入・検索・削除の間だけ保持され、
/// セッションの状態遷移は各接続の [`SessionSlot`] のロックで直列化されます。
#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: Mutex<HashMap<ConnectionId, SessionSlot>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn insert(&self, connection_id: ConnectionId) -> Result<SessionSlot, RepositoryError> {
        let mut clients = self.clients.lock().await;
        if clients.contains_key(&connection_id) {
            return Err(RepositoryError::DuplicateConnection(
                connection_id.as_str().to_string(),
            ));
        }
        let slot: SessionSlot = Arc::new(Mutex::new(None));
        clients.insert(connection_id, slot.clone());
        Ok(slot)
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<SessionSlot> {
        let clients = self.clients.lock().await;
        clients.get(connection_id).cloned()
    }

    async fn remove(&self, connection_id: &ConnectionId) -> Option<SessionSlot> {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id)
    }

    async fn count(&self) -> usize {
        let clients = self.clients.lock().await;
        clients.len()
    }
}
