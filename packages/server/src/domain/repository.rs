//! Repository trait 定義
//!
//! 接続 ID からセッションへの対応表（プロセス内の唯一の共有状態）を抽象化します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{error::RepositoryError, session::Session, value_object::ConnectionId};

/// Session state of one connection. `None` means "not in a room".
///
/// Holding the lock serializes every state transition of the connection.
pub type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Registry of client connections.
///
/// Insert, lookup and remove are atomic with respect to each other; no caller
/// observes a partially registered connection.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Register a connection with an empty slot.
    async fn insert(&self, connection_id: ConnectionId) -> Result<SessionSlot, RepositoryError>;

    async fn get(&self, connection_id: &ConnectionId) -> Option<SessionSlot>;

    /// Remove the connection, handing back its slot for teardown.
    async fn remove(&self, connection_id: &ConnectionId) -> Option<SessionSlot>;

    async fn count(&self) -> usize;
}
