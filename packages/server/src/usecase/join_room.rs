//! UseCase: ルーム参加処理
//!
//! 1. 既存のセッションがあれば完全に破棄する（破棄完了を待ってから次へ進む）
//! 2. 新しいオーバーレイハンドルを開き、ルーム名の SHA-256 をトピックとして参加する
//! 3. `join-success` を通知してからピアイベントのリレーを開始する
//!
//! 接続ごとのスロットのロックを保持したまま実行するため、同じ接続の
//! join / send / leave は受信順に一つずつ処理されます。

use std::sync::Arc;

use swarmchat_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ClientEvent, ClientRepository, ConnectionId, JoinOptions, MessagePusher, OverlayNetwork,
    PeerId, PeerRegistry, RoomName, Session, SessionIdentity, SharedPeerRegistry, Username,
};

use super::{error::JoinRoomError, relay_peer_events::PeerRelay};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn ClientRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    overlay: Arc<dyn OverlayNetwork>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        overlay: Arc<dyn OverlayNetwork>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            overlay,
            clock,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加するクライアントの接続 ID
    /// * `username` - 表示名（空文字も検証せずそのまま使う）
    /// * `room` - ルーム名（空文字も検証せずそのまま使う）
    ///
    /// # Returns
    ///
    /// * `Ok(PeerId)` - ローカルのピア ID（`join-success` は通知済み）
    /// * `Err(JoinRoomError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        username: Username,
        room: RoomName,
    ) -> Result<PeerId, JoinRoomError> {
        let slot = self
            .repository
            .get(connection_id)
            .await
            .ok_or_else(|| JoinRoomError::ClientNotFound(connection_id.as_str().to_string()))?;
        let mut current = slot.lock().await;

        // 1. 既存セッションの破棄（二つのメンバーシップを同時に持たない）
        if let Some(previous) = current.take() {
            let previous_room = previous.identity().room.clone();
            previous.destroy().await.map_err(JoinRoomError::Teardown)?;
            tracing::info!(
                "Client '{}' left room \"{}\" before rejoining",
                connection_id,
                previous_room
            );
        }

        // 2. オーバーレイへの参加
        let identity = SessionIdentity { username, room };
        let (mut handle, events) = self.overlay.open().await?;
        let topic = identity.room.topic();
        tracing::info!(
            "Joining room \"{}\" with topic: {}",
            identity.room,
            topic.to_hex()
        );
        let discovery = match handle.join(topic, JoinOptions::BOTH).await {
            Ok(discovery) => discovery,
            Err(e) => {
                if let Err(destroy_error) = handle.destroy().await {
                    tracing::warn!("Failed to destroy overlay handle: {}", destroy_error);
                }
                return Err(e.into());
            }
        };
        let announced_room = identity.room.clone();
        tokio::spawn(async move {
            match discovery.flushed().await {
                Ok(()) => tracing::info!("Successfully announced room \"{}\"", announced_room),
                Err(e) => tracing::warn!("Announcing room \"{}\" failed: {}", announced_room, e),
            }
        });

        let peers: SharedPeerRegistry = Arc::new(Mutex::new(PeerRegistry::new()));
        let mut session = Session::new(
            identity.clone(),
            handle,
            peers.clone(),
            self.clock.now_millis(),
        );
        let local_peer_id = session.local_peer_id().clone();

        // 3. join-success を先に通知し、その後にピアイベントを流す
        if let Err(e) = self
            .message_pusher
            .push_to(
                connection_id,
                ClientEvent::JoinSuccess {
                    peer_id: local_peer_id.short().to_string(),
                },
            )
            .await
        {
            tracing::warn!("Failed to push join-success to '{}': {}", connection_id, e);
        }
        let relay = PeerRelay::new(
            connection_id.clone(),
            identity,
            peers,
            self.message_pusher.clone(),
            self.clock.clone(),
        );
        session.attach_relay(relay.spawn(events));
        *current = Some(session);

        tracing::info!(
            "Client '{}' joined as peer {}",
            connection_id,
            local_peer_id.short()
        );
        Ok(local_peer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Discovery, OverlayError, OverlayEvents, OverlayHandle, Topic, overlay::MockOverlayNetwork,
    };
    use crate::usecase::test_support::{
        FailingTeardownHandle, Fixture, assert_no_envelope, expect_closed, expect_connection, expect_data,
        next_envelope,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join-room でセッションが作られ、join-success が通知されること
    // - 同じルームのピアと接続され、join 告知が送られること
    // - 再 join で古いセッションが完全に破棄されてから新しいセッションが有効になること
    // - オーバーレイの失敗がエラーとして返ること
    // ========================================

    fn names(username: &str, room: &str) -> (Username, RoomName) {
        (
            Username::new(username.to_string()),
            RoomName::new(room.to_string()),
        )
    }

    #[tokio::test]
    async fn test_join_creates_session_and_reports_short_id() {
        // テスト項目: 参加するとセッションが作られ、短縮ピア ID が通知される
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, mut rx) = fixture.connect().await;
        let (username, room) = names("bob", "lobby");

        // when (操作):
        let local = fixture
            .join_room()
            .execute(&connection_id, username, room.clone())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            next_envelope(&mut rx).await,
            json!({"type": "join-success", "peerId": local.short()})
        );
        let slot = fixture.repository.get(&connection_id).await.unwrap();
        let current = slot.lock().await;
        let session = current.as_ref().unwrap();
        assert_eq!(session.identity().room, room);
        assert_eq!(session.local_peer_id(), &local);
        assert_eq!(session.joined_at(), Fixture::NOW);
        assert_eq!(fixture.overlay.announced(&room.topic()), 1);
    }

    #[tokio::test]
    async fn test_join_connects_to_peer_and_sends_announcement() {
        // テスト項目: 同じルームのピアと接続し、そのピアにだけ join 告知を送る
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, mut rx) = fixture.connect().await;
        let (mut remote, mut remote_events) = fixture.open_peer("lobby").await;
        let (username, room) = names("bob", "lobby");

        // when (操作):
        let local = fixture
            .join_room()
            .execute(&connection_id, username, room)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(next_envelope(&mut rx).await["type"], "join-success");
        assert_eq!(
            next_envelope(&mut rx).await,
            json!({"type": "peer-connected", "peerId": remote.public_key().short()})
        );
        let (seen, _stream) = expect_connection(&mut remote_events).await;
        assert_eq!(seen, local);
        assert_eq!(
            expect_data(&mut remote_events).await,
            json!({
                "type": "join",
                "sender": "bob",
                "content": "bob joined the chat",
                "timestamp": Fixture::NOW,
                "room": "lobby"
            })
        );
        remote.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_names_are_used_verbatim() {
        // テスト項目: 空のユーザー名・ルーム名でもクラッシュせずそのまま使われる
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, mut rx) = fixture.connect().await;
        let (username, room) = names("", "");

        // when (操作):
        let result = fixture
            .join_room()
            .execute(&connection_id, username, room.clone())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(next_envelope(&mut rx).await["type"], "join-success");
        assert_eq!(fixture.overlay.announced(&room.topic()), 1);
    }

    #[tokio::test]
    async fn test_rejoin_destroys_previous_session_first() {
        // テスト項目: 再 join で古いセッションが破棄され、以降古いピアのイベントは届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, mut rx) = fixture.connect().await;
        let (old_remote, mut old_events) = fixture.open_peer("lobby").await;
        let (username, room) = names("bob", "lobby");
        let first = fixture
            .join_room()
            .execute(&connection_id, username, room.clone())
            .await
            .unwrap();
        let _ = next_envelope(&mut rx).await; // join-success
        let _ = next_envelope(&mut rx).await; // peer-connected
        let (_, old_stream) = expect_connection(&mut old_events).await;
        let _ = expect_data(&mut old_events).await; // join announcement

        // when (操作):
        let (username, garden) = names("bob", "garden");
        let second = fixture
            .join_room()
            .execute(&connection_id, username, garden.clone())
            .await
            .unwrap();

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(
            next_envelope(&mut rx).await,
            json!({"type": "join-success", "peerId": second.short()})
        );
        // 古いピアは切断を観測し、古いトピックからは外れている
        assert_eq!(expect_closed(&mut old_events).await, first);
        assert_eq!(fixture.overlay.announced(&room.topic()), 1);
        assert_eq!(fixture.overlay.announced(&garden.topic()), 1);
        assert_eq!(fixture.overlay.members(), 2);
        // 古いストリームへの書き込みはもう届かない
        assert!(
            old_stream
                .write(br#"{"type":"chat","sender":"ghost"}"#.to_vec())
                .is_err()
        );
        assert_no_envelope(&mut rx).await;
        drop(old_remote);
    }

    struct FailingJoinHandle;

    #[async_trait]
    impl OverlayHandle for FailingJoinHandle {
        fn public_key(&self) -> PeerId {
            PeerId::from_public_key(&[1; 32])
        }

        async fn join(
            &mut self,
            _topic: Topic,
            _options: JoinOptions,
        ) -> Result<Discovery, OverlayError> {
            Err(OverlayError::JoinFailed("bootstrap unreachable".to_string()))
        }

        async fn destroy(&mut self) -> Result<(), OverlayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_open_failure_is_reported() {
        // テスト項目: オーバーレイを開けない場合はエラーになり、セッションは作られない
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, mut rx) = fixture.connect().await;
        let mut overlay = MockOverlayNetwork::new();
        overlay
            .expect_open()
            .times(1)
            .returning(|| Err(OverlayError::Provider("no sockets".to_string())));
        let usecase = JoinRoomUseCase::new(
            fixture.repository(),
            fixture.pusher(),
            Arc::new(overlay),
            fixture.clock(),
        );
        let (username, room) = names("bob", "lobby");

        // when (操作):
        let result = usecase.execute(&connection_id, username, room).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinRoomError::Overlay(OverlayError::Provider(
                "no sockets".to_string()
            )))
        );
        let slot = fixture.repository.get(&connection_id).await.unwrap();
        assert!(slot.lock().await.is_none());
        assert_no_envelope(&mut rx).await;
    }

    #[tokio::test]
    async fn test_topic_join_failure_is_reported() {
        // テスト項目: トピック参加に失敗した場合はエラーになり、セッションは作られない
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, _rx) = fixture.connect().await;
        let mut overlay = MockOverlayNetwork::new();
        overlay.expect_open().times(1).returning(|| {
            let (_tx, events): (_, OverlayEvents) = mpsc::unbounded_channel();
            Ok((Box::new(FailingJoinHandle) as Box<dyn OverlayHandle>, events))
        });
        let usecase = JoinRoomUseCase::new(
            fixture.repository(),
            fixture.pusher(),
            Arc::new(overlay),
            fixture.clock(),
        );
        let (username, room) = names("bob", "lobby");

        // when (操作):
        let result = usecase.execute(&connection_id, username, room).await;

        // then (期待する結果):
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Failed to join topic: bootstrap unreachable".to_string())
        );
        let slot = fixture.repository.get(&connection_id).await.unwrap();
        assert!(slot.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_join_unknown_connection() {
        // テスト項目: 未登録の接続での参加はエラーになる
        // given (前提条件):
        let fixture = Fixture::new();
        let (username, room) = names("bob", "lobby");

        // when (操作):
        let result = fixture
            .join_room()
            .execute(&ConnectionId::from("ghost".to_string()), username, room)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinRoomError::ClientNotFound("ghost".to_string()))
        );
        assert_eq!(fixture.overlay.members(), 0);
    }

    #[tokio::test]
    async fn test_rejoin_drops_previous_session_when_teardown_fails() {
        // テスト項目: 古いセッションの破棄に失敗した場合はエラーが返り、古いセッションは取り除かれる
        // given (前提条件):
        let fixture = Fixture::new();
        let (connection_id, mut rx) = fixture.connect().await;
        fixture
            .install_failing_session(&connection_id, "lobby")
            .await;
        let (username, garden) = names("bob", "garden");

        // when (操作):
        let result = fixture
            .join_room()
            .execute(&connection_id, username, garden.clone())
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinRoomError::Teardown(OverlayError::Provider(
                FailingTeardownHandle::REASON.to_string()
            )))
        );
        assert!(!fixture.has_session(&connection_id).await);
        assert_eq!(fixture.overlay.announced(&garden.topic()), 0);
        assert_no_envelope(&mut rx).await;
    }
}
