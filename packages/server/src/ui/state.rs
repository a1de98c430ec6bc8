//! Server state and use case wiring.

use std::sync::Arc;

use swarmchat_shared::time::Clock;

use crate::{
    domain::{ClientRepository, MessagePusher, OverlayNetwork},
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// Used to report request failures back to the client
    pub message_pusher: Arc<dyn MessagePusher>,
}

impl AppState {
    /// Wire every use case onto the given ports.
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        overlay: Arc<dyn OverlayNetwork>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                overlay,
                clock.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock,
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                repository,
                message_pusher.clone(),
            )),
            message_pusher,
        }
    }
}
