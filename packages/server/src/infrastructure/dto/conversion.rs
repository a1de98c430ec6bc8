//! Conversion logic between DTOs and domain entities.

use crate::domain::ClientEvent;
use crate::infrastructure::dto::websocket as ws_dto;

// ========================================
// Domain → DTO
// ========================================

impl From<ClientEvent> for ws_dto::ServerMessage {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::JoinSuccess { peer_id } => Self::JoinSuccess { peer_id },
            ClientEvent::Message(message) => Self::Message { message },
            ClientEvent::PeerConnected { peer_id } => Self::PeerConnected { peer_id },
            ClientEvent::PeerDisconnected { peer_id } => Self::PeerDisconnected { peer_id },
            ClientEvent::SendSuccess => Self::SendSuccess,
            ClientEvent::LeaveSuccess => Self::LeaveSuccess,
            ClientEvent::Error { message } => Self::Error { message },
        }
    }
}
