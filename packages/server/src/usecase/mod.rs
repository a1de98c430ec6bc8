//! UseCase layer: one use case per bridge operation.

mod connect_client;
mod disconnect_client;
mod error;
mod join_room;
mod leave_room;
mod relay_peer_events;
mod send_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{JoinRoomError, LeaveRoomError, SendMessageError};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use relay_peer_events::PeerRelay;
pub use send_message::SendMessageUseCase;
