//! UseCase errors.
//!
//! The `Display` text of these errors is what the client receives in an
//! `error` envelope.

use thiserror::Error;

use crate::domain::OverlayError;

/// Errors of [`super::JoinRoomUseCase`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("Client '{0}' is not registered")]
    ClientNotFound(String),

    /// Destroying the previous session failed; it has been dropped anyway.
    #[error("Failed to leave previous room: {0}")]
    Teardown(OverlayError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),
}

/// Errors of [`super::SendMessageUseCase`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("Not connected to a room")]
    NotInRoom,

    #[error("Failed to encode chat message: {0}")]
    Encode(String),
}

/// Errors of [`super::LeaveRoomUseCase`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveRoomError {
    /// Destroying the session failed; it has been dropped anyway.
    #[error("Failed to leave room: {0}")]
    Teardown(OverlayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_in_room_message() {
        // テスト項目: ルーム未参加エラーのメッセージはクライアント向けの固定文言
        // given (前提条件):
        let error = SendMessageError::NotInRoom;

        // when (操作):
        let message = error.to_string();

        // then (期待する結果):
        assert_eq!(message, "Not connected to a room");
    }

    #[test]
    fn test_overlay_error_is_transparent() {
        // テスト項目: オーバーレイのエラーはそのままの文言で報告される
        // given (前提条件):
        let error = JoinRoomError::from(OverlayError::JoinFailed("dht unreachable".to_string()));

        // when (操作):
        let message = error.to_string();

        // then (期待する結果):
        assert_eq!(message, "Failed to join topic: dht unreachable");
    }
}
