//! Infrastructure layer: wire formats and concrete implementations of the
//! domain ports.

pub mod dto;
pub mod message_pusher;
pub mod overlay;
pub mod repository;
