//! Data Transfer Objects (DTOs) for the bridge.
//!
//! DTOs are organized by protocol:
//! - `websocket`: client envelopes carried over the WebSocket transport

pub mod conversion;
pub mod websocket;
