//! Swarmchat session bridge library.
//!
//! Relays browser WebSocket clients into topic-based peer-to-peer chat rooms:
//! each client connection owns at most one overlay session, and every frame
//! is translated between the client envelope protocol and the peer protocol.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
