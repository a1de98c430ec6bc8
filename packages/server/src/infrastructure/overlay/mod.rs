//! Overlay network providers.

pub mod loopback;

pub use loopback::LoopbackOverlay;
