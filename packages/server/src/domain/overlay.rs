//! Overlay network port.
//!
//! The bridge only depends on these traits. A provider discovers peers
//! interested in a [`Topic`] and hands back one duplex byte stream per peer;
//! NAT traversal, routing and transport security are its business.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{
    error::OverlayError,
    value_object::{PeerId, Topic},
};

/// Receiver of every event raised by one overlay handle.
pub type OverlayEvents = mpsc::UnboundedReceiver<OverlayEvent>;

/// Events raised by an overlay handle, delivered in order per peer stream.
pub enum OverlayEvent {
    /// A new peer connection has been established.
    Connection {
        peer: PeerId,
        stream: Arc<dyn PeerStream>,
    },
    /// A frame arrived on the peer's stream.
    Data { peer: PeerId, payload: Vec<u8> },
    /// The peer's stream closed.
    Closed { peer: PeerId },
    /// The peer's stream failed. A `Closed` event may follow.
    Error { peer: PeerId, reason: String },
}

impl std::fmt::Debug for OverlayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection { peer, .. } => write!(f, "Connection({})", peer.short()),
            Self::Data { peer, payload } => {
                write!(f, "Data({}, {} bytes)", peer.short(), payload.len())
            }
            Self::Closed { peer } => write!(f, "Closed({})", peer.short()),
            Self::Error { peer, reason } => write!(f, "Error({}, {})", peer.short(), reason),
        }
    }
}

/// Roles taken when joining a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    /// Actively seek peers announcing the topic.
    pub client: bool,
    /// Accept connections from peers seeking the topic.
    pub server: bool,
}

impl JoinOptions {
    pub const BOTH: Self = Self {
        client: true,
        server: true,
    };

    /// Whether a handle with these roles connects to one with `other`.
    pub fn compatible_with(&self, other: &JoinOptions) -> bool {
        (self.client && other.server) || (self.server && other.client)
    }
}

/// Completion signal of a topic announcement.
pub struct Discovery {
    flushed: oneshot::Receiver<Result<(), OverlayError>>,
}

impl Discovery {
    /// Create a discovery and the sender used by the provider to resolve it.
    pub fn channel() -> (oneshot::Sender<Result<(), OverlayError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { flushed: rx })
    }

    /// Resolves once the topic has been announced to the network.
    pub async fn flushed(self) -> Result<(), OverlayError> {
        self.flushed.await.unwrap_or(Err(OverlayError::Destroyed))
    }
}

/// Duplex byte stream to one peer.
pub trait PeerStream: Send + Sync {
    /// Queue a frame for the peer. Delivery is not confirmed.
    fn write(&self, payload: Vec<u8>) -> Result<(), OverlayError>;
}

/// One membership in the overlay network.
#[async_trait]
pub trait OverlayHandle: Send + Sync {
    /// Public identity of this handle.
    fn public_key(&self) -> PeerId;

    /// Announce and look up `topic`.
    async fn join(&mut self, topic: Topic, options: JoinOptions)
    -> Result<Discovery, OverlayError>;

    /// Close every connection and leave every topic.
    async fn destroy(&mut self) -> Result<(), OverlayError>;
}

/// Factory of overlay handles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverlayNetwork: Send + Sync {
    async fn open(&self) -> Result<(Box<dyn OverlayHandle>, OverlayEvents), OverlayError>;
}
