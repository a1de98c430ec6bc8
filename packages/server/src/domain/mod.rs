//! Domain layer: value objects, entities and the ports of the session bridge.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod overlay;
pub mod peer_registry;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::{ChatMessage, ChatMessageKind, PeerEntry, PeerFrame, UNKNOWN_USERNAME};
pub use error::{MessagePushError, OverlayError, PeerFrameError, RepositoryError};
pub use message_pusher::{ClientEvent, MessagePusher, PusherChannel};
pub use overlay::{
    Discovery, JoinOptions, OverlayEvent, OverlayEvents, OverlayHandle, OverlayNetwork,
    PeerStream,
};
pub use peer_registry::PeerRegistry;
pub use repository::{ClientRepository, SessionSlot};
pub use session::{Session, SessionIdentity, SharedPeerRegistry};
pub use value_object::{ConnectionId, PeerId, RoomName, SHORT_PEER_ID_LEN, Topic, Username};
