//! Entities exchanged and tracked by the bridge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    error::PeerFrameError,
    overlay::PeerStream,
    value_object::{PeerId, RoomName, Username},
};

/// Display name of a peer that has not announced itself yet.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Kind of a chat frame on the peer wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageKind {
    Join,
    Chat,
}

/// Chat frame written to peer streams.
///
/// Serialized as `{type, sender, content, timestamp, room}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: ChatMessageKind,
    pub sender: String,
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub room: String,
}

impl ChatMessage {
    /// Handshake frame sent to each newly connected peer.
    pub fn join_announcement(username: &Username, room: &RoomName, timestamp: i64) -> Self {
        Self {
            kind: ChatMessageKind::Join,
            sender: username.as_str().to_string(),
            content: format!("{} joined the chat", username),
            timestamp,
            room: room.as_str().to_string(),
        }
    }

    pub fn chat(username: &Username, room: &RoomName, content: String, timestamp: i64) -> Self {
        Self {
            kind: ChatMessageKind::Chat,
            sender: username.as_str().to_string(),
            content,
            timestamp,
            room: room.as_str().to_string(),
        }
    }

    /// Wire form: the JSON text of the message.
    pub fn to_frame(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A frame received from a peer, parsed as a JSON object.
///
/// Peers are not trusted to follow [`ChatMessage`] exactly, so every field they
/// sent is preserved and relayed.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerFrame(Map<String, Value>);

impl PeerFrame {
    pub fn parse(payload: &[u8]) -> Result<Self, PeerFrameError> {
        match serde_json::from_slice::<Value>(payload)? {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(PeerFrameError::NotAnObject),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn sender(&self) -> Option<&str> {
        self.0.get("sender").and_then(Value::as_str)
    }

    /// Username announced by a `join` frame.
    pub fn announced_username(&self) -> Option<&str> {
        match self.kind() {
            Some("join") => self.sender(),
            _ => None,
        }
    }

    /// Replace `sender` with `"<sender> (<short_id>)"`.
    ///
    /// `fallback_sender` stands in when the peer did not send a string sender.
    pub fn decorate(mut self, short_id: &str, fallback_sender: &str) -> Map<String, Value> {
        let sender = self.sender().unwrap_or(fallback_sender);
        let decorated = format!("{} ({})", sender, short_id);
        self.0.insert("sender".to_string(), Value::String(decorated));
        self.0
    }
}

/// Bridge-side record of one peer connection within a session.
///
/// Entries are never removed on disconnect; `connected` is cleared instead.
#[derive(Clone)]
pub struct PeerEntry {
    pub id: PeerId,
    pub username: String,
    pub stream: Arc<dyn PeerStream>,
    pub connected: bool,
}

impl PeerEntry {
    pub fn new(id: PeerId, stream: Arc<dyn PeerStream>) -> Self {
        Self {
            id,
            username: UNKNOWN_USERNAME.to_string(),
            stream,
            connected: true,
        }
    }
}

impl std::fmt::Debug for PeerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerEntry")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}
