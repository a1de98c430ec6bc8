//! WebSocket envelope DTOs.
//!
//! Every envelope is a JSON object tagged by `type`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Envelope sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientRequest {
    JoinRoom {
        #[serde(default, deserialize_with = "null_as_empty")]
        username: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        room: String,
    },
    SendMessage {
        #[serde(default, deserialize_with = "null_as_empty")]
        content: String,
    },
    LeaveRoom,
    /// Any other `type`; ignored by the bridge.
    #[serde(other)]
    Unknown,
}

/// Missing and `null` string fields both read as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ClientRequest {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Envelope sent to a client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    JoinSuccess {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
    Message {
        message: Map<String, Value>,
    },
    PeerConnected {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
    PeerDisconnected {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
    SendSuccess,
    LeaveSuccess,
    Error {
        message: String,
    },
}
