//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientEvent, ConnectionId, RoomName, Username},
    infrastructure::dto::websocket::ClientRequest,
    ui::state::AppState,
    usecase::{JoinRoomError, LeaveRoomError, SendMessageError},
};

/// Failure of one client request, reported back as an `error` envelope
#[derive(Debug, Error)]
enum RequestError {
    #[error("Invalid message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid message: binary frame is not valid UTF-8")]
    NotUtf8,

    #[error(transparent)]
    JoinRoom(#[from] JoinRoomError),

    #[error(transparent)]
    SendMessage(#[from] SendMessageError),

    #[error(transparent)]
    LeaveRoom(#[from] LeaveRoomError),
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives envelopes from the rx channel and pushes them to the WebSocket sender.
///
/// Every envelope for this client, from request replies and from the peer
/// relay alike, flows through this single task, so frames are never
/// interleaved.
///
/// # Arguments
///
/// * `rx` - Channel receiver for envelopes addressed to this client
/// * `sender` - WebSocket sink to send envelopes to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = match state.connect_client_usecase.execute(tx).await {
        Ok(connection_id) => connection_id,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };

    let mut send_task = pusher_loop(rx, sender);

    // Requests are handled inline, one at a time, in arrival order.
    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            _ = &mut send_task => {
                tracing::warn!("Outbound stream of '{}' closed", connection_id);
                break;
            }
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => Ok(text.to_string()),
            Some(Ok(Message::Binary(bytes))) => {
                String::from_utf8(bytes.to_vec()).map_err(|_| RequestError::NotUtf8)
            }
            Some(Ok(Message::Ping(_))) => {
                tracing::debug!("Received ping");
                continue;
            }
            Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) => {
                tracing::info!("Client '{}' requested close", connection_id);
                break;
            }
            Some(Err(e)) => {
                tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
            None => break,
        };

        match text {
            Ok(text) => handle_text_frame(&state, &connection_id, &text).await,
            Err(e) => report_error(&state, &connection_id, e).await,
        }
    }

    send_task.abort();

    state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await;
}

/// Handle one text frame of a client.
///
/// Failures are answered with exactly one `error` envelope; the connection
/// stays open.
async fn handle_text_frame(state: &AppState, connection_id: &ConnectionId, text: &str) {
    if let Err(e) = dispatch(state, connection_id, text).await {
        report_error(state, connection_id, e).await;
    }
}

async fn dispatch(
    state: &AppState,
    connection_id: &ConnectionId,
    text: &str,
) -> Result<(), RequestError> {
    match ClientRequest::parse(text)? {
        ClientRequest::JoinRoom { username, room } => {
            tracing::info!(
                "Client '{}' joining room '{}' as '{}'",
                connection_id,
                room,
                username
            );
            state
                .join_room_usecase
                .execute(connection_id, Username::new(username), RoomName::new(room))
                .await?;
        }
        ClientRequest::SendMessage { content } => {
            let delivered = state
                .send_message_usecase
                .execute(connection_id, content)
                .await?;
            tracing::debug!(
                "Message from '{}' written to {} peer(s)",
                connection_id,
                delivered
            );
        }
        ClientRequest::LeaveRoom => {
            state.leave_room_usecase.execute(connection_id).await?;
        }
        ClientRequest::Unknown => {
            tracing::warn!("Ignoring request of unknown type from '{}'", connection_id);
        }
    }
    Ok(())
}

async fn report_error(state: &AppState, connection_id: &ConnectionId, error: RequestError) {
    tracing::error!("Request from '{}' failed: {}", connection_id, error);
    if let Err(e) = state
        .message_pusher
        .push_to(connection_id, ClientEvent::error(error.to_string()))
        .await
    {
        tracing::warn!("Failed to report error to '{}': {}", connection_id, e);
    }
}
