//! WebSocket handling for real-time graph updates

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use trellis_core::{ClientMessage, GraphMessage};

use crate::ServerState;

type Sender = SplitSink<WebSocket, Message>;

/// Handle WebSocket upgrade requests
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serialize and send one message. `false` when the client is gone.
async fn send(sender: &mut Sender, message: &GraphMessage) -> bool {
    let text = match message.to_json() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize graph message: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(text)).await.is_ok()
}

/// Re-attach to the session and send the snapshot, so that everything later
/// received on the returned channel applies on top of what the client holds.
async fn resync(
    state: &ServerState,
    sender: &mut Sender,
) -> Option<broadcast::Receiver<GraphMessage>> {
    let (snapshot, rx) = state.session.attach().await;
    if let Some(graph) = snapshot {
        if !send(sender, &GraphMessage::GraphUpdate(graph)).await {
            return None;
        }
    }
    Some(rx)
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    info!("New WebSocket connection established");
    let (mut sender, mut receiver) = socket.split();

    let Some(mut rx) = resync(&state, &mut sender).await else {
        warn!("Failed to send initial graph to WebSocket client");
        return;
    };

    loop {
        tokio::select! {
            published = rx.recv() => match published {
                Ok(message) => {
                    if !send(&mut sender, &message).await {
                        debug!("WebSocket client went away");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // The dropped patches cannot be recovered; start over from a snapshot.
                    warn!("WebSocket client lagged by {} messages, resending snapshot", skipped);
                    match resync(&state, &mut sender).await {
                        Some(fresh) => rx = fresh,
                        None => break,
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::RequestGraph) => {
                            debug!("Client requested full graph");
                            match resync(&state, &mut sender).await {
                                Some(fresh) => rx = fresh,
                                None => break,
                            }
                        }
                        Ok(ClientMessage::Ping) => {
                            let pong = serde_json::to_string(&ClientMessage::Pong).unwrap_or_default();
                            if sender.send(Message::Text(pong)).await.is_err() {
                                break;
                            }
                        }
                        Ok(ClientMessage::Pong) => debug!("Received pong"),
                        Err(e) => warn!("Failed to parse WebSocket message: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client disconnected");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("WebSocket receive error: {}", e);
                    break;
                }
            },
        }
    }

    info!("WebSocket connection closed");
}

