//! `GET /ws`: real-time event stream.
//!
//! Each connection registers one bus subscriber and forwards every JSON event
//! as a text frame. Client messages are read (to notice disconnects) but
//! otherwise ignored. The subscriber is removed when the socket closes, when
//! the bus drops it for being too slow, or on server shutdown. Every socket
//! write is bounded by the bus delivery timeout.

use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{select, time};

use super::state::AppState;

/// Handles the WebSocket upgrade request.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    // Register before doing anything else so no event after the upgrade is missed.
    let mut sub = state.bus.subscribe().await;
    let id = sub.id();
    let limit = state.bus.timeout();
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!(subscriber = %id, "websocket connected");

    loop {
        select! {
            // Queued events go out before the shutdown close frame.
            biased;
            payload = sub.recv() => match payload {
                Some(json) => {
                    if !send_frame(&mut sender, Message::Text(json.to_string().into()), limit).await {
                        tracing::debug!(subscriber = %id, "websocket send failed or timed out");
                        break;
                    }
                }
                // Evicted by the bus.
                None => break,
            },
            _ = state.shutdown.cancelled() => {
                send_frame(&mut sender, Message::Close(None), limit).await;
                break;
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.bus.unsubscribe(id).await;
    tracing::debug!(subscriber = %id, "websocket disconnected");
}

/// Sends one frame, giving up after `limit`. Returns false if the socket is unusable.
async fn send_frame(sender: &mut SplitSink<WebSocket, Message>, msg: Message, limit: Duration) -> bool {
    matches!(time::timeout(limit, sender.send(msg)).await, Ok(Ok(())))
}
