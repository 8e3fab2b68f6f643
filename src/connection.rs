//! Bridges one WebSocket to the coordinator.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, instrument, warn};

use crate::coordinator::MatchCoordinator;
use crate::protocol::{self, Intent, ServerMessage};
use crate::session::ConnectionId;

/// Decodes a text frame and forwards each intent in order.
#[instrument(skip(coordinator, text))]
pub async fn handle_frame(coordinator: &MatchCoordinator, id: ConnectionId, text: &str) {
    for intent in protocol::decode(text) {
        match intent {
            Intent::Join(side) => coordinator.request_join(id, side).await,
            Intent::Move(cell) => coordinator.submit_move(id, cell).await,
            Intent::Leave => coordinator.leave(id).await,
        }
    }
}

/// Serves one socket until it closes.
///
/// A writer task drains the connection's outbox and pings every
/// `keep_alive`; this task reads frames. When the socket closes the
/// connection is unregistered, which ends any game it was in.
#[instrument(skip(socket, coordinator))]
pub async fn serve_socket(socket: WebSocket, coordinator: Arc<MatchCoordinator>, keep_alive: Duration) {
    let (id, outbox) = coordinator.connect().await;
    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_loop(id, sink, outbox, keep_alive));

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_frame(&coordinator, id, text.as_str()).await,
            Ok(Message::Binary(_)) => warn!(%id, "Ignoring binary frame"),
            Ok(Message::Close(_)) => break,
            // axum answers pings itself.
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                debug!(%id, error = %e, "Socket read failed");
                break;
            }
        }
    }

    coordinator.disconnect(id).await;
    writer.abort();
}

async fn write_loop<S>(
    id: ConnectionId,
    mut sink: S,
    mut outbox: UnboundedReceiver<ServerMessage>,
    keep_alive: Duration,
) where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let mut ticker = tokio::time::interval(keep_alive);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            message = outbox.recv() => {
                let Some(message) = message else { break };
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(%id, error = %e, "Failed to encode message");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    debug!(%id, error = %e, "Socket write failed");
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    debug!(%id, error = %e, "Keep-alive ping failed");
                    break;
                }
            }
        }
    }
}
