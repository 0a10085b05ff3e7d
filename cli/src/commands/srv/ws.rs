//! # Progress WebSocket
//!
//! File: cli/src/commands/srv/ws.rs
//!
//! ## Overview
//!
//! `GET /ws/{id}` streams the progress events of one generation as JSON
//! text frames until its `complete` event, then closes the socket.
//!
//! A client that wants every event opens the socket first and then sends
//! `POST /generate` with the same `generation_id`. The listener is
//! registered before the upgrade response is sent, so no event of a
//! generation started after the handshake is missed. If the generation has
//! already finished and its artifact is still stored, the socket receives a
//! single `complete` event and closes.
//!
use super::routes::{parse_id, ApiError, AppState};
use crate::core::id::GenerationId;
use crate::progress::{BroadcasterHandle, ProgressEvent, Subscription};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

/// Upgrade handler for `GET /ws/{id}`.
pub async fn progress_socket(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    // Register before looking at the store: the generate handler stores the
    // artifact before it broadcasts `complete`, so one of the two always sees it.
    let subscription = state.progress.register(id);
    if let Ok(artifact) = state.store.get(id) {
        state.progress.unregister(subscription.id);
        let event = ProgressEvent::succeeded(id, artifact.files.len());
        return Ok(ws.on_upgrade(move |socket| send_once(socket, event)));
    }

    let progress = state.progress.clone();
    Ok(ws.on_upgrade(move |socket| stream_progress(socket, subscription, progress)))
}

fn encode(event: &ProgressEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            warn!("Failed to encode progress event: {}", e);
            None
        }
    }
}

async fn send_once(mut socket: WebSocket, event: ProgressEvent) {
    if let Some(message) = encode(&event) {
        let _ = socket.send(message).await;
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn stream_progress(
    socket: WebSocket,
    mut subscription: Subscription,
    progress: BroadcasterHandle,
) {
    let generation_id: GenerationId = subscription.generation_id;
    debug!(generation_id = %generation_id, "Progress socket opened");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let Some(message) = encode(&event) else { continue };
                if sender.send(message).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients have nothing to say on this channel.
                Some(Ok(_)) => {}
            },
        }
    }

    progress.unregister(subscription.id);
    let _ = sender.send(Message::Close(None)).await;
    debug!(generation_id = %generation_id, "Progress socket closed");
}
