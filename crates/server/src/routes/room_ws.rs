//! WebSocket room feed. Subscribers get every room event as one JSON
//! frame, in the order the room applied them. The feed is one-way; state
//! changes go through the REST endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path,
    },
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;
use crate::rooms::events::RoomEvent;
use crate::rooms::registry::Rooms;

/// GET /ws/room/{room_id}
pub async fn room_events(
    Extension(rooms): Extension<Arc<Rooms>>,
    Path(room_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let room = rooms.get(room_id).await?;
    let events = room.subscribe();
    Ok(ws.on_upgrade(move |socket| stream_events(socket, events)))
}

async fn stream_events(socket: WebSocket, mut events: broadcast::Receiver<RoomEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let frame = serde_json::to_string(&event).unwrap();
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                    if matches!(event, RoomEvent::Deleted) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // A subscriber that cannot keep up is cut loose rather
                    // than allowed to stall the room; it reconnects and
                    // resyncs from a snapshot.
                    tracing::debug!("Dropping lagged room subscriber ({skipped} events behind)");
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}
