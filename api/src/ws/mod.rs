//! WebSocket change feed under `/ws/{topic}`.
//!
//! A client subscribes to one table topic and receives every event envelope
//! published after a successful write to that table. The feed is one-way;
//! client text frames are ignored apart from close and ping.

use axum::{
    Json, Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::response::ApiResponse;
use crate::state::{AppState, topics};

pub fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/{topic}", get(topic_handler))
        .with_state(app_state)
}

async fn topic_handler(
    ws: WebSocketUpgrade,
    Path(topic): Path<String>,
    State(state): State<AppState>,
) -> Response {
    if !topics::ALL.contains(&topic.as_str()) {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!("Unknown topic '{topic}'"))),
        )
            .into_response();
    }

    // Subscribe before upgrading so nothing published after the handshake is missed.
    let rx = state.ws().subscribe(&topic).await;
    ws.on_upgrade(move |socket| forward(socket, rx, topic))
}

async fn forward(socket: WebSocket, mut rx: Receiver<String>, topic: String) {
    let (mut tx, mut incoming) = socket.split();
    tracing::debug!("Subscriber joined '{topic}'");

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(text) => {
                    if tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber on '{topic}' lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            },
            frame = incoming.next() => match frame {
                Some(Ok(Message::Ping(payload))) => {
                    if tx.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("Subscriber left '{topic}'");
}
