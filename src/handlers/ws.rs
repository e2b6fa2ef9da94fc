use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::auth::middleware::{session_from_token, Session};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Browsers cannot set headers on a websocket handshake, so the access token
/// travels as a query parameter.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let session = match query.token.as_deref() {
        Some(token) => session_from_token(token, &state.config),
        None => Err(AppError::Unauthorized),
    };

    match session {
        Ok(session) => ws.on_upgrade(move |socket| handle_socket(socket, state, session)),
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket auth failed");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, session: Session) {
    let user_id = session.user_id;
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.feed.subscribe(user_id);

    tracing::debug!(
        user_id = %user_id,
        session_expires_at = %session.expires_at,
        subscribers = state.feed.subscriber_count(),
        "WebSocket connection established"
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize change event");
                    continue;
                }
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
        subscription.unsubscribe();
    });

    // Clients only send control frames; anything else is logged and ignored
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(user_id = %user_id, message = %text, "WebSocket message ignored");
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Aborting the send task drops its subscription
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}
