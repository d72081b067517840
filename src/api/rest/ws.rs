use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::lifecycle::visibility;
use crate::error::AppError;
use crate::identity::Session;
use crate::state::AppState;
use crate::store::OrderFilter;

/// Streams order events the caller is allowed to see. Clients treat each
/// event as a signal to refetch; nothing is replayed on reconnect.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let filter = visibility(&state, &session).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session, filter)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    session: Session,
    filter: OrderFilter,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.order_events_tx.subscribe();

    info!(actor_id = %session.actor_id, role = %session.role, "websocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket subscriber lagged; events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if !filter.matches(&event.order) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize order event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    join_first(send_task, recv_task).await;

    info!(actor_id = %session.actor_id, "websocket client disconnected");
}

/// Waits for either task to finish, then aborts the other and waits for it
/// to unwind so its broadcast receiver is released.
async fn join_first(mut send_task: JoinHandle<()>, mut recv_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }
}
