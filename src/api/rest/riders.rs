use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::fleet::{list_received_invites, respond_to_invite};
use crate::engine::profiles::set_rider_status;
use crate::error::AppError;
use crate::identity::Session;
use crate::models::invite::{FleetInvite, InviteAction, ReceivedInvite};
use crate::models::profile::{RiderProfile, RiderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rider/invites", get(invites).patch(respond))
        .route("/rider/status", patch(update_status))
}

#[derive(Deserialize)]
pub struct InviteResponse {
    pub invite_id: Uuid,
    pub action: InviteAction,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: RiderStatus,
}

async fn invites(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<ReceivedInvite>>, AppError> {
    list_received_invites(&state, &session).await.map(Json)
}

async fn respond(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<InviteResponse>,
) -> Result<Json<FleetInvite>, AppError> {
    respond_to_invite(&state, &session, payload.invite_id, payload.action)
        .await
        .map(Json)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<RiderProfile>, AppError> {
    set_rider_status(&state, &session, payload.status)
        .await
        .map(Json)
}
