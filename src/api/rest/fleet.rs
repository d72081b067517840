use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::fleet::{
    invite_rider, list_fleet, list_sent_invites, remove_from_fleet, update_rider_details,
    RiderDetails,
};
use crate::engine::provisioning::{create_rider, CreatedRider, NewRiderRequest};
use crate::error::AppError;
use crate::identity::Session;
use crate::models::invite::FleetInvite;
use crate::models::partner::FleetRider;
use crate::models::profile::RiderProfile;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fleet", get(list))
        .route("/fleet/riders", post(provision))
        .route("/fleet/invites", get(sent_invites).post(invite))
        .route("/fleet/:rider_id", put(update).delete(remove))
}

#[derive(Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
}

async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<FleetRider>>, AppError> {
    list_fleet(&state, &session).await.map(Json)
}

async fn provision(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<NewRiderRequest>,
) -> Result<(StatusCode, Json<CreatedRider>), AppError> {
    let created = create_rider(&state, &session, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn invite(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<InviteRequest>,
) -> Result<Json<FleetInvite>, AppError> {
    invite_rider(&state, &session, &payload.email).await.map(Json)
}

async fn sent_invites(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<FleetInvite>>, AppError> {
    list_sent_invites(&state, &session).await.map(Json)
}

async fn update(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(rider_id): Path<Uuid>,
    Json(payload): Json<RiderDetails>,
) -> Result<Json<RiderProfile>, AppError> {
    update_rider_details(&state, &session, rider_id, payload)
        .await
        .map(Json)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(rider_id): Path<Uuid>,
) -> Result<Json<RiderProfile>, AppError> {
    remove_from_fleet(&state, &session, rider_id).await.map(Json)
}
