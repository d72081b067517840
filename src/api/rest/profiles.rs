use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::engine::profiles::{
    dashboard_gate, get_account, submit_document, update_profile, DocumentUpload, ProfileUpdate,
};
use crate::engine::verification::GateReport;
use crate::error::AppError;
use crate::identity::Session;
use crate::models::profile::Account;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(show).put(update))
        .route("/profile/documents", post(add_document))
        .route("/profile/gate", get(gate))
}

async fn show(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Account>, AppError> {
    get_account(&state, &session).await.map(Json)
}

async fn update(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Account>, AppError> {
    update_profile(&state, &session, payload).await.map(Json)
}

async fn add_document(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<DocumentUpload>,
) -> Result<Json<Account>, AppError> {
    submit_document(&state, &session, payload).await.map(Json)
}

async fn gate(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<GateReport>, AppError> {
    dashboard_gate(&state, &session).await.map(Json)
}
