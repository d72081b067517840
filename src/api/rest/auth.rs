use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::identity::SignedIn;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/sign-in", post(sign_in))
}

#[derive(Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SignedIn>, AppError> {
    let signed_in = state
        .identity
        .sign_in(&payload.email, &payload.password)
        .await?;

    info!(user_id = %signed_in.user_id, role = %signed_in.role, "session issued");
    Ok(Json(signed_in))
}
