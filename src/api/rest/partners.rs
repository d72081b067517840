use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::engine::matching::{list_customers, list_eligible_partners};
use crate::error::AppError;
use crate::identity::Session;
use crate::models::partner::{CustomerContact, EligiblePartners};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partners", get(partners))
        .route("/customers", get(customers))
}

async fn partners(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<EligiblePartners>, AppError> {
    list_eligible_partners(&state, &session).await.map(Json)
}

async fn customers(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<CustomerContact>>, AppError> {
    list_customers(&state, &session).await.map(Json)
}
