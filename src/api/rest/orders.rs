use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::assignment::{accept_order, assign_rider};
use crate::engine::lifecycle::{
    advance_status, cancel_order, create_order, fail_order, get_order, list_orders, OrderDraft,
};
use crate::error::AppError;
use crate::identity::Session;
use crate::models::order::{Order, OrderScope, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list).post(create))
        .route("/orders/:id", get(show))
        .route("/orders/:id/accept", patch(accept))
        .route("/orders/:id/assign", patch(assign))
        .route("/orders/:id/status", patch(advance))
        .route("/orders/:id/cancel", patch(cancel))
        .route("/orders/:id/fail", patch(fail))
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub scope: OrderScope,
}

#[derive(Deserialize)]
pub struct AssignRiderRequest {
    pub rider_id: Uuid,
}

#[derive(Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<OrderDraft>,
) -> Result<Json<Order>, AppError> {
    create_order(&state, &session, payload).await.map(Json)
}

async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    list_orders(&state, &session, query.scope).await.map(Json)
}

async fn show(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    get_order(&state, &session, id).await.map(Json)
}

async fn accept(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    accept_order(&state, &session, id).await.map(Json)
}

async fn assign(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRiderRequest>,
) -> Result<Json<Order>, AppError> {
    assign_rider(&state, &session, id, payload.rider_id)
        .await
        .map(Json)
}

async fn advance(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<Json<Order>, AppError> {
    advance_status(&state, &session, id, payload.status)
        .await
        .map(Json)
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    cancel_order(&state, &session, id).await.map(Json)
}

async fn fail(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    fail_order(&state, &session, id).await.map(Json)
}
