use uuid::Uuid;

use crate::engine::lifecycle::{commit, ensure_transition};
use crate::error::AppError;
use crate::identity::Session;
use crate::models::order::{Order, OrderStatus};
use crate::models::profile::{RiderProfile, RiderStatus, Role};
use crate::state::AppState;
use crate::store::{OrderMutation, RiderOrderMutation};

/// Claims an open broadcast order for the calling logistics company.
///
/// The claim is a conditional write on `status == pending` with no partner
/// set, so when several companies race for the same order exactly one wins
/// and the rest get `Conflict`.
pub async fn accept_order(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
) -> Result<Order, AppError> {
    session.require(Role::Logistics)?;
    let logistics_id = session.actor_id;

    let mutation: OrderMutation = Box::new(move |order: &mut Order| {
        if order.status != OrderStatus::Pending || !order.is_broadcast() {
            return Err(AppError::Conflict(format!(
                "order {} has already been claimed",
                order.order_number
            )));
        }
        ensure_transition(order, OrderStatus::Accepted)?;
        order.status = OrderStatus::Accepted;
        order.business_id = Some(logistics_id);
        Ok(())
    });

    let result = state.store.update_order(order_id, mutation).await;
    commit(state, "accept_order", order_id, result).await
}

/// Hands an order held by the calling company to one of its online riders.
///
/// The rider's membership and availability are checked inside the same
/// write, against the stored rider row rather than anything the client sent.
pub async fn assign_rider(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
    rider_id: Uuid,
) -> Result<Order, AppError> {
    session.require(Role::Logistics)?;
    let logistics_id = session.actor_id;

    let mutation: RiderOrderMutation =
        Box::new(move |order: &mut Order, rider: Option<&RiderProfile>| {
            let rider = rider
                .filter(|rider| rider.logistics_id == Some(logistics_id))
                .ok_or_else(|| AppError::Forbidden("rider is not in your fleet".to_string()))?;
            if rider.current_status != RiderStatus::Online {
                return Err(AppError::Forbidden("rider is not online".to_string()));
            }

            if order.business_id != Some(logistics_id) {
                return Err(AppError::Forbidden(
                    "order is not held by your company".to_string(),
                ));
            }

            match order.status {
                OrderStatus::Accepted => ensure_transition(order, OrderStatus::Assigned)?,
                // Targeted at this company on creation, still waiting for a rider.
                OrderStatus::Assigned if order.rider_id.is_none() => {}
                _ => {
                    return Err(AppError::Conflict(format!(
                        "order {} is {} and can no longer take a rider",
                        order.order_number, order.status
                    )));
                }
            }

            order.status = OrderStatus::Assigned;
            order.rider_id = Some(rider.id);
            Ok(())
        });

    let result = state
        .store
        .update_order_with_rider(order_id, rider_id, mutation)
        .await;
    commit(state, "assign_rider", order_id, result).await
}
