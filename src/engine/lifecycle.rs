//! Order lifecycle: creation, role-scoped listing, and the status state
//! machine shared by every actor that writes to an order.

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::leg_distance_km;
use crate::identity::Session;
use crate::models::event::OrderEvent;
use crate::models::order::{GeoPoint, NewOrder, Order, OrderScope, OrderStatus, PackageSize, Stop};
use crate::models::profile::{Role, VerificationStatus};
use crate::state::AppState;
use crate::store::{OrderFilter, OrderMutation};

/// Order creation payload as submitted by the SME dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDraft {
    pub pickup_address: Option<String>,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub pickup_contact_name: Option<String>,
    pub pickup_contact_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_lat: Option<f64>,
    pub delivery_lng: Option<f64>,
    pub delivery_contact_name: Option<String>,
    pub delivery_contact_phone: Option<String>,
    pub package_description: Option<String>,
    pub package_size: Option<PackageSize>,
    pub delivery_fee: Option<f64>,
    pub distance_km: Option<f64>,
    pub estimated_duration_mins: Option<u32>,
    pub business_id: Option<Uuid>,
    pub rider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

impl OrderDraft {
    /// Checks the payload and shapes it into an order owned by `sme_id`.
    pub fn validate(self, sme_id: Uuid) -> Result<NewOrder, AppError> {
        let pickup = Stop {
            address: required("pickup_address", self.pickup_address)?,
            location: coordinates("pickup", self.pickup_lat, self.pickup_lng)?,
            contact_name: required("pickup_contact_name", self.pickup_contact_name)?,
            contact_phone: required("pickup_contact_phone", self.pickup_contact_phone)?,
        };
        let delivery = Stop {
            address: required("delivery_address", self.delivery_address)?,
            location: coordinates("delivery", self.delivery_lat, self.delivery_lng)?,
            contact_name: required("delivery_contact_name", self.delivery_contact_name)?,
            contact_phone: required("delivery_contact_phone", self.delivery_contact_phone)?,
        };

        if self.business_id.is_some() && self.rider_id.is_some() {
            return Err(AppError::Validation(
                "an order may target a logistics company or a rider, not both".to_string(),
            ));
        }
        non_negative("delivery_fee", self.delivery_fee)?;
        non_negative("distance_km", self.distance_km)?;

        let package_size = self.package_size.unwrap_or_default();
        let distance_km = self
            .distance_km
            .or_else(|| leg_distance_km(pickup.location.as_ref(), delivery.location.as_ref()));

        Ok(NewOrder {
            sme_id,
            business_id: self.business_id,
            rider_id: self.rider_id,
            customer_id: self.customer_id,
            status: initial_status(self.business_id, self.rider_id),
            pickup,
            delivery,
            package_description: self
                .package_description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            package_size,
            delivery_fee: Some(
                self.delivery_fee
                    .unwrap_or_else(|| package_size.estimated_fee()),
            ),
            distance_km,
            estimated_duration_mins: self.estimated_duration_mins,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field: {field}")))
}

fn coordinates(
    leg: &str,
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Option<GeoPoint>, AppError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(AppError::Validation(format!(
                    "{leg} coordinates are out of range"
                )));
            }
            Ok(Some(GeoPoint { lat, lng }))
        }
        (None, None) => Ok(None),
        _ => Err(AppError::Validation(format!(
            "{leg}_lat and {leg}_lng must be supplied together"
        ))),
    }
}

fn non_negative(field: &str, value: Option<f64>) -> Result<(), AppError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        ))),
        _ => Ok(()),
    }
}

/// Orders pinned to a partner at creation skip the open market.
pub fn initial_status(business_id: Option<Uuid>, rider_id: Option<Uuid>) -> OrderStatus {
    if business_id.is_some() || rider_id.is_some() {
        OrderStatus::Assigned
    } else {
        OrderStatus::Pending
    }
}

/// The complete order state machine.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    match (from, to) {
        (Pending, Accepted)
        | (Pending, Assigned)
        | (Accepted, Assigned)
        | (Assigned, PickedUp)
        | (PickedUp, InTransit)
        | (InTransit, Delivered) => true,
        (Pending | Accepted | Assigned | PickedUp | InTransit, Cancelled) => true,
        (from, Failed) => !from.is_terminal(),
        _ => false,
    }
}

/// Targets a rider may move an order to through AdvanceStatus.
fn is_rider_step(next: OrderStatus) -> bool {
    matches!(
        next,
        OrderStatus::PickedUp | OrderStatus::InTransit | OrderStatus::Delivered
    )
}

pub(crate) fn ensure_transition(order: &Order, to: OrderStatus) -> Result<(), AppError> {
    if is_valid_transition(order.status, to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "order {} cannot move from {} to {}",
            order.order_number, order.status, to
        )))
    }
}

/// Runs a conditional order write and records its outcome.
pub(crate) async fn commit(
    state: &AppState,
    operation: &'static str,
    order_id: Uuid,
    result: Result<Order, AppError>,
) -> Result<Order, AppError> {
    match result {
        Ok(order) => {
            state
                .metrics
                .order_transitions_total
                .with_label_values(&[order.status.as_str()])
                .inc();
            info!(order_id = %order.id, status = %order.status, operation, "order updated");
            state.publish(OrderEvent::from_order(&order));
            Ok(order)
        }
        Err(err) => {
            if matches!(err, AppError::Conflict(_)) {
                state
                    .metrics
                    .order_conflicts_total
                    .with_label_values(&[operation])
                    .inc();
                warn!(order_id = %order_id, operation, error = %err, "order write rejected");
            }
            Err(err)
        }
    }
}

pub async fn create_order(
    state: &AppState,
    session: &Session,
    draft: OrderDraft,
) -> Result<Order, AppError> {
    session.require(Role::Sme)?;
    let new_order = draft.validate(session.actor_id)?;

    if let Some(business_id) = new_order.business_id {
        let verified = state
            .store
            .get_logistics(business_id)
            .await?
            .is_some_and(|p| p.verification.verification_status == VerificationStatus::Verified);
        if !verified {
            return Err(AppError::Validation(
                "business_id does not reference a verified logistics company".to_string(),
            ));
        }
    }

    if let Some(rider_id) = new_order.rider_id {
        let eligible = state.store.get_rider(rider_id).await?.is_some_and(|r| {
            r.is_independent()
                && r.verification.verification_status == VerificationStatus::Verified
        });
        if !eligible {
            return Err(AppError::Validation(
                "rider_id does not reference a verified independent rider".to_string(),
            ));
        }
    }

    let order = state.store.insert_order(new_order).await?;

    state.metrics.orders_created_total.inc();
    info!(
        order_id = %order.id,
        order_number = %order.order_number,
        sme_id = %order.sme_id,
        status = %order.status,
        "order created"
    );
    state.publish(OrderEvent::from_order(&order));

    Ok(order)
}

/// Server-side visibility for the caller's role.
pub async fn visibility(state: &AppState, session: &Session) -> Result<OrderFilter, AppError> {
    let filter = match session.role {
        Role::Admin => OrderFilter::All,
        Role::Sme => OrderFilter::CreatedBy(session.actor_id),
        Role::Logistics => OrderFilter::ClaimableBy(session.actor_id),
        Role::Rider => OrderFilter::AssignedTo(session.actor_id),
        Role::Customer => {
            let phone = state
                .store
                .get_account(session.actor_id)
                .await?
                .and_then(|account| account.profile.phone_number)
                .filter(|phone| !phone.trim().is_empty());
            OrderFilter::Recipient {
                customer_id: session.actor_id,
                phone,
            }
        }
    };

    Ok(filter)
}

pub async fn list_orders(
    state: &AppState,
    session: &Session,
    scope: OrderScope,
) -> Result<Vec<Order>, AppError> {
    let filter = visibility(state, session).await?;
    let orders = state.store.list_orders(filter).await?;

    Ok(orders
        .into_iter()
        .filter(|order| scope.admits(order.status))
        .collect())
}

pub async fn get_order(state: &AppState, session: &Session, id: Uuid) -> Result<Order, AppError> {
    let filter = visibility(state, session).await?;

    state
        .store
        .get_order(id)
        .await?
        .filter(|order| filter.matches(order))
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

/// Rider-driven progress through pickup, transit and delivery.
pub async fn advance_status(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
    next: OrderStatus,
) -> Result<Order, AppError> {
    session.require(Role::Rider)?;

    let rider_id = session.actor_id;
    let mutation: OrderMutation = Box::new(move |order: &mut Order| {
        if order.rider_id != Some(rider_id) {
            return Err(AppError::Forbidden("order is not assigned to you".to_string()));
        }
        if !is_rider_step(next) {
            return Err(AppError::Conflict(format!(
                "order {} cannot move from {} to {} by its rider",
                order.order_number, order.status, next
            )));
        }
        ensure_transition(order, next)?;
        order.status = next;
        Ok(())
    });

    let result = state.store.update_order(order_id, mutation).await;
    commit(state, "advance_status", order_id, result).await
}

/// Withdraws an order. The creating SME or the company holding it may cancel.
pub async fn cancel_order(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
) -> Result<Order, AppError> {
    let actor = session.actor_id;
    let role = session.role;
    if !matches!(role, Role::Sme | Role::Logistics) {
        return Err(AppError::Forbidden(
            "only the ordering business or its logistics partner may cancel".to_string(),
        ));
    }

    let mutation: OrderMutation = Box::new(move |order: &mut Order| {
        let owns = match role {
            Role::Sme => order.sme_id == actor,
            Role::Logistics => order.business_id == Some(actor),
            _ => false,
        };
        if !owns {
            return Err(AppError::Forbidden("order is not yours to cancel".to_string()));
        }
        ensure_transition(order, OrderStatus::Cancelled)?;
        order.status = OrderStatus::Cancelled;
        Ok(())
    });

    let result = state.store.update_order(order_id, mutation).await;
    commit(state, "cancel_order", order_id, result).await
}

/// Marks a delivery attempt as failed. The holding company or the assigned
/// rider may do this from any non-terminal state.
pub async fn fail_order(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
) -> Result<Order, AppError> {
    let actor = session.actor_id;
    let role = session.role;
    if !matches!(role, Role::Logistics | Role::Rider) {
        return Err(AppError::Forbidden(
            "only the logistics partner or assigned rider may fail an order".to_string(),
        ));
    }

    let mutation: OrderMutation = Box::new(move |order: &mut Order| {
        let owns = match role {
            Role::Logistics => order.business_id == Some(actor),
            Role::Rider => order.rider_id == Some(actor),
            _ => false,
        };
        if !owns {
            return Err(AppError::Forbidden("order is not yours to fail".to_string()));
        }
        ensure_transition(order, OrderStatus::Failed)?;
        order.status = OrderStatus::Failed;
        Ok(())
    });

    let result = state.store.update_order(order_id, mutation).await;
    commit(state, "fail_order", order_id, result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn draft() -> OrderDraft {
        OrderDraft {
            pickup_address: Some("3 Allen Ave, Ikeja".to_string()),
            pickup_contact_name: Some("Kemi".to_string()),
            pickup_contact_phone: Some("08030000001".to_string()),
            delivery_address: Some("9 Admiralty Way, Lekki".to_string()),
            delivery_contact_name: Some("Musa".to_string()),
            delivery_contact_phone: Some("08030000002".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_field_is_named() {
        let mut payload = draft();
        payload.delivery_contact_phone = Some("   ".to_string());

        match payload.validate(Uuid::new_v4()) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("delivery_contact_phone")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn untargeted_order_starts_pending_with_estimated_fee() {
        let order = draft().validate(Uuid::new_v4()).unwrap();
        assert_eq!(order.status, Pending);
        assert_eq!(order.package_size, PackageSize::Small);
        assert_eq!(order.delivery_fee, Some(800.0));
        assert!(order.business_id.is_none() && order.rider_id.is_none());
    }

    #[test]
    fn targeted_order_starts_assigned() {
        let mut payload = draft();
        payload.business_id = Some(Uuid::new_v4());
        assert_eq!(payload.validate(Uuid::new_v4()).unwrap().status, Assigned);

        let mut payload = draft();
        payload.rider_id = Some(Uuid::new_v4());
        assert_eq!(payload.validate(Uuid::new_v4()).unwrap().status, Assigned);
    }

    #[test]
    fn targeting_both_partners_is_rejected() {
        let mut payload = draft();
        payload.business_id = Some(Uuid::new_v4());
        payload.rider_id = Some(Uuid::new_v4());
        assert!(matches!(
            payload.validate(Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn client_fee_is_kept_and_distance_is_derived() {
        let mut payload = draft();
        payload.delivery_fee = Some(1200.0);
        payload.pickup_lat = Some(6.6018);
        payload.pickup_lng = Some(3.3515);
        payload.delivery_lat = Some(6.4474);
        payload.delivery_lng = Some(3.4723);

        let order = payload.validate(Uuid::new_v4()).unwrap();
        assert_eq!(order.delivery_fee, Some(1200.0));
        assert!(order.distance_km.unwrap() > 15.0);
    }

    #[test]
    fn half_coordinates_are_rejected() {
        let mut payload = draft();
        payload.pickup_lat = Some(6.6);
        assert!(matches!(
            payload.validate(Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn forward_path_is_allowed() {
        let path = [Pending, Accepted, Assigned, PickedUp, InTransit, Delivered];
        for pair in path.windows(2) {
            assert!(is_valid_transition(pair[0], pair[1]), "{:?}", pair);
        }
        assert!(is_valid_transition(Pending, Assigned));
    }

    #[test]
    fn skipping_and_reversing_are_rejected() {
        assert!(!is_valid_transition(Assigned, Delivered));
        assert!(!is_valid_transition(Pending, PickedUp));
        assert!(!is_valid_transition(InTransit, PickedUp));
        assert!(!is_valid_transition(Accepted, Pending));
    }

    #[test]
    fn riders_only_step_forward() {
        for next in [PickedUp, InTransit, Delivered] {
            assert!(is_rider_step(next));
        }
        for next in [Pending, Accepted, Assigned, Cancelled, Failed] {
            assert!(!is_rider_step(next), "{next}");
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        let all = [
            Pending, Accepted, Assigned, PickedUp, InTransit, Delivered, Cancelled, Failed,
        ];
        for from in [Delivered, Cancelled, Failed] {
            for to in all {
                assert!(!is_valid_transition(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn cancel_and_fail_reach_every_live_state() {
        for from in [Pending, Accepted, Assigned, PickedUp, InTransit] {
            assert!(is_valid_transition(from, Cancelled));
            assert!(is_valid_transition(from, Failed));
        }
    }
}
