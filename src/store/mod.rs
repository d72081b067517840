//! Persistence seam for orders, profiles and fleet invites.
//!
//! [`StoreBackend`] is the raw interface a backend implements. Mutating calls
//! take a closure that is run against a copy of the locked row(s); the copy is
//! committed only when the closure returns `Ok`, which gives callers
//! compare-and-swap semantics without a read-then-write gap.
//!
//! [`StoreService`] wraps a backend and bounds every call with the configured
//! timeout, so a stalled backend surfaces as [`AppError::Unavailable`].

pub mod memory;

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::invite::FleetInvite;
use crate::models::order::{NewOrder, Order, OrderStatus};
use crate::models::profile::{Account, LogisticsProfile, Profile, RiderProfile, Role, RoleProfile};
use crate::observability::metrics::Metrics;

pub use memory::MemoryStore;

pub type OrderMutation = Box<dyn FnOnce(&mut Order) -> Result<(), AppError> + Send>;
pub type RiderOrderMutation =
    Box<dyn FnOnce(&mut Order, Option<&RiderProfile>) -> Result<(), AppError> + Send>;
pub type RiderMutation = Box<dyn FnOnce(&mut RiderProfile) -> Result<(), AppError> + Send>;
pub type AccountMutation =
    Box<dyn FnOnce(&mut Profile, &mut RoleProfile) -> Result<(), AppError> + Send>;
pub type InviteResolution = Box<
    dyn FnOnce(&mut FleetInvite, Option<&mut RiderProfile>) -> Result<(), AppError> + Send,
>;

/// Row predicate for order listings.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderFilter {
    All,
    CreatedBy(Uuid),
    /// Claimed by the company, or still an unclaimed broadcast.
    ClaimableBy(Uuid),
    AssignedTo(Uuid),
    Recipient {
        customer_id: Uuid,
        phone: Option<String>,
    },
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::CreatedBy(sme_id) => order.sme_id == *sme_id,
            OrderFilter::ClaimableBy(logistics_id) => {
                order.business_id == Some(*logistics_id)
                    || (order.status == OrderStatus::Pending && order.is_broadcast())
            }
            OrderFilter::AssignedTo(rider_id) => order.rider_id == Some(*rider_id),
            OrderFilter::Recipient { customer_id, phone } => {
                order.customer_id == Some(*customer_id)
                    || phone
                        .as_deref()
                        .is_some_and(|phone| order.delivery.contact_phone == phone)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderFilter {
    InFleet(Uuid),
    /// Verified riders with no fleet membership.
    IndependentVerified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteFilter {
    SentBy(Uuid),
    PendingFor(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub orders: usize,
    pub profiles: usize,
    pub invites: usize,
}

#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Persists a new order, assigning id, order number and timestamps.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, AppError>;

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, AppError>;

    /// Applies `mutation` to the order under its row lock and bumps `updated_at`.
    async fn update_order(&self, id: Uuid, mutation: OrderMutation) -> Result<Order, AppError>;

    /// Like [`StoreBackend::update_order`], with the rider row held for the
    /// duration so its fleet membership and availability cannot change
    /// underneath the write.
    async fn update_order_with_rider(
        &self,
        order_id: Uuid,
        rider_id: Uuid,
        mutation: RiderOrderMutation,
    ) -> Result<Order, AppError>;

    /// Inserts a base profile and its role half together.
    async fn insert_account(
        &self,
        profile: Profile,
        role_profile: RoleProfile,
    ) -> Result<(), AppError>;

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn update_account(
        &self,
        id: Uuid,
        mutation: AccountMutation,
    ) -> Result<Account, AppError>;

    async fn get_rider(&self, id: Uuid) -> Result<Option<RiderProfile>, AppError>;

    async fn update_rider(
        &self,
        id: Uuid,
        mutation: RiderMutation,
    ) -> Result<RiderProfile, AppError>;

    async fn list_riders(
        &self,
        filter: RiderFilter,
    ) -> Result<Vec<(Profile, RiderProfile)>, AppError>;

    async fn list_verified_logistics(&self) -> Result<Vec<LogisticsProfile>, AppError>;

    async fn get_logistics(&self, id: Uuid) -> Result<Option<LogisticsProfile>, AppError>;

    async fn list_profiles(&self, role: Role, limit: usize) -> Result<Vec<Profile>, AppError>;

    /// Inserts a pending invite unless one is already pending for the same
    /// company and email, in which case it fails with `Conflict`.
    async fn insert_invite(&self, invite: FleetInvite) -> Result<FleetInvite, AppError>;

    async fn list_invites(&self, filter: InviteFilter) -> Result<Vec<FleetInvite>, AppError>;

    /// Resolves an invite and updates the rider's profile as one write.
    async fn resolve_invite(
        &self,
        invite_id: Uuid,
        rider_id: Uuid,
        resolution: InviteResolution,
    ) -> Result<FleetInvite, AppError>;

    async fn counts(&self) -> Result<StoreCounts, AppError>;
}

/// Timeout-bounded, instrumented access to a [`StoreBackend`].
pub struct StoreService {
    backend: Box<dyn StoreBackend>,
    timeout: Duration,
    metrics: Metrics,
}

impl StoreService {
    pub fn new(backend: Box<dyn StoreBackend>, timeout: Duration, metrics: Metrics) -> Self {
        Self {
            backend,
            timeout,
            metrics,
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let start = Instant::now();
        let result = with_deadline(self.timeout, operation, call).await;

        self.metrics
            .store_latency_seconds
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
        if matches!(result, Err(AppError::Unavailable(_))) {
            self.metrics.store_timeouts_total.inc();
        }

        result
    }

    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError> {
        self.bounded("insert_order", self.backend.insert_order(order)).await
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        self.bounded("get_order", self.backend.get_order(id)).await
    }

    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        self.bounded("list_orders", self.backend.list_orders(filter)).await
    }

    pub async fn update_order(&self, id: Uuid, mutation: OrderMutation) -> Result<Order, AppError> {
        self.bounded("update_order", self.backend.update_order(id, mutation)).await
    }

    pub async fn update_order_with_rider(
        &self,
        order_id: Uuid,
        rider_id: Uuid,
        mutation: RiderOrderMutation,
    ) -> Result<Order, AppError> {
        self.bounded(
            "update_order_with_rider",
            self.backend.update_order_with_rider(order_id, rider_id, mutation),
        )
        .await
    }

    pub async fn insert_account(
        &self,
        profile: Profile,
        role_profile: RoleProfile,
    ) -> Result<(), AppError> {
        self.bounded("insert_account", self.backend.insert_account(profile, role_profile)).await
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        self.bounded("get_account", self.backend.get_account(id)).await
    }

    pub async fn update_account(
        &self,
        id: Uuid,
        mutation: AccountMutation,
    ) -> Result<Account, AppError> {
        self.bounded("update_account", self.backend.update_account(id, mutation)).await
    }

    pub async fn get_rider(&self, id: Uuid) -> Result<Option<RiderProfile>, AppError> {
        self.bounded("get_rider", self.backend.get_rider(id)).await
    }

    pub async fn update_rider(
        &self,
        id: Uuid,
        mutation: RiderMutation,
    ) -> Result<RiderProfile, AppError> {
        self.bounded("update_rider", self.backend.update_rider(id, mutation)).await
    }

    pub async fn list_riders(
        &self,
        filter: RiderFilter,
    ) -> Result<Vec<(Profile, RiderProfile)>, AppError> {
        self.bounded("list_riders", self.backend.list_riders(filter)).await
    }

    pub async fn list_verified_logistics(&self) -> Result<Vec<LogisticsProfile>, AppError> {
        self.bounded("list_verified_logistics", self.backend.list_verified_logistics()).await
    }

    pub async fn get_logistics(&self, id: Uuid) -> Result<Option<LogisticsProfile>, AppError> {
        self.bounded("get_logistics", self.backend.get_logistics(id)).await
    }

    pub async fn list_profiles(&self, role: Role, limit: usize) -> Result<Vec<Profile>, AppError> {
        self.bounded("list_profiles", self.backend.list_profiles(role, limit)).await
    }

    pub async fn insert_invite(&self, invite: FleetInvite) -> Result<FleetInvite, AppError> {
        self.bounded("insert_invite", self.backend.insert_invite(invite)).await
    }

    pub async fn list_invites(&self, filter: InviteFilter) -> Result<Vec<FleetInvite>, AppError> {
        self.bounded("list_invites", self.backend.list_invites(filter)).await
    }

    pub async fn resolve_invite(
        &self,
        invite_id: Uuid,
        rider_id: Uuid,
        resolution: InviteResolution,
    ) -> Result<FleetInvite, AppError> {
        self.bounded(
            "resolve_invite",
            self.backend.resolve_invite(invite_id, rider_id, resolution),
        )
        .await
    }

    pub async fn counts(&self) -> Result<StoreCounts, AppError> {
        self.bounded("counts", self.backend.counts()).await
    }
}

/// Runs a store call with an upper bound on how long it may take.
pub async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = timeout.as_millis() as u64,
                "store call timed out"
            );
            Err(AppError::Unavailable(format!("{operation} timed out, retry later")))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::order::{PackageSize, Stop};

    fn order(status: OrderStatus, business_id: Option<Uuid>, rider_id: Option<Uuid>) -> Order {
        let stop = Stop {
            address: "1 Marina Rd".to_string(),
            location: None,
            contact_name: "Ada".to_string(),
            contact_phone: "+2348000000001".to_string(),
        };
        NewOrder {
            sme_id: Uuid::from_u128(1),
            business_id,
            rider_id,
            customer_id: None,
            status,
            pickup: stop.clone(),
            delivery: stop,
            package_description: None,
            package_size: PackageSize::Small,
            delivery_fee: None,
            distance_km: None,
            estimated_duration_mins: None,
        }
        .into_order(Uuid::new_v4(), "ORD-000001".to_string(), chrono::Utc::now())
    }

    #[test]
    fn claimable_filter_admits_own_and_open_broadcasts_only() {
        let mine = Uuid::from_u128(10);
        let other = Uuid::from_u128(11);
        let filter = OrderFilter::ClaimableBy(mine);

        assert!(filter.matches(&order(OrderStatus::Pending, None, None)));
        assert!(filter.matches(&order(OrderStatus::Accepted, Some(mine), None)));
        assert!(!filter.matches(&order(OrderStatus::Accepted, Some(other), None)));
        assert!(!filter.matches(&order(OrderStatus::Cancelled, None, None)));
        assert!(!filter.matches(&order(OrderStatus::Assigned, None, Some(Uuid::from_u128(12)))));
    }

    #[test]
    fn recipient_filter_matches_link_or_phone() {
        let customer = Uuid::from_u128(20);
        let by_phone = OrderFilter::Recipient {
            customer_id: customer,
            phone: Some("+2348000000001".to_string()),
        };
        let no_phone = OrderFilter::Recipient {
            customer_id: customer,
            phone: None,
        };

        let unlinked = order(OrderStatus::Pending, None, None);
        assert!(by_phone.matches(&unlinked));
        assert!(!no_phone.matches(&unlinked));

        let mut linked = unlinked.clone();
        linked.customer_id = Some(customer);
        assert!(no_phone.matches(&linked));
    }

    #[tokio::test]
    async fn deadline_turns_stalls_into_unavailable() {
        let stalled = std::future::pending::<Result<(), AppError>>();
        let err = with_deadline(Duration::from_millis(10), "get_order", stalled)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));

        let ok = with_deadline(Duration::from_millis(10), "get_order", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }
}
