use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::invite::{FleetInvite, InviteStatus};
use crate::models::order::{NewOrder, Order};
use crate::models::profile::{
    Account, LogisticsProfile, Profile, RiderProfile, Role, RoleProfile, SmeProfile,
    VerificationStatus,
};
use crate::store::{
    AccountMutation, InviteFilter, InviteResolution, OrderFilter, OrderMutation, RiderFilter,
    RiderMutation, RiderOrderMutation, StoreBackend, StoreCounts,
};

/// DashMap-backed store. Row locks are DashMap shard guards; when a write
/// spans collections they are always taken in the order profiles, invites,
/// role profiles, orders, with the pending-invite index last.
pub struct MemoryStore {
    orders: DashMap<Uuid, Order>,
    order_sequence: AtomicU64,
    profiles: DashMap<Uuid, Profile>,
    sme_profiles: DashMap<Uuid, SmeProfile>,
    logistics_profiles: DashMap<Uuid, LogisticsProfile>,
    rider_profiles: DashMap<Uuid, RiderProfile>,
    invites: DashMap<Uuid, FleetInvite>,
    /// Unique index over pending invites keyed by (company, email).
    pending_invites: DashMap<(Uuid, String), Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            order_sequence: AtomicU64::new(0),
            profiles: DashMap::new(),
            sme_profiles: DashMap::new(),
            logistics_profiles: DashMap::new(),
            rider_profiles: DashMap::new(),
            invites: DashMap::new(),
            pending_invites: DashMap::new(),
        }
    }

    fn next_order_number(&self) -> String {
        let seq = self.order_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("ORD-{seq:06}")
    }

    fn role_profile(&self, profile: &Profile) -> Option<RoleProfile> {
        let id = profile.id;
        match profile.role {
            Role::Sme => self
                .sme_profiles
                .get(&id)
                .map(|p| RoleProfile::Sme(p.clone())),
            Role::Logistics => self
                .logistics_profiles
                .get(&id)
                .map(|p| RoleProfile::Logistics(p.clone())),
            Role::Rider => self
                .rider_profiles
                .get(&id)
                .map(|p| RoleProfile::Rider(p.clone())),
            Role::Customer => Some(RoleProfile::Customer),
            Role::Admin => Some(RoleProfile::Admin),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn role_mismatch(id: Uuid) -> AppError {
    AppError::Storage(format!("role profile kind does not match account {id}"))
}

fn missing_role_profile(id: Uuid) -> AppError {
    AppError::Storage(format!("role profile missing for account {id}"))
}

/// Runs an account mutation on drafts and rejects any change of role.
fn apply_account_mutation(
    id: Uuid,
    role: Role,
    mutation: AccountMutation,
    profile: &mut Profile,
    role_profile: &mut RoleProfile,
) -> Result<(), AppError> {
    mutation(profile, role_profile)?;
    if profile.role != role || role_profile.role() != role {
        return Err(role_mismatch(id));
    }
    Ok(())
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError> {
        let order = order.into_order(Uuid::new_v4(), self.next_order_number(), Utc::now());
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(&self, id: Uuid, mutation: OrderMutation) -> Result<Order, AppError> {
        let mut row = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

        let mut draft = row.clone();
        mutation(&mut draft)?;
        draft.updated_at = Utc::now();
        *row = draft.clone();

        Ok(draft)
    }

    async fn update_order_with_rider(
        &self,
        order_id: Uuid,
        rider_id: Uuid,
        mutation: RiderOrderMutation,
    ) -> Result<Order, AppError> {
        let rider = self.rider_profiles.get(&rider_id);
        let mut row = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        let mut draft = row.clone();
        mutation(&mut draft, rider.as_deref())?;
        draft.updated_at = Utc::now();
        *row = draft.clone();

        Ok(draft)
    }

    async fn insert_account(
        &self,
        profile: Profile,
        role_profile: RoleProfile,
    ) -> Result<(), AppError> {
        let id = profile.id;
        if role_profile.role() != profile.role {
            return Err(role_mismatch(id));
        }

        let Entry::Vacant(slot) = self.profiles.entry(id) else {
            return Err(AppError::Conflict(format!("account {id} already exists")));
        };

        match role_profile {
            RoleProfile::Sme(p) => {
                self.sme_profiles.insert(id, p);
            }
            RoleProfile::Logistics(p) => {
                self.logistics_profiles.insert(id, p);
            }
            RoleProfile::Rider(p) => {
                self.rider_profiles.insert(id, p);
            }
            RoleProfile::Customer | RoleProfile::Admin => {}
        }
        slot.insert(profile);

        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let Some(profile) = self.profiles.get(&id).map(|p| p.clone()) else {
            return Ok(None);
        };

        let role_profile = self.role_profile(&profile).ok_or_else(|| missing_role_profile(id))?;
        Ok(Some(Account {
            profile,
            role_profile,
        }))
    }

    async fn update_account(
        &self,
        id: Uuid,
        mutation: AccountMutation,
    ) -> Result<Account, AppError> {
        let mut profile_row = self
            .profiles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("account {id} not found")))?;
        let role = profile_row.role;
        let mut profile = profile_row.clone();

        // Each role row stays locked until its draft is written back.
        let role_profile = match role {
            Role::Sme => {
                let mut row = self
                    .sme_profiles
                    .get_mut(&id)
                    .ok_or_else(|| missing_role_profile(id))?;
                let mut draft = RoleProfile::Sme(row.clone());
                apply_account_mutation(id, role, mutation, &mut profile, &mut draft)?;
                if let RoleProfile::Sme(p) = &draft {
                    *row = p.clone();
                }
                draft
            }
            Role::Logistics => {
                let mut row = self
                    .logistics_profiles
                    .get_mut(&id)
                    .ok_or_else(|| missing_role_profile(id))?;
                let mut draft = RoleProfile::Logistics(row.clone());
                apply_account_mutation(id, role, mutation, &mut profile, &mut draft)?;
                if let RoleProfile::Logistics(p) = &draft {
                    *row = p.clone();
                }
                draft
            }
            Role::Rider => {
                let mut row = self
                    .rider_profiles
                    .get_mut(&id)
                    .ok_or_else(|| missing_role_profile(id))?;
                let mut draft = RoleProfile::Rider(row.clone());
                apply_account_mutation(id, role, mutation, &mut profile, &mut draft)?;
                if let RoleProfile::Rider(p) = &draft {
                    *row = p.clone();
                }
                draft
            }
            Role::Customer | Role::Admin => {
                let mut draft = RoleProfile::blank(id, role);
                apply_account_mutation(id, role, mutation, &mut profile, &mut draft)?;
                draft
            }
        };

        profile.updated_at = Utc::now();
        *profile_row = profile.clone();

        Ok(Account {
            profile,
            role_profile,
        })
    }

    async fn get_rider(&self, id: Uuid) -> Result<Option<RiderProfile>, AppError> {
        Ok(self.rider_profiles.get(&id).map(|p| p.clone()))
    }

    async fn update_rider(
        &self,
        id: Uuid,
        mutation: RiderMutation,
    ) -> Result<RiderProfile, AppError> {
        let mut row = self
            .rider_profiles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("rider {id} not found")))?;

        let mut draft = row.clone();
        mutation(&mut draft)?;
        *row = draft.clone();

        Ok(draft)
    }

    async fn list_riders(
        &self,
        filter: RiderFilter,
    ) -> Result<Vec<(Profile, RiderProfile)>, AppError> {
        let riders: Vec<RiderProfile> = self
            .rider_profiles
            .iter()
            .filter(|entry| {
                let rider = entry.value();
                match filter {
                    RiderFilter::InFleet(logistics_id) => rider.logistics_id == Some(logistics_id),
                    RiderFilter::IndependentVerified => {
                        rider.is_independent()
                            && rider.verification.verification_status
                                == VerificationStatus::Verified
                    }
                }
            })
            .map(|entry| entry.value().clone())
            .collect();

        Ok(riders
            .into_iter()
            .filter_map(|rider| {
                self.profiles
                    .get(&rider.id)
                    .map(|profile| (profile.clone(), rider))
            })
            .collect())
    }

    async fn list_verified_logistics(&self) -> Result<Vec<LogisticsProfile>, AppError> {
        Ok(self
            .logistics_profiles
            .iter()
            .filter(|entry| {
                entry.value().verification.verification_status == VerificationStatus::Verified
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_logistics(&self, id: Uuid) -> Result<Option<LogisticsProfile>, AppError> {
        Ok(self.logistics_profiles.get(&id).map(|p| p.clone()))
    }

    async fn list_profiles(&self, role: Role, limit: usize) -> Result<Vec<Profile>, AppError> {
        Ok(self
            .profiles
            .iter()
            .filter(|entry| entry.value().role == role)
            .take(limit)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn insert_invite(&self, invite: FleetInvite) -> Result<FleetInvite, AppError> {
        let key = (invite.logistics_id, invite.email.clone());
        match self.pending_invites.entry(key) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "an invite is already pending for {}",
                    invite.email
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(invite.id);
            }
        }

        self.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn list_invites(&self, filter: InviteFilter) -> Result<Vec<FleetInvite>, AppError> {
        let mut invites: Vec<FleetInvite> = self
            .invites
            .iter()
            .filter(|entry| {
                let invite = entry.value();
                match &filter {
                    InviteFilter::SentBy(logistics_id) => invite.logistics_id == *logistics_id,
                    InviteFilter::PendingFor(email) => {
                        invite.status == InviteStatus::Pending && invite.is_addressed_to(email)
                    }
                }
            })
            .map(|entry| entry.value().clone())
            .collect();

        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn resolve_invite(
        &self,
        invite_id: Uuid,
        rider_id: Uuid,
        resolution: InviteResolution,
    ) -> Result<FleetInvite, AppError> {
        let mut invite_row = self
            .invites
            .get_mut(&invite_id)
            .ok_or_else(|| AppError::NotFound(format!("invite {invite_id} not found")))?;
        let mut rider_row = self.rider_profiles.get_mut(&rider_id);

        let mut invite = invite_row.clone();
        let mut rider = rider_row.as_deref().cloned();
        resolution(&mut invite, rider.as_mut())?;

        if let (Some(row), Some(rider)) = (rider_row.as_deref_mut(), rider) {
            *row = rider;
        }
        if invite.status != InviteStatus::Pending {
            self.pending_invites
                .remove(&(invite.logistics_id, invite.email.clone()));
        }
        *invite_row = invite.clone();

        Ok(invite)
    }

    async fn counts(&self) -> Result<StoreCounts, AppError> {
        Ok(StoreCounts {
            orders: self.orders.len(),
            profiles: self.profiles.len(),
            invites: self.invites.len(),
        })
    }
}
