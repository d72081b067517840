//! Fleet membership: invitations, acceptance, and a company's management of
//! the riders linked to it.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Session;
use crate::models::invite::{
    normalize_email, FleetInvite, InviteAction, InviteStatus, ReceivedInvite,
};
use crate::models::partner::FleetRider;
use crate::models::profile::{RiderProfile, Role};
use crate::state::AppState;
use crate::store::{InviteFilter, InviteResolution, RiderFilter, RiderMutation};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiderDetails {
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
}

fn invite_hidden() -> AppError {
    AppError::NotFound("invite not found or already processed".to_string())
}

fn not_in_fleet() -> AppError {
    AppError::NotFound("rider not found in your fleet".to_string())
}

/// Any `NotFound` from the store is reported with the caller-facing message,
/// so the response never reveals which precondition failed.
fn hide_not_found(err: AppError, hidden: fn() -> AppError) -> AppError {
    match err {
        AppError::NotFound(_) => hidden(),
        other => other,
    }
}

pub async fn invite_rider(
    state: &AppState,
    session: &Session,
    email: &str,
) -> Result<FleetInvite, AppError> {
    session.require(Role::Logistics)?;

    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(format!("{email} is not an email address")));
    }

    let result = state
        .store
        .insert_invite(FleetInvite::pending(session.actor_id, email))
        .await;

    let outcome = match &result {
        Ok(_) => "issued",
        Err(AppError::Conflict(_)) => "duplicate",
        Err(_) => "error",
    };
    state
        .metrics
        .fleet_invites_total
        .with_label_values(&[outcome])
        .inc();

    let invite = result?;
    info!(invite_id = %invite.id, logistics_id = %invite.logistics_id, "fleet invite issued");
    Ok(invite)
}

pub async fn list_sent_invites(
    state: &AppState,
    session: &Session,
) -> Result<Vec<FleetInvite>, AppError> {
    session.require(Role::Logistics)?;
    state
        .store
        .list_invites(InviteFilter::SentBy(session.actor_id))
        .await
}

/// Pending invites addressed to the calling rider, with the inviting company.
pub async fn list_received_invites(
    state: &AppState,
    session: &Session,
) -> Result<Vec<ReceivedInvite>, AppError> {
    session.require(Role::Rider)?;

    let invites = state
        .store
        .list_invites(InviteFilter::PendingFor(session.email.clone()))
        .await?;

    let mut received = Vec::with_capacity(invites.len());
    for invite in invites {
        let company = state.store.get_logistics(invite.logistics_id).await?;
        received.push(ReceivedInvite {
            id: invite.id,
            status: invite.status,
            created_at: invite.created_at,
            company_name: company.as_ref().and_then(|c| c.company_name.clone()),
            city: company.as_ref().and_then(|c| c.city.clone()),
            state: company.and_then(|c| c.state),
        });
    }

    Ok(received)
}

/// Accepts or rejects an invite. Acceptance links the rider to the inviting
/// company and marks the invite accepted in one write.
pub async fn respond_to_invite(
    state: &AppState,
    session: &Session,
    invite_id: Uuid,
    action: InviteAction,
) -> Result<FleetInvite, AppError> {
    session.require(Role::Rider)?;
    let email = session.email.clone();

    let resolution: InviteResolution = Box::new(
        move |invite: &mut FleetInvite, rider: Option<&mut RiderProfile>| {
            if invite.status != InviteStatus::Pending || !invite.is_addressed_to(&email) {
                return Err(invite_hidden());
            }

            match action {
                InviteAction::Accept => {
                    let rider = rider.ok_or_else(invite_hidden)?;
                    rider.logistics_id = Some(invite.logistics_id);
                    invite.status = InviteStatus::Accepted;
                }
                InviteAction::Reject => {
                    invite.status = InviteStatus::Rejected;
                }
            }
            Ok(())
        },
    );

    let invite = state
        .store
        .resolve_invite(invite_id, session.actor_id, resolution)
        .await
        .map_err(|err| hide_not_found(err, invite_hidden))?;

    let outcome = match invite.status {
        InviteStatus::Accepted => "accepted",
        _ => "rejected",
    };
    state
        .metrics
        .fleet_invites_total
        .with_label_values(&[outcome])
        .inc();
    info!(
        invite_id = %invite.id,
        rider_id = %session.actor_id,
        logistics_id = %invite.logistics_id,
        outcome,
        "fleet invite resolved"
    );

    Ok(invite)
}

pub async fn list_fleet(state: &AppState, session: &Session) -> Result<Vec<FleetRider>, AppError> {
    session.require(Role::Logistics)?;

    let riders = state
        .store
        .list_riders(RiderFilter::InFleet(session.actor_id))
        .await?;

    Ok(riders
        .into_iter()
        .map(|(profile, rider)| FleetRider {
            id: rider.id,
            full_name: profile.full_name,
            phone_number: profile.phone_number,
            vehicle_type: rider.vehicle_type,
            license_plate: rider.license_plate,
            current_status: rider.current_status,
            verification_status: rider.verification.verification_status,
        })
        .collect())
}

/// Unlinks a rider from the calling company. The rider keeps its account and
/// becomes independent.
pub async fn remove_from_fleet(
    state: &AppState,
    session: &Session,
    rider_id: Uuid,
) -> Result<RiderProfile, AppError> {
    session.require(Role::Logistics)?;
    let logistics_id = session.actor_id;

    let mutation: RiderMutation = Box::new(move |rider: &mut RiderProfile| {
        if rider.logistics_id != Some(logistics_id) {
            return Err(not_in_fleet());
        }
        rider.logistics_id = None;
        Ok(())
    });

    let rider = state
        .store
        .update_rider(rider_id, mutation)
        .await
        .map_err(|err| hide_not_found(err, not_in_fleet))?;

    info!(rider_id = %rider.id, logistics_id = %logistics_id, "rider removed from fleet");
    Ok(rider)
}

/// Lets a company correct the vehicle details of one of its riders.
pub async fn update_rider_details(
    state: &AppState,
    session: &Session,
    rider_id: Uuid,
    details: RiderDetails,
) -> Result<RiderProfile, AppError> {
    session.require(Role::Logistics)?;
    let logistics_id = session.actor_id;

    let mutation: RiderMutation = Box::new(move |rider: &mut RiderProfile| {
        if rider.logistics_id != Some(logistics_id) {
            return Err(not_in_fleet());
        }
        if let Some(vehicle_type) = filled(details.vehicle_type) {
            rider.vehicle_type = Some(vehicle_type);
        }
        if let Some(license_plate) = filled(details.license_plate) {
            rider.license_plate = Some(license_plate);
        }
        Ok(())
    });

    state
        .store
        .update_rider(rider_id, mutation)
        .await
        .map_err(|err| hide_not_found(err, not_in_fleet))
}

fn filled(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
