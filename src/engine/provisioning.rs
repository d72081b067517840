//! Direct rider provisioning by a verified logistics company.
//!
//! This is the one path that acts with the identity provider's service
//! credential. The credential comes from configuration only; nothing in the
//! request can select or supply it.

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::{NewIdentity, Session};
use crate::models::profile::{
    Profile, RiderProfile, RiderStatus, Role, RoleProfile, Verification, VerificationStatus,
};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRiderRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedRider {
    pub id: Uuid,
    pub message: &'static str,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn create_rider(
    state: &AppState,
    session: &Session,
    request: NewRiderRequest,
) -> Result<CreatedRider, AppError> {
    session.require(Role::Logistics)?;
    let logistics_id = session.actor_id;

    let verified = state
        .store
        .get_logistics(logistics_id)
        .await?
        .is_some_and(|p| p.verification.verification_status == VerificationStatus::Verified);
    if !verified {
        return Err(AppError::Forbidden(
            "only verified logistics companies can create riders".to_string(),
        ));
    }

    let (Some(email), Some(password), Some(full_name)) = (
        present(request.email),
        request.password.filter(|p| !p.is_empty()),
        present(request.full_name),
    ) else {
        return Err(AppError::Validation(
            "email, password and full_name are required".to_string(),
        ));
    };

    let credential = state.service_credential.as_ref().ok_or_else(|| {
        AppError::Internal("server configuration error: missing service role key".to_string())
    })?;

    let rider_id = state
        .identity
        .create_confirmed_user(
            credential,
            NewIdentity {
                email,
                password,
                role: Role::Rider,
            },
        )
        .await?;

    let profile = Profile::new(
        rider_id,
        Role::Rider,
        Some(full_name),
        present(request.phone_number),
    );
    let rider = RoleProfile::Rider(RiderProfile {
        id: rider_id,
        vehicle_type: present(request.vehicle_type),
        license_plate: present(request.license_plate),
        current_status: RiderStatus::Offline,
        logistics_id: Some(logistics_id),
        verification: Verification {
            verification_status: VerificationStatus::Verified,
            ..Default::default()
        },
    });

    if let Err(err) = state.store.insert_account(profile, rider).await {
        error!(rider_id = %rider_id, error = %err, "rider identity created without profile");
        if let Err(cleanup) = state.identity.delete_user(credential, rider_id).await {
            error!(rider_id = %rider_id, error = %cleanup, "failed to roll back rider identity");
        }
        return Err(err);
    }

    info!(rider_id = %rider_id, logistics_id = %logistics_id, "rider provisioned into fleet");
    Ok(CreatedRider {
        id: rider_id,
        message: "Rider created successfully",
    })
}
