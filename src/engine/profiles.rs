//! Account settings, KYC document submission and rider availability.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::verification::{evaluate, GateReport};
use crate::error::AppError;
use crate::identity::Session;
use crate::models::profile::{
    Account, Document, Profile, RiderProfile, RiderStatus, Role, RoleProfile,
};
use crate::state::AppState;
use crate::store::{AccountMutation, RiderMutation};

/// Settings form payload. Fields that do not belong to the caller's role are
/// ignored; blank strings clear a field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub industry_type: Option<String>,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
    pub fleet_size: Option<u32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentUpload {
    pub name: String,
    pub path: String,
}

fn set(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *target = (!value.is_empty()).then(|| value.to_string());
    }
}

impl ProfileUpdate {
    fn apply(self, profile: &mut Profile, role_profile: &mut RoleProfile) {
        set(&mut profile.full_name, self.full_name);
        set(&mut profile.phone_number, self.phone_number);

        match role_profile {
            RoleProfile::Sme(p) => {
                set(&mut p.business_name, self.business_name);
                set(&mut p.business_address, self.business_address);
                set(&mut p.industry_type, self.industry_type);
                set(&mut p.city, self.city);
                set(&mut p.state, self.state);
            }
            RoleProfile::Logistics(p) => {
                set(&mut p.company_name, self.company_name);
                set(&mut p.registration_number, self.registration_number);
                set(&mut p.address, self.address);
                set(&mut p.city, self.city);
                set(&mut p.state, self.state);
                if let Some(fleet_size) = self.fleet_size {
                    p.fleet_size = fleet_size;
                }
            }
            RoleProfile::Rider(p) => {
                set(&mut p.vehicle_type, self.vehicle_type);
                set(&mut p.license_plate, self.license_plate);
            }
            RoleProfile::Customer | RoleProfile::Admin => {}
        }
    }
}

/// Creates the profile rows for a freshly created identity.
pub async fn provision_account(
    state: &AppState,
    id: Uuid,
    role: Role,
    full_name: Option<String>,
    phone_number: Option<String>,
) -> Result<Account, AppError> {
    let profile = Profile::new(id, role, full_name, phone_number);
    let role_profile = RoleProfile::blank(id, role);
    state
        .store
        .insert_account(profile.clone(), role_profile.clone())
        .await?;

    Ok(Account {
        profile,
        role_profile,
    })
}

pub async fn get_account(state: &AppState, session: &Session) -> Result<Account, AppError> {
    state
        .store
        .get_account(session.actor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))
}

pub async fn update_profile(
    state: &AppState,
    session: &Session,
    update: ProfileUpdate,
) -> Result<Account, AppError> {
    let mutation: AccountMutation = Box::new(move |profile: &mut Profile, role: &mut RoleProfile| {
        update.apply(profile, role);
        Ok(())
    });

    state.store.update_account(session.actor_id, mutation).await
}

/// Records a document already placed in object storage and puts the account
/// back into review.
pub async fn submit_document(
    state: &AppState,
    session: &Session,
    upload: DocumentUpload,
) -> Result<Account, AppError> {
    if !session.role.is_gated() {
        return Err(AppError::Forbidden(format!(
            "{} accounts do not submit verification documents",
            session.role
        )));
    }

    let name = upload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("document name is required".to_string()));
    }
    // Uploads are namespaced by account id in the object store.
    let prefix = format!("{}/", session.actor_id);
    if !upload.path.starts_with(&prefix) || upload.path.len() == prefix.len() {
        return Err(AppError::Validation(format!(
            "document path must live under {prefix}"
        )));
    }

    let path = upload.path;
    let mutation: AccountMutation = Box::new(move |_profile: &mut Profile, role: &mut RoleProfile| {
        let kind = role.document_kind().to_string();
        let verification = role.verification_mut().ok_or_else(|| {
            AppError::Forbidden("this account does not submit verification documents".to_string())
        })?;
        verification.submit(Document {
            name,
            path,
            uploaded_at: Utc::now(),
            kind,
        });
        Ok(())
    });

    let account = state.store.update_account(session.actor_id, mutation).await?;
    info!(actor_id = %session.actor_id, role = %session.role, "verification documents submitted");
    Ok(account)
}

/// Evaluates the dashboard gate for the caller.
pub async fn dashboard_gate(state: &AppState, session: &Session) -> Result<GateReport, AppError> {
    let account = get_account(state, session).await?;
    Ok(evaluate(&account.profile, &account.role_profile))
}

/// The rider's own online/offline switch.
pub async fn set_rider_status(
    state: &AppState,
    session: &Session,
    status: RiderStatus,
) -> Result<RiderProfile, AppError> {
    session.require(Role::Rider)?;

    let mutation: RiderMutation = Box::new(move |rider: &mut RiderProfile| {
        rider.current_status = status;
        Ok(())
    });

    let rider = state.store.update_rider(session.actor_id, mutation).await?;
    info!(rider_id = %rider.id, status = ?rider.current_status, "rider availability changed");
    Ok(rider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{LogisticsProfile, SmeProfile};

    #[test]
    fn update_touches_only_own_role_fields() {
        let id = Uuid::new_v4();
        let mut profile = Profile::new(id, Role::Sme, None, None);
        let mut role = RoleProfile::Sme(SmeProfile {
            id,
            ..Default::default()
        });

        ProfileUpdate {
            full_name: Some("  Ada Obi ".to_string()),
            business_name: Some("Obi Textiles".to_string()),
            company_name: Some("ignored".to_string()),
            vehicle_type: Some("ignored".to_string()),
            ..Default::default()
        }
        .apply(&mut profile, &mut role);

        assert_eq!(profile.full_name.as_deref(), Some("Ada Obi"));
        match role {
            RoleProfile::Sme(p) => assert_eq!(p.business_name.as_deref(), Some("Obi Textiles")),
            other => panic!("unexpected role profile {other:?}"),
        }
    }

    #[test]
    fn blank_value_clears_field() {
        let id = Uuid::new_v4();
        let mut profile = Profile::new(id, Role::Logistics, Some("Old".to_string()), None);
        let mut role = RoleProfile::Logistics(LogisticsProfile {
            id,
            company_name: Some("Old Co".to_string()),
            ..Default::default()
        });

        ProfileUpdate {
            company_name: Some("".to_string()),
            fleet_size: Some(12),
            ..Default::default()
        }
        .apply(&mut profile, &mut role);

        assert_eq!(profile.full_name.as_deref(), Some("Old"));
        match role {
            RoleProfile::Logistics(p) => {
                assert!(p.company_name.is_none());
                assert_eq!(p.fleet_size, 12);
            }
            other => panic!("unexpected role profile {other:?}"),
        }
    }
}
