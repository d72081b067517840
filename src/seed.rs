//! Demo accounts for local development against the in-memory providers.

use tracing::info;

use crate::engine::profiles::provision_account;
use crate::error::AppError;
use crate::identity::MemoryIdentity;
use crate::models::profile::{Profile, RiderStatus, Role, RoleProfile, VerificationStatus};
use crate::state::AppState;
use crate::store::AccountMutation;

const DEMO_PASSWORD: &str = "password";

const DEMO_ACCOUNTS: [(&str, Role, &str); 5] = [
    ("admin@example.com", Role::Admin, "System Admin"),
    ("sme@example.com", Role::Sme, "SME Business Owner"),
    ("logistics@example.com", Role::Logistics, "Logistics Manager"),
    ("rider@example.com", Role::Rider, "Delivery Rider"),
    ("customer@example.com", Role::Customer, "Jane Doe Customer"),
];

#[derive(Debug, Clone)]
pub struct SeededAccount {
    pub email: &'static str,
    pub role: Role,
    pub token: String,
}

/// Registers one verified, fully filled-in account per role. Emails that are
/// already registered are skipped but still get a fresh token.
pub async fn seed_demo_accounts(
    state: &AppState,
    identity: &MemoryIdentity,
) -> Result<Vec<SeededAccount>, AppError> {
    let mut seeded = Vec::with_capacity(DEMO_ACCOUNTS.len());

    for (email, role, full_name) in DEMO_ACCOUNTS {
        if let Some(id) = identity.find_by_email(email) {
            seeded.push(SeededAccount {
                email,
                role,
                token: identity.issue_token(id)?,
            });
            continue;
        }

        let (id, token) = identity.register(email, DEMO_PASSWORD, role)?;
        provision_account(
            state,
            id,
            role,
            Some(full_name.to_string()),
            Some("+2348000000000".to_string()),
        )
        .await?;
        state.store.update_account(id, demo_details()).await?;

        info!(email, role = %role, "demo account seeded");
        seeded.push(SeededAccount { email, role, token });
    }

    Ok(seeded)
}

fn demo_details() -> AccountMutation {
    Box::new(|_profile: &mut Profile, role: &mut RoleProfile| {
        match role {
            RoleProfile::Sme(p) => {
                p.business_name = Some("Demo Foods Ltd".to_string());
                p.business_address = Some("12 Awolowo Rd, Ikoyi".to_string());
                p.industry_type = Some("Food & Beverage".to_string());
                p.city = Some("Lagos".to_string());
                p.state = Some("Lagos".to_string());
            }
            RoleProfile::Logistics(p) => {
                p.company_name = Some("Demo Express".to_string());
                p.registration_number = Some("RC-1234567".to_string());
                p.fleet_size = 10;
                p.city = Some("Lagos".to_string());
                p.state = Some("Lagos".to_string());
            }
            RoleProfile::Rider(p) => {
                p.vehicle_type = Some("motorcycle".to_string());
                p.license_plate = Some("LAG-001-AA".to_string());
                p.current_status = RiderStatus::Online;
            }
            RoleProfile::Customer | RoleProfile::Admin => {}
        }

        if let Some(verification) = role.verification_mut() {
            verification.verification_status = VerificationStatus::Verified;
        }
        Ok(())
    })
}
