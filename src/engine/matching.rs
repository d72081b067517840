//! Partner selection data for the order creation screen.

use tracing::warn;

use crate::error::AppError;
use crate::identity::Session;
use crate::models::partner::{
    CustomerContact, EligiblePartners, IndependentRider, LogisticsPartner,
};
use crate::models::profile::Role;
use crate::state::AppState;
use crate::store::RiderFilter;

const CUSTOMER_LIST_LIMIT: usize = 20;

/// Verified logistics companies and verified independent riders.
///
/// Each half is fetched independently; if one query fails that half comes
/// back empty instead of failing the whole call.
pub async fn list_eligible_partners(
    state: &AppState,
    session: &Session,
) -> Result<EligiblePartners, AppError> {
    session.require(Role::Sme)?;

    let (logistics, riders) = tokio::join!(
        state.store.list_verified_logistics(),
        state.store.list_riders(RiderFilter::IndependentVerified),
    );

    let logistics = match logistics {
        Ok(profiles) => profiles
            .into_iter()
            .map(|p| LogisticsPartner {
                id: p.id,
                company_name: p.company_name,
                fleet_size: p.fleet_size,
                city: p.city,
                state: p.state,
            })
            .collect(),
        Err(err) => {
            warn!(error = %err, "failed to load logistics partners");
            Vec::new()
        }
    };

    let riders = match riders {
        Ok(riders) => riders
            .into_iter()
            .map(|(profile, rider)| IndependentRider {
                id: rider.id,
                name: profile
                    .full_name
                    .unwrap_or_else(|| "Unknown Rider".to_string()),
                vehicle: rider.vehicle_type,
            })
            .collect(),
        Err(err) => {
            warn!(error = %err, "failed to load independent riders");
            Vec::new()
        }
    };

    Ok(EligiblePartners { logistics, riders })
}

/// Customer accounts an SME can link as the recipient of an order.
pub async fn list_customers(
    state: &AppState,
    session: &Session,
) -> Result<Vec<CustomerContact>, AppError> {
    session.require(Role::Sme)?;

    let profiles = state
        .store
        .list_profiles(Role::Customer, CUSTOMER_LIST_LIMIT)
        .await?;

    Ok(profiles
        .into_iter()
        .map(|p| CustomerContact {
            id: p.id,
            full_name: p.full_name,
            phone_number: p.phone_number,
        })
        .collect())
}
