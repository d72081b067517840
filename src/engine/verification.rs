//! Dashboard access gate for SME, logistics and rider accounts.
//!
//! Access is derived on every request from the account as stored: first the
//! profile has to be mostly filled in, then the KYC review has to have passed.
//! Nothing here is persisted.

use serde::Serialize;

use crate::models::profile::{Profile, RoleProfile, VerificationStatus};

/// Minimum completion percentage before verification status is considered.
pub const COMPLETION_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateDecision {
    /// Show the dashboard.
    Granted,
    /// Block with the "complete your profile" screen.
    IncompleteProfile,
    /// Documents are submitted and under review.
    UnderReview,
    /// Review failed; the reason is shown and documents may be re-uploaded.
    Rejected { reason: Option<String> },
    /// No documents submitted yet.
    AwaitingDocuments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    pub completion: u8,
    #[serde(flatten)]
    pub decision: GateDecision,
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Share of expected profile fields that are filled in, as a rounded
/// percentage.
pub fn profile_completion(profile: &Profile, role_profile: &RoleProfile) -> u8 {
    let common = [&profile.full_name, &profile.phone_number];

    let role_fields: Vec<&Option<String>> = match role_profile {
        RoleProfile::Sme(p) => vec![&p.business_name, &p.business_address, &p.industry_type],
        RoleProfile::Logistics(p) => vec![&p.company_name, &p.registration_number],
        RoleProfile::Rider(p) => vec![&p.vehicle_type, &p.license_plate],
        RoleProfile::Customer | RoleProfile::Admin => Vec::new(),
    };

    let total = common.len() + role_fields.len();
    let filled = common
        .into_iter()
        .chain(role_fields)
        .filter(|value| is_filled(value))
        .count();

    ((filled as f64 / total as f64) * 100.0).round() as u8
}

pub fn evaluate(profile: &Profile, role_profile: &RoleProfile) -> GateReport {
    let completion = profile_completion(profile, role_profile);

    let decision = match role_profile.verification() {
        // Customer and admin dashboards are not gated.
        None => GateDecision::Granted,
        Some(_) if completion < COMPLETION_THRESHOLD => GateDecision::IncompleteProfile,
        Some(verification) => match verification.verification_status {
            VerificationStatus::Verified => GateDecision::Granted,
            VerificationStatus::Pending => GateDecision::UnderReview,
            VerificationStatus::Rejected => GateDecision::Rejected {
                reason: verification.rejection_reason.clone(),
            },
            VerificationStatus::Unverified => GateDecision::AwaitingDocuments,
        },
    };

    GateReport {
        completion,
        decision,
    }
}
