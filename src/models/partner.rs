use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::{RiderStatus, VerificationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticsPartner {
    pub id: Uuid,
    pub company_name: Option<String>,
    pub fleet_size: u32,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndependentRider {
    pub id: Uuid,
    pub name: String,
    pub vehicle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EligiblePartners {
    pub logistics: Vec<LogisticsPartner>,
    pub riders: Vec<IndependentRider>,
}

/// A rider as listed on its logistics company's fleet page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetRider {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub current_status: RiderStatus,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerContact {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}
