use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One leg of a delivery: where to go and who to meet there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub address: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub contact_name: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackageSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl PackageSize {
    /// Flat fee quoted to the SME when it does not name its own price.
    pub fn estimated_fee(self) -> f64 {
        match self {
            PackageSize::Small => 800.0,
            PackageSize::Medium => 1500.0,
            PackageSize::Large => 2500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Assigned => "assigned",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub sme_id: Uuid,
    pub business_id: Option<Uuid>,
    pub rider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub pickup: Stop,
    pub delivery: Stop,
    pub package_description: Option<String>,
    pub package_size: PackageSize,
    pub delivery_fee: Option<f64>,
    pub distance_km: Option<f64>,
    pub estimated_duration_mins: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Neither a company nor a rider has been pinned or has claimed it yet.
    pub fn is_broadcast(&self) -> bool {
        self.business_id.is_none() && self.rider_id.is_none()
    }
}

/// A validated order ready to be persisted. The store assigns identity,
/// order number and timestamps.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub sme_id: Uuid,
    pub business_id: Option<Uuid>,
    pub rider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub pickup: Stop,
    pub delivery: Stop,
    pub package_description: Option<String>,
    pub package_size: PackageSize,
    pub delivery_fee: Option<f64>,
    pub distance_km: Option<f64>,
    pub estimated_duration_mins: Option<u32>,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid, order_number: String, now: DateTime<Utc>) -> Order {
        Order {
            id,
            order_number,
            sme_id: self.sme_id,
            business_id: self.business_id,
            rider_id: self.rider_id,
            customer_id: self.customer_id,
            status: self.status,
            pickup: self.pickup,
            delivery: self.delivery,
            package_description: self.package_description,
            package_size: self.package_size,
            delivery_fee: self.delivery_fee,
            distance_km: self.distance_km,
            estimated_duration_mins: self.estimated_duration_mins,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Which slice of a role's orders a listing should return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderScope {
    #[default]
    All,
    Active,
    History,
}

impl OrderScope {
    pub fn admits(self, status: OrderStatus) -> bool {
        match self {
            OrderScope::All => true,
            OrderScope::Active => !status.is_terminal(),
            OrderScope::History => status.is_terminal(),
        }
    }
}
