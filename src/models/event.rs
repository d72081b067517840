use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};

/// Published after every committed order write so connected dashboards
/// know to refetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
    pub order: Order,
}

impl OrderEvent {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            occurred_at: order.updated_at,
            order: order.clone(),
        }
    }
}
