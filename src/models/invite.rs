use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InviteAction {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetInvite {
    pub id: Uuid,
    pub logistics_id: Uuid,
    pub email: String,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

impl FleetInvite {
    pub fn pending(logistics_id: Uuid, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            logistics_id,
            email,
            status: InviteStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.email == normalize_email(email)
    }
}

/// Invites are matched on a trimmed, lower-cased address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A pending invite as the invited rider sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceivedInvite {
    pub id: Uuid,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}
