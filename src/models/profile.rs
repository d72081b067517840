use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Sme,
    Logistics,
    Rider,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sme => "sme",
            Role::Logistics => "logistics",
            Role::Rider => "rider",
            Role::Customer => "customer",
        }
    }

    /// Roles whose dashboards sit behind the verification gate.
    pub fn is_gated(self) -> bool {
        matches!(self, Role::Sme | Role::Logistics | Role::Rider)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    #[default]
    Offline,
    Online,
    Busy,
}

/// Metadata of a KYC document held in the external object store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub name: String,
    pub path: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        id: Uuid,
        role: Role,
        full_name: Option<String>,
        phone_number: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            full_name,
            phone_number,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields every gated role profile carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Verification {
    pub verification_status: VerificationStatus,
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Verification {
    /// Appending a document re-submits the profile for review.
    pub fn submit(&mut self, document: Document) {
        self.documents.push(document);
        self.verification_status = VerificationStatus::Pending;
        self.rejection_reason = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SmeProfile {
    pub id: Uuid,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub industry_type: Option<String>,
    #[serde(flatten)]
    pub verification: Verification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LogisticsProfile {
    pub id: Uuid,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
    pub fleet_size: u32,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(flatten)]
    pub verification: Verification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RiderProfile {
    pub id: Uuid,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub current_status: RiderStatus,
    /// Fleet membership. `None` means the rider is independent.
    pub logistics_id: Option<Uuid>,
    #[serde(flatten)]
    pub verification: Verification,
}

impl RiderProfile {
    pub fn is_independent(&self) -> bool {
        self.logistics_id.is_none()
    }
}

/// The role-specific half of an account, selected by the account's role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleProfile {
    Sme(SmeProfile),
    Logistics(LogisticsProfile),
    Rider(RiderProfile),
    Customer,
    Admin,
}

impl RoleProfile {
    /// An empty role profile, as created alongside a new account.
    pub fn blank(id: Uuid, role: Role) -> Self {
        match role {
            Role::Sme => RoleProfile::Sme(SmeProfile {
                id,
                ..Default::default()
            }),
            Role::Logistics => RoleProfile::Logistics(LogisticsProfile {
                id,
                ..Default::default()
            }),
            Role::Rider => RoleProfile::Rider(RiderProfile {
                id,
                ..Default::default()
            }),
            Role::Customer => RoleProfile::Customer,
            Role::Admin => RoleProfile::Admin,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Sme(_) => Role::Sme,
            RoleProfile::Logistics(_) => Role::Logistics,
            RoleProfile::Rider(_) => Role::Rider,
            RoleProfile::Customer => Role::Customer,
            RoleProfile::Admin => Role::Admin,
        }
    }

    pub fn verification(&self) -> Option<&Verification> {
        match self {
            RoleProfile::Sme(p) => Some(&p.verification),
            RoleProfile::Logistics(p) => Some(&p.verification),
            RoleProfile::Rider(p) => Some(&p.verification),
            RoleProfile::Customer | RoleProfile::Admin => None,
        }
    }

    pub fn verification_mut(&mut self) -> Option<&mut Verification> {
        match self {
            RoleProfile::Sme(p) => Some(&mut p.verification),
            RoleProfile::Logistics(p) => Some(&mut p.verification),
            RoleProfile::Rider(p) => Some(&mut p.verification),
            RoleProfile::Customer | RoleProfile::Admin => None,
        }
    }

    /// The document type label shown to reviewers for this kind of account.
    pub fn document_kind(&self) -> &'static str {
        match self {
            RoleProfile::Sme(_) => "Business Registration",
            RoleProfile::Logistics(_) => "CAC/License",
            _ => "ID Card",
        }
    }
}

/// A full account view: base profile plus its role half.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub profile: Profile,
    pub role_profile: RoleProfile,
}
