//! Seam to the external identity/session provider.
//!
//! The service never authenticates anyone itself: a bearer token is handed to
//! an [`IdentityProvider`] which answers with the [`Session`] it belongs to.
//! Account creation on behalf of another user goes through the same provider
//! but needs a [`ServiceCredential`], which is only ever built from
//! configuration.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::AppError;
use crate::models::profile::Role;

pub use memory::MemoryIdentity;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub actor_id: Uuid,
    pub role: Role,
    pub email: String,
}

impl Session {
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "only {role} accounts may perform this action"
            )))
        }
    }
}

/// Elevated key for the provider's admin API. Zeroed on drop and never
/// printed.
#[derive(Clone)]
pub struct ServiceCredential(Zeroizing<String>);

impl ServiceCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ServiceCredential {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for ServiceCredential {}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceCredential(***REDACTED***)")
    }
}

impl fmt::Display for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

/// An identity to be created pre-confirmed through the admin API.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A fresh bearer token and the session it opens.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub access_token: String,
    pub user_id: Uuid,
    pub role: Role,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token. `Ok(None)` means the token is unknown.
    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError>;

    /// Exchanges email and password for a bearer token. Unknown emails and
    /// wrong passwords are both `Unauthorized`.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AppError>;

    /// Creates a confirmed identity and returns its id.
    async fn create_confirmed_user(
        &self,
        credential: &ServiceCredential,
        identity: NewIdentity,
    ) -> Result<Uuid, AppError>;

    /// Removes an identity created through the admin API.
    async fn delete_user(&self, credential: &ServiceCredential, id: Uuid) -> Result<(), AppError>;
}
