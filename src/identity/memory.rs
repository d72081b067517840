use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha3::{Digest, Sha3_256};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::{IdentityProvider, NewIdentity, ServiceCredential, Session, SignedIn};
use crate::models::invite::normalize_email;
use crate::models::profile::Role;

#[derive(Debug, Clone)]
struct Identity {
    id: Uuid,
    email: String,
    role: Role,
    password_digest: String,
}

/// In-process identity provider used for development and tests.
pub struct MemoryIdentity {
    identities: DashMap<Uuid, Identity>,
    emails: DashMap<String, Uuid>,
    tokens: DashMap<String, Uuid>,
    service_key: Option<ServiceCredential>,
}

impl MemoryIdentity {
    pub fn new(service_key: Option<ServiceCredential>) -> Self {
        Self {
            identities: DashMap::new(),
            emails: DashMap::new(),
            tokens: DashMap::new(),
            service_key,
        }
    }

    /// Registers a self-service account and signs it in.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(Uuid, String), AppError> {
        let id = self.insert(email, password, role)?;
        let token = self.issue_token(id)?;
        Ok((id, token))
    }

    /// Issues a fresh bearer token for an existing identity.
    pub fn issue_token(&self, id: Uuid) -> Result<String, AppError> {
        if !self.identities.contains_key(&id) {
            return Err(AppError::NotFound(format!("identity {id} not found")));
        }

        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), id);
        Ok(token)
    }

    pub fn find_by_email(&self, email: &str) -> Option<Uuid> {
        self.emails
            .get(&normalize_email(email))
            .map(|entry| *entry.value())
    }

    pub fn verify_password(&self, id: Uuid, password: &str) -> bool {
        self.identities
            .get(&id)
            .is_some_and(|identity| identity.password_digest == digest(password))
    }

    fn authorize(&self, credential: &ServiceCredential) -> Result<(), AppError> {
        match &self.service_key {
            Some(expected) if expected.expose_secret() == credential.expose_secret() => Ok(()),
            _ => Err(AppError::Forbidden("invalid service credential".to_string())),
        }
    }

    fn insert(&self, email: &str, password: &str, role: Role) -> Result<Uuid, AppError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::Validation("email is required".to_string()));
        }

        let id = match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!("{email} is already registered")));
            }
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(id);
                id
            }
        };

        self.identities.insert(
            id,
            Identity {
                id,
                email,
                role,
                password_digest: digest(password),
            },
        );

        Ok(id)
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<Session>, AppError> {
        let Some(id) = self.tokens.get(token).map(|entry| *entry.value()) else {
            return Ok(None);
        };

        Ok(self.identities.get(&id).map(|identity| Session {
            actor_id: identity.id,
            role: identity.role,
            email: identity.email.clone(),
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AppError> {
        let id = self
            .find_by_email(email)
            .filter(|id| self.verify_password(*id, password))
            .ok_or(AppError::Unauthorized)?;
        let role = self
            .identities
            .get(&id)
            .map(|identity| identity.role)
            .ok_or(AppError::Unauthorized)?;

        Ok(SignedIn {
            access_token: self.issue_token(id)?,
            user_id: id,
            role,
        })
    }

    async fn create_confirmed_user(
        &self,
        credential: &ServiceCredential,
        identity: NewIdentity,
    ) -> Result<Uuid, AppError> {
        self.authorize(credential)?;
        self.insert(&identity.email, &identity.password, identity.role)
    }

    async fn delete_user(&self, credential: &ServiceCredential, id: Uuid) -> Result<(), AppError> {
        self.authorize(credential)?;

        let (_, identity) = self
            .identities
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("identity {id} not found")))?;
        self.emails.remove(&identity.email);
        self.tokens.retain(|_, owner| *owner != id);
        Ok(())
    }
}

fn digest(password: &str) -> String {
    hex::encode(Sha3_256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_token_resolves_to_session() {
        let identity = MemoryIdentity::default();
        let (id, token) = identity
            .register("Rider@Example.com ", "secret", Role::Rider)
            .unwrap();

        let session = identity.resolve(&token).await.unwrap().unwrap();
        assert_eq!(session.actor_id, id);
        assert_eq!(session.role, Role::Rider);
        assert_eq!(session.email, "rider@example.com");
        assert!(identity.resolve("bogus").await.unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let identity = MemoryIdentity::default();
        identity.register("a@example.com", "pw", Role::Sme).unwrap();
        let err = identity
            .register("A@example.com", "pw", Role::Rider)
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn sign_in_checks_the_password_digest() {
        let identity = MemoryIdentity::default();
        let (id, _) = identity.register("a@example.com", "pw", Role::Sme).unwrap();

        let signed_in = identity.sign_in(" A@example.com", "pw").await.unwrap();
        assert_eq!(signed_in.user_id, id);
        assert_eq!(signed_in.role, Role::Sme);
        let session = identity.resolve(&signed_in.access_token).await.unwrap();
        assert_eq!(session.map(|s| s.actor_id), Some(id));

        assert!(matches!(
            identity.sign_in("a@example.com", "PW").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            identity.sign_in("b@example.com", "pw").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn password_is_stored_as_digest() {
        let identity = MemoryIdentity::default();
        let (id, _) = identity.register("a@example.com", "pw", Role::Sme).unwrap();
        assert!(identity.verify_password(id, "pw"));
        assert!(!identity.verify_password(id, "PW"));
    }

    #[tokio::test]
    async fn admin_create_requires_matching_credential() {
        let identity = MemoryIdentity::new(Some(ServiceCredential::new("root-key")));
        let new = NewIdentity {
            email: "r@example.com".to_string(),
            password: "pw".to_string(),
            role: Role::Rider,
        };

        let err = identity
            .create_confirmed_user(&ServiceCredential::new("guess"), new.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let key = ServiceCredential::new("root-key");
        let id = identity.create_confirmed_user(&key, new).await.unwrap();
        assert_eq!(identity.find_by_email("r@example.com"), Some(id));

        identity.delete_user(&key, id).await.unwrap();
        assert_eq!(identity.find_by_email("r@example.com"), None);
    }
}
