//! In-memory storage backed by `DashMap`.
//!
//! DashMap locks per shard, so each compound operation on a single key
//! (`take`, `transition_status`, `update_status_by_jti`) runs under that key's
//! write lock and cannot interleave with another operation on the same key.
//! Nothing here survives a restart.

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::secret;
use crate::storage::{
    AccessTokenStorage, AuthorizationStorage, ClientRegistry, ResourceOwner, ResourceOwnerStore,
};
use crate::types::{
    AccessTokenInfo, Client, ClientValidationError, OngoingAuthorization, TokenStatus,
};

// =============================================================================
// Ongoing authorizations
// =============================================================================

/// Pending authorization codes.
#[derive(Default)]
pub struct InMemoryAuthorizationStorage {
    entries: DashMap<String, OngoingAuthorization>,
}

impl InMemoryAuthorizationStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AuthorizationStorage for InMemoryAuthorizationStorage {
    async fn save(&self, authorization: &OngoingAuthorization) -> AuthResult<()> {
        self.entries
            .insert(authorization.code.clone(), authorization.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> AuthResult<Option<OngoingAuthorization>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .entries
            .get(code)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, code: &str) -> AuthResult<()> {
        self.entries.remove(code);
        Ok(())
    }

    async fn take(&self, code: &str) -> AuthResult<Option<OngoingAuthorization>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .entries
            .remove(code)
            .map(|(_, entry)| entry)
            .filter(|entry| !entry.is_expired_at(now)))
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

// =============================================================================
// Access tokens
// =============================================================================

/// Issued token records.
#[derive(Default)]
pub struct InMemoryAccessTokenStorage {
    tokens: DashMap<String, AccessTokenInfo>,
}

impl InMemoryAccessTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored records, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl AccessTokenStorage for InMemoryAccessTokenStorage {
    async fn save(&self, info: &AccessTokenInfo) -> AuthResult<()> {
        if info.is_revoked() != info.revoked_at.is_some() {
            return Err(AuthError::storage(format!(
                "Token {} has status {} but revoked_at is {:?}",
                info.jti, info.status, info.revoked_at
            )));
        }
        self.tokens.insert(info.jti.clone(), info.clone());
        Ok(())
    }

    async fn find_by_jti(&self, jti: &str) -> AuthResult<Option<AccessTokenInfo>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .tokens
            .get(jti)
            .filter(|info| !info.is_stale_at(now))
            .map(|info| info.value().clone()))
    }

    async fn list(&self) -> AuthResult<Vec<AccessTokenInfo>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .tokens
            .iter()
            .filter(|entry| !entry.is_stale_at(now))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_by_jti(&self, jti: &str) -> AuthResult<()> {
        self.tokens.remove(jti);
        Ok(())
    }

    async fn update_status_by_jti(&self, jti: &str, status: TokenStatus) -> AuthResult<()> {
        if let Some(mut info) = self.tokens.get_mut(jti) {
            if status == TokenStatus::Revoked {
                info.revoke(OffsetDateTime::now_utc());
            }
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        jti: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> AuthResult<bool> {
        let now = OffsetDateTime::now_utc();
        let Some(mut info) = self.tokens.get_mut(jti) else {
            return Ok(false);
        };
        if info.status != from || info.is_stale_at(now) {
            return Ok(false);
        }
        match to {
            TokenStatus::Revoked => Ok(info.revoke(now)),
            // Revoked records never come back; Issued -> Issued changes nothing.
            TokenStatus::Issued => Ok(from == TokenStatus::Issued),
        }
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut removed = 0u64;
        self.tokens.retain(|_, info| {
            if info.is_stale_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

// =============================================================================
// Clients
// =============================================================================

/// Client registrations.
#[derive(Default)]
pub struct InMemoryClientRegistry {
    clients: DashMap<String, Client>,
}

impl InMemoryClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a registration, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns the validation error for inconsistent registrations.
    pub fn register(&self, client: Client) -> Result<(), ClientValidationError> {
        client.validate()?;
        self.clients.insert(client.client_id.clone(), client);
        Ok(())
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|c| c.value().clone()))
    }
}

// =============================================================================
// Resource owners
// =============================================================================

#[derive(Clone)]
struct OwnerRecord {
    owner: ResourceOwner,
    password_hash: String,
}

/// Resource owners with Argon2id-hashed passwords, keyed by username.
#[derive(Default)]
pub struct InMemoryResourceOwnerStore {
    owners: DashMap<String, OwnerRecord>,
    /// subject -> username
    subjects: DashMap<String, String>,
}

impl InMemoryResourceOwnerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user. The password is hashed before storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if hashing fails.
    pub fn add_user(
        &self,
        username: impl Into<String>,
        password: &str,
        subject: impl Into<String>,
        roles: Vec<String>,
    ) -> AuthResult<()> {
        let username = username.into();
        let password_hash =
            secret::hash_secret(password).map_err(|e| AuthError::internal(e.to_string()))?;
        let subject = subject.into();
        let owner = ResourceOwner {
            subject: subject.clone(),
            username: username.clone(),
            roles,
        };
        let previous = self.owners.insert(
            username.clone(),
            OwnerRecord {
                owner,
                password_hash,
            },
        );
        if let Some(previous) = previous.filter(|p| p.owner.subject != subject) {
            self.subjects
                .remove_if(&previous.owner.subject, |_, name| *name == username);
        }
        self.subjects.insert(subject, username);
        Ok(())
    }
}

#[async_trait]
impl ResourceOwnerStore for InMemoryResourceOwnerStore {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<ResourceOwner>> {
        // Clone out so the shard lock is not held across hashing.
        let Some(record) = self.owners.get(username).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        let matches = secret::verify_secret(password, &record.password_hash)
            .map_err(|e| AuthError::storage(e.to_string()))?;
        Ok(matches.then_some(record.owner))
    }

    async fn find_by_subject(&self, subject: &str) -> AuthResult<Option<ResourceOwner>> {
        let Some(username) = self.subjects.get(subject).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        Ok(self
            .owners
            .get(&username)
            .filter(|r| r.owner.subject == subject)
            .map(|r| r.owner.clone()))
    }
}
