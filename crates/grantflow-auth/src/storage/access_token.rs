//! Access token storage trait.
//!
//! Tracks every issued token by JTI together with its revocation status.
//!
//! # Implementation Notes
//!
//! - Reads hide records past [`AccessTokenInfo::retained_until`]
//! - A revocation written by one caller must be visible to every later read
//! - Status never moves from `Revoked` back to `Issued`
//!
//! [`AccessTokenInfo::retained_until`]: crate::types::AccessTokenInfo::retained_until

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{AccessTokenInfo, TokenStatus};

/// Storage for issued token records.
#[async_trait]
pub trait AccessTokenStorage: Send + Sync {
    /// Inserts or replaces the record with the same JTI.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    async fn save(&self, info: &AccessTokenInfo) -> AuthResult<()>;

    /// Looks up a record by JTI.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_jti(&self, jti: &str) -> AuthResult<Option<AccessTokenInfo>>;

    /// All retained records, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self) -> AuthResult<Vec<AccessTokenInfo>>;

    /// Removes a record. Unknown JTIs are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_by_jti(&self, jti: &str) -> AuthResult<()>;

    /// Sets the status of a record.
    ///
    /// Moving to `Revoked` stamps `revoked_at` with the current time. Unknown
    /// JTIs are a no-op, as is any attempt to un-revoke or re-revoke.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn update_status_by_jti(&self, jti: &str, status: TokenStatus) -> AuthResult<()>;

    /// Atomically moves a record from `from` to `to`.
    ///
    /// Returns `true` only for the caller that performed the transition;
    /// `false` if the record is missing or not in `from`. Refresh-token
    /// rotation relies on this to make each refresh token single use.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn transition_status(
        &self,
        jti: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> AuthResult<bool>;

    /// Deletes records past their retention, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn purge_expired(&self) -> AuthResult<u64>;
}
