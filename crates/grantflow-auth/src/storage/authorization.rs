//! Ongoing authorization storage trait.
//!
//! Holds pending authorization-code grants between the authorization
//! response and the token exchange.
//!
//! # Implementation Notes
//!
//! Implementations must:
//!
//! - Treat expired entries as absent on every read, swept or not
//! - Make [`take`](AuthorizationStorage::take) an atomic fetch-and-remove so
//!   two concurrent exchanges of one code cannot both succeed
//! - Never log authorization codes

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::OngoingAuthorization;

/// Storage for pending authorization-code grants, keyed by code.
#[async_trait]
pub trait AuthorizationStorage: Send + Sync {
    /// Stores a new pending grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    async fn save(&self, authorization: &OngoingAuthorization) -> AuthResult<()>;

    /// Looks up a pending grant without consuming it.
    ///
    /// Returns `None` for unknown and expired codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_code(&self, code: &str) -> AuthResult<Option<OngoingAuthorization>>;

    /// Removes a pending grant. Unknown codes are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, code: &str) -> AuthResult<()>;

    /// Atomically removes and returns a pending grant.
    ///
    /// An expired entry is removed and reported as `None`. Of any number of
    /// concurrent callers presenting the same code, at most one receives
    /// `Some`.
    ///
    /// A durable backend would typically implement this as:
    ///
    /// ```sql
    /// DELETE FROM ongoing_authorizations
    /// WHERE code = $1
    /// RETURNING *
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn take(&self, code: &str) -> AuthResult<Option<OngoingAuthorization>>;

    /// Deletes expired entries, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn purge_expired(&self) -> AuthResult<u64>;
}
