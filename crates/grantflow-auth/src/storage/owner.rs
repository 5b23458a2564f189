//! Resource-owner credential verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// An authenticated resource owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwner {
    /// Stable identifier placed in the `sub` claim.
    pub subject: String,
    pub username: String,
    /// Emitted as the `roles` claim.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Verifies resource-owner credentials and resolves subjects.
#[async_trait]
pub trait ResourceOwnerStore: Send + Sync {
    /// Checks a username and password.
    ///
    /// Returns `None` when the user is unknown or the password is wrong;
    /// callers must not distinguish the two.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn authenticate(&self, username: &str, password: &str)
    -> AuthResult<Option<ResourceOwner>>;

    /// Resolves an already-authenticated subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn find_by_subject(&self, subject: &str) -> AuthResult<Option<ResourceOwner>>;
}
