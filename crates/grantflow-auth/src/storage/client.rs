//! Client registry trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Lookup of registered OAuth clients.
///
/// Registration and administration live outside the engine; processors only
/// read.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Finds a client by its `client_id`.
    ///
    /// Inactive clients are returned too; verifiers decide what to do with
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;
}
