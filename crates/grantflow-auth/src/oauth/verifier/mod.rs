//! Request verifiers.
//!
//! A verifier checks exactly one aspect of a request and has no side
//! effects. Verifiers are closed enums rather than trait objects; the
//! [`VerifierRegistry`] holds them in the order they run.

pub mod authorization;
pub mod registry;
pub mod token;

pub use authorization::AuthorizationVerifier;
pub use registry::{VerifierRegistry, VerifierRegistryBuilder};
pub use token::TokenVerifier;

use tracing::debug;

use crate::AuthResult;
use crate::types::GrantType;

/// A single check over a request context `C`.
pub trait RequestVerifier<C> {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Grant types this verifier applies to.
    fn applicable_grant_types(&self) -> &'static [GrantType];

    /// Checks the context.
    ///
    /// # Errors
    ///
    /// Returns an `AuthError` carrying the OAuth 2.0 error code of the
    /// violation.
    fn verify(&self, ctx: &C) -> AuthResult<()>;
}

/// Runs `verifiers` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first verifier error.
pub fn run_verifiers<C, V: RequestVerifier<C>>(verifiers: &[V], ctx: &C) -> AuthResult<()> {
    for verifier in verifiers {
        if let Err(e) = verifier.verify(ctx) {
            debug!(
                verifier = verifier.name(),
                error = e.oauth_error_code(),
                "Request verification failed"
            );
            return Err(e);
        }
    }
    Ok(())
}
