//! Verifier registry.
//!
//! Built once at startup and read-only afterwards, so processors share it
//! through an `Arc` without locking.

use std::collections::HashMap;

use crate::oauth::context::TokenRequestContext;
use crate::oauth::verifier::{AuthorizationVerifier, RequestVerifier, TokenVerifier};
use crate::types::GrantType;

/// Verifiers indexed by request kind and grant type, in run order.
#[derive(Debug, Clone, Default)]
pub struct VerifierRegistry {
    authorization: Vec<AuthorizationVerifier>,
    token: HashMap<GrantType, Vec<TokenVerifier>>,
}

impl VerifierRegistry {
    /// The full standard verifier set.
    #[must_use]
    pub fn standard() -> Self {
        let mut builder = Self::builder();
        for verifier in AuthorizationVerifier::STANDARD {
            builder = builder.authorization(verifier);
        }
        for verifier in TokenVerifier::STANDARD {
            builder = builder.token(verifier);
        }
        builder.build()
    }

    #[must_use]
    pub fn builder() -> VerifierRegistryBuilder {
        VerifierRegistryBuilder::default()
    }

    /// Verifiers for authorization requests.
    #[must_use]
    pub fn authorization_request_verifiers(&self) -> &[AuthorizationVerifier] {
        &self.authorization
    }

    /// Verifiers for token requests of `grant_type`.
    #[must_use]
    pub fn token_request_verifiers(&self, grant_type: GrantType) -> &[TokenVerifier] {
        self.token.get(&grant_type).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builder preserving registration order.
#[derive(Debug, Default)]
pub struct VerifierRegistryBuilder {
    registry: VerifierRegistry,
}

impl VerifierRegistryBuilder {
    #[must_use]
    pub fn authorization(mut self, verifier: AuthorizationVerifier) -> Self {
        self.registry.authorization.push(verifier);
        self
    }

    /// Registers `verifier` under each grant type it applies to.
    #[must_use]
    pub fn token(mut self, verifier: TokenVerifier) -> Self {
        let grants = RequestVerifier::<TokenRequestContext>::applicable_grant_types(&verifier);
        for grant_type in grants {
            self.registry
                .token
                .entry(*grant_type)
                .or_default()
                .push(verifier);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> VerifierRegistry {
        self.registry
    }
}
