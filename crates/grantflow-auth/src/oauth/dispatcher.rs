//! Entry point for the web layer.
//!
//! The dispatcher only routes: it picks the processor registered for the
//! request's grant type and hands the context over untouched.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::authorize::AuthorizationResponse;
use crate::oauth::context::{AuthorizationRequestContext, TokenRequestContext};
use crate::oauth::flow::{FlowServices, GrantFlow, GrantFlowProcessor};
use crate::token::TokenClaims;
use crate::types::GrantType;

/// Routes requests to grant flow processors.
pub struct FlowDispatcher {
    processors: HashMap<GrantType, GrantFlow>,
}

impl FlowDispatcher {
    /// Registers `flows`, keyed by their declared grant type.
    ///
    /// A later flow replaces an earlier one with the same grant type.
    pub fn new(flows: impl IntoIterator<Item = GrantFlow>) -> Self {
        let processors = flows
            .into_iter()
            .map(|flow| (flow.declared_grant_type(), flow))
            .collect();
        Self { processors }
    }

    /// Registers a processor for every grant type enabled in configuration.
    #[must_use]
    pub fn from_config(services: Arc<FlowServices>) -> Self {
        let grants = services.config.oauth.grant_types.clone();
        Self::new(
            grants
                .into_iter()
                .map(|grant| GrantFlow::new(grant, services.clone())),
        )
    }

    /// Registered grant types, in a stable order.
    #[must_use]
    pub fn registered_grant_types(&self) -> Vec<GrantType> {
        let mut grants: Vec<_> = self.processors.keys().copied().collect();
        grants.sort();
        grants
    }

    /// Handles an authorization request with the authorization code flow.
    ///
    /// # Errors
    ///
    /// `UnsupportedGrantType` if that flow is not registered, otherwise
    /// whatever the processor returns.
    pub async fn process_authorization_request(
        &self,
        ctx: &AuthorizationRequestContext,
    ) -> AuthResult<AuthorizationResponse> {
        self.processor(GrantType::AuthorizationCode)?
            .process_authorization_request(ctx)
            .await
    }

    /// Handles a token request with the processor for its grant type.
    ///
    /// # Errors
    ///
    /// `UnsupportedGrantType` for unknown or unregistered grant types,
    /// otherwise whatever the processor returns.
    pub async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims> {
        let grant_type = ctx.grant_type()?;
        debug!(grant_type = %grant_type, client_id = ?ctx.client_id(), "Dispatching token request");
        self.processor(grant_type)?.process_token_request(ctx).await
    }

    fn processor(&self, grant_type: GrantType) -> AuthResult<&GrantFlow> {
        self.processors
            .get(&grant_type)
            .ok_or_else(|| AuthError::unsupported_grant_type(grant_type.as_str()))
    }
}
