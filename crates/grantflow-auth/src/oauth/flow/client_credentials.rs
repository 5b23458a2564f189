//! Client credentials grant (RFC 6749 §4.4).

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::oauth::context::TokenRequestContext;
use crate::oauth::flow::{FlowServices, GrantFlowProcessor, requested_or_client_scope};
use crate::token::TokenClaims;
use crate::types::GrantType;

/// Machine-to-machine tokens; the client is its own subject.
pub struct ClientCredentialsFlow {
    services: Arc<FlowServices>,
}

impl ClientCredentialsFlow {
    #[must_use]
    pub fn new(services: Arc<FlowServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl GrantFlowProcessor for ClientCredentialsFlow {
    fn declared_grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims> {
        let ctx = self
            .services
            .verify_token_request(ctx, GrantType::ClientCredentials)
            .await?;
        let client = ctx.verified_client()?;
        let scope = requested_or_client_scope(&ctx.scope, client);

        self.services
            .issue(
                client,
                &client.client_id,
                scope,
                GrantType::ClientCredentials,
                &[],
            )
            .await
    }
}
