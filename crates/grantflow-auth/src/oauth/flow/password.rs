//! Resource owner password credentials grant (RFC 6749 §4.3).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::context::TokenRequestContext;
use crate::oauth::flow::{FlowServices, GrantFlowProcessor, requested_or_client_scope};
use crate::token::TokenClaims;
use crate::types::GrantType;

pub struct PasswordFlow {
    services: Arc<FlowServices>,
}

impl PasswordFlow {
    #[must_use]
    pub fn new(services: Arc<FlowServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl GrantFlowProcessor for PasswordFlow {
    fn declared_grant_type(&self) -> GrantType {
        GrantType::Password
    }

    async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims> {
        let ctx = self
            .services
            .verify_token_request(ctx, GrantType::Password)
            .await?;
        let client = ctx.verified_client()?;
        let username = ctx.request.username.as_deref().unwrap_or_default();
        let password = ctx.request.password.as_deref().unwrap_or_default();

        let Some(owner) = self.services.owners.authenticate(username, password).await? else {
            debug!(client_id = %client.client_id, "Resource owner authentication failed");
            return Err(AuthError::invalid_grant("Invalid resource owner credentials"));
        };

        let scope = requested_or_client_scope(&ctx.scope, client);
        self.services
            .issue(client, &owner.subject, scope, GrantType::Password, &owner.roles)
            .await
    }
}
