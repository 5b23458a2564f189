//! Refresh token grant (RFC 6749 §6).
//!
//! Refresh tokens rotate: each one is bound to the JTI of the access-token
//! record it was issued with, and exchanging it revokes that record. The
//! revocation is a compare-and-swap, so a refresh token works at most once
//! even when presented concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::AuthResult;
use crate::error::AuthError;
use crate::notify::NotificationEvent;
use crate::oauth::context::TokenRequestContext;
use crate::oauth::flow::{FlowServices, GrantFlowProcessor};
use crate::token::TokenClaims;
use crate::types::{GrantType, TokenStatus};

pub struct RefreshTokenFlow {
    services: Arc<FlowServices>,
}

impl RefreshTokenFlow {
    #[must_use]
    pub fn new(services: Arc<FlowServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl GrantFlowProcessor for RefreshTokenFlow {
    fn declared_grant_type(&self) -> GrantType {
        GrantType::RefreshToken
    }

    async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims> {
        let ctx = self
            .services
            .verify_token_request(ctx, GrantType::RefreshToken)
            .await?;
        let client = ctx.verified_client()?;
        let presented = ctx.request.refresh_token.as_deref().unwrap_or_default();

        let refresh = self.services.signer.decode_refresh_token(presented)?;
        if refresh.client_id != client.client_id {
            debug!(client_id = %client.client_id, "Refresh token presented by another client");
            return Err(AuthError::invalid_grant(
                "Refresh token was issued to another client",
            ));
        }

        let previous = self
            .services
            .tokens
            .find_by_jti(&refresh.jti)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("Refresh token is invalid or expired"))?;
        if previous.is_revoked() {
            return Err(AuthError::invalid_grant("Refresh token has been revoked"));
        }
        if previous.client_id != client.client_id || previous.refresh_expires_at.is_none() {
            return Err(AuthError::invalid_grant("Refresh token is invalid or expired"));
        }

        // Narrowing only; an empty request keeps the original grant.
        let scope = if ctx.scope.is_empty() {
            previous.scope.clone()
        } else if ctx.scope.is_subset(&previous.scope) {
            ctx.scope.clone()
        } else {
            let extra: Vec<_> = ctx.scope.difference(&previous.scope).collect();
            return Err(AuthError::invalid_scope(format!(
                "Scope exceeds the original grant: {}",
                extra.join(" ")
            )));
        };

        let rotated = self
            .services
            .tokens
            .transition_status(&previous.jti, TokenStatus::Issued, TokenStatus::Revoked)
            .await?;
        if !rotated {
            return Err(AuthError::invalid_grant("Refresh token has already been used"));
        }
        info!(client_id = %client.client_id, jti = %previous.jti, "Token revoked by refresh");
        self.services.notify(NotificationEvent::TokenRevoked {
            jti: previous.jti.clone(),
            client_id: previous.client_id.clone(),
            subject: previous.subject.clone(),
        });

        let roles = self.services.roles_of(&previous.subject).await?;
        self.services
            .issue(
                client,
                &previous.subject,
                scope,
                GrantType::RefreshToken,
                &roles,
            )
            .await
    }
}
