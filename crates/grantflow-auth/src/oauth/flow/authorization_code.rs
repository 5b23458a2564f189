//! Authorization code grant (RFC 6749 §4.1) with PKCE (RFC 7636).

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::authorize::AuthorizationResponse;
use crate::oauth::context::{AuthorizationRequestContext, TokenRequestContext};
use crate::oauth::flow::{FlowServices, GrantFlowProcessor, requested_or_client_scope};
use crate::oauth::pkce::{PkceChallenge, PkceChallengeMethod, PkceVerifier};
use crate::oauth::verifier::run_verifiers;
use crate::token::TokenClaims;
use crate::types::{Client, GrantType, OngoingAuthorization};

pub struct AuthorizationCodeFlow {
    services: Arc<FlowServices>,
}

impl AuthorizationCodeFlow {
    #[must_use]
    pub fn new(services: Arc<FlowServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl GrantFlowProcessor for AuthorizationCodeFlow {
    fn declared_grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    async fn process_authorization_request(
        &self,
        ctx: &AuthorizationRequestContext,
    ) -> AuthResult<AuthorizationResponse> {
        if ctx.subject.is_empty() {
            return Err(AuthError::access_denied("Resource owner is not authenticated"));
        }

        let client = self
            .services
            .clients
            .find_by_client_id(&ctx.request.client_id)
            .await?;
        let ctx = ctx.clone().with_client(client);
        run_verifiers(self.services.verifiers.authorization_request_verifiers(), &ctx)?;

        let client = ctx
            .client()
            .ok_or_else(|| AuthError::invalid_client("Unknown client"))?;
        let redirect_uri = ctx
            .effective_redirect_uri()
            .ok_or_else(|| AuthError::invalid_request("redirect_uri is required"))?
            .to_string();

        let now = OffsetDateTime::now_utc();
        let expires_at = now
            .checked_add(self.services.config.oauth.authorization_code_ttl())
            .ok_or_else(|| AuthError::configuration("Authorization code lifetime out of range"))?;
        let code_challenge = ctx.request.code_challenge.clone();
        let authorization = OngoingAuthorization {
            code: OngoingAuthorization::generate_code(),
            client_id: client.client_id.clone(),
            redirect_uri: redirect_uri.clone(),
            scope: requested_or_client_scope(&ctx.scope, client),
            subject: ctx.subject.clone(),
            code_challenge_method: code_challenge.as_ref().map(|_| PkceChallengeMethod::S256),
            code_challenge,
            created_at: now,
            expires_at,
        };
        self.services.authorizations.save(&authorization).await?;

        info!(client_id = %client.client_id, "Authorization code issued");

        Ok(AuthorizationResponse {
            code: authorization.code,
            state: ctx.request.state.clone(),
            redirect_uri,
        })
    }

    async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims> {
        let ctx = self
            .services
            .verify_token_request(ctx, GrantType::AuthorizationCode)
            .await?;
        let client = ctx.verified_client()?;
        let code = ctx.request.code.as_deref().unwrap_or_default();

        // Consumed here; any failure below still burns the code.
        let authorization = self
            .services
            .authorizations
            .take(code)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("Authorization code is invalid or expired"))?;

        check_binding(&authorization, client, &ctx)?;
        check_pkce(&authorization, ctx.request.code_verifier.as_deref())?;

        let roles = self.services.roles_of(&authorization.subject).await?;
        self.services
            .issue(
                client,
                &authorization.subject,
                authorization.scope,
                GrantType::AuthorizationCode,
                &roles,
            )
            .await
    }
}

fn check_binding(
    authorization: &OngoingAuthorization,
    client: &Client,
    ctx: &TokenRequestContext,
) -> AuthResult<()> {
    if authorization.client_id != client.client_id {
        debug!(client_id = %client.client_id, "Authorization code presented by another client");
        return Err(AuthError::invalid_grant(
            "Authorization code was issued to another client",
        ));
    }
    let matches = match ctx.request.redirect_uri.as_deref() {
        Some(uri) => uri == authorization.redirect_uri,
        // Omitted only if the client could not have chosen another URI.
        None => client.default_redirect_uri() == Some(authorization.redirect_uri.as_str()),
    };
    if matches {
        Ok(())
    } else {
        Err(AuthError::invalid_grant(
            "redirect_uri does not match the authorization request",
        ))
    }
}

fn check_pkce(authorization: &OngoingAuthorization, verifier: Option<&str>) -> AuthResult<()> {
    match (&authorization.code_challenge, verifier) {
        (Some(challenge), Some(verifier)) => {
            let challenge = PkceChallenge::new(challenge.as_str())
                .map_err(|e| AuthError::invalid_grant(e.to_string()))?;
            let verifier = PkceVerifier::new(verifier)?;
            challenge
                .verify(&verifier)
                .map_err(|e| AuthError::invalid_grant(e.to_string()))
        }
        (Some(_), None) => Err(AuthError::invalid_grant("code_verifier is required")),
        (None, Some(_)) => Err(AuthError::invalid_grant(
            "code_verifier given but the authorization request had no code_challenge",
        )),
        (None, None) => Ok(()),
    }
}
