//! Grant flow processors.
//!
//! One processor per grant type, gathered in the closed [`GrantFlow`] enum.
//! Every processor follows the same shape:
//!
//! 1. Resolve the client and run the registry's verifiers for the grant
//! 2. Resolve subject and scope the grant-specific way
//! 3. Build [`TokenClaims`] with a fresh JTI
//! 4. Record an `Issued` [`AccessTokenInfo`]
//! 5. Return the claims for signing
//!
//! Verification always finishes before the first store mutation, so a
//! rejected request leaves nothing behind.

pub mod authorization_code;
pub mod client_credentials;
pub mod password;
pub mod refresh_token;

pub use authorization_code::AuthorizationCodeFlow;
pub use client_credentials::ClientCredentialsFlow;
pub use password::PasswordFlow;
pub use refresh_token::RefreshTokenFlow;

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::info;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::notify::{NotificationDispatcher, NotificationEvent};
use crate::oauth::authorize::AuthorizationResponse;
use crate::oauth::context::{AuthorizationRequestContext, TokenRequestContext};
use crate::oauth::verifier::{VerifierRegistry, run_verifiers};
use crate::storage::{AccessTokenStorage, AuthorizationStorage, ClientRegistry, ResourceOwnerStore};
use crate::token::{KeyRegistry, TokenClaims, TokenSigner};
use crate::types::{AccessTokenInfo, Client, GrantType, ScopeSet, TokenStatus};

/// Behaviour shared by all grant flows.
#[async_trait]
pub trait GrantFlowProcessor: Send + Sync {
    /// The grant type this processor handles.
    fn declared_grant_type(&self) -> GrantType;

    /// Handles an authorization request.
    ///
    /// Only the authorization code flow implements this.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` unless overridden.
    async fn process_authorization_request(
        &self,
        _ctx: &AuthorizationRequestContext,
    ) -> AuthResult<AuthorizationResponse> {
        Err(AuthError::unsupported_operation(format!(
            "{} does not handle authorization requests",
            self.declared_grant_type()
        )))
    }

    /// Handles a token request.
    ///
    /// # Errors
    ///
    /// Returns the OAuth 2.0 error of the first failed check.
    async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims>;
}

/// Collaborators shared by every processor.
pub struct FlowServices {
    pub config: Arc<AuthConfig>,
    pub clients: Arc<dyn ClientRegistry>,
    pub owners: Arc<dyn ResourceOwnerStore>,
    pub authorizations: Arc<dyn AuthorizationStorage>,
    pub tokens: Arc<dyn AccessTokenStorage>,
    pub signer: Arc<TokenSigner>,
    pub verifiers: Arc<VerifierRegistry>,
    pub notifier: Option<NotificationDispatcher>,
}

impl FlowServices {
    /// Wires the services with the standard verifier set and no notifier.
    #[must_use]
    pub fn new(
        config: Arc<AuthConfig>,
        keys: Arc<KeyRegistry>,
        clients: Arc<dyn ClientRegistry>,
        owners: Arc<dyn ResourceOwnerStore>,
        authorizations: Arc<dyn AuthorizationStorage>,
        tokens: Arc<dyn AccessTokenStorage>,
    ) -> Self {
        let signer = Arc::new(TokenSigner::new(keys, &config));
        Self {
            config,
            clients,
            owners,
            authorizations,
            tokens,
            signer,
            verifiers: Arc::new(VerifierRegistry::standard()),
            notifier: None,
        }
    }

    #[must_use]
    pub fn with_verifiers(mut self, verifiers: VerifierRegistry) -> Self {
        self.verifiers = Arc::new(verifiers);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: NotificationDispatcher) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Attaches the client registration and runs the token verifiers.
    pub(crate) async fn verify_token_request(
        &self,
        ctx: &TokenRequestContext,
        grant_type: GrantType,
    ) -> AuthResult<TokenRequestContext> {
        let client = match ctx.client_id() {
            Some(client_id) if !client_id.is_empty() => {
                self.clients.find_by_client_id(client_id).await?
            }
            _ => None,
        };
        let ctx = ctx.clone().with_client(client);
        run_verifiers(self.verifiers.token_request_verifiers(grant_type), &ctx)?;
        Ok(ctx)
    }

    /// Roles of `subject`, empty when it is not a known resource owner.
    pub(crate) async fn roles_of(&self, subject: &str) -> AuthResult<Vec<String>> {
        Ok(self
            .owners
            .find_by_subject(subject)
            .await?
            .map(|owner| owner.roles)
            .unwrap_or_default())
    }

    /// Builds claims, records the token and announces it.
    pub(crate) async fn issue(
        &self,
        client: &Client,
        subject: &str,
        scope: ScopeSet,
        grant_type: GrantType,
        roles: &[String],
    ) -> AuthResult<TokenClaims> {
        let ttl = client
            .access_token_lifetime()
            .unwrap_or_else(|| self.config.oauth.access_token_ttl());

        let now = OffsetDateTime::now_utc();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| AuthError::configuration("Access token lifetime out of range"))?;

        let claims = TokenClaims::builder(
            self.config.issuer.as_str(),
            subject,
            client.client_id.as_str(),
            grant_type,
        )
        .audience(self.config.effective_audience())
        .scope(scope)
        .issued_at(now)
        .expires_at(expires_at)
        .roles(roles)
        .build();

        let issued_at = claims.issued_at();
        let refresh_expires_at = if self.signer.issues_refresh_token(grant_type) {
            let window = self
                .signer
                .refresh_window(issued_at)
                .ok_or_else(|| AuthError::configuration("Refresh token lifetime out of range"))?;
            Some(window)
        } else {
            None
        };

        let info = AccessTokenInfo {
            jti: claims.jti.clone(),
            subject: claims.sub.clone(),
            client_id: claims.client_id.clone(),
            scope: claims.scope.clone(),
            grant_type,
            issued_at,
            expires_at: claims.expires_at(),
            refresh_expires_at,
            status: TokenStatus::Issued,
            revoked_at: None,
        };
        self.tokens.save(&info).await?;

        info!(
            client_id = %info.client_id,
            grant_type = %grant_type,
            jti = %info.jti,
            "Access token issued"
        );
        self.notify(NotificationEvent::TokenIssued {
            jti: info.jti,
            client_id: info.client_id,
            subject: info.subject,
            grant_type,
        });

        Ok(claims)
    }

    pub(crate) fn notify(&self, event: NotificationEvent) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(event);
        }
    }
}

/// Scope to grant when the request names none: everything the client may have.
pub(crate) fn requested_or_client_scope(requested: &ScopeSet, client: &Client) -> ScopeSet {
    if requested.is_empty() {
        client.scopes.clone()
    } else {
        requested.clone()
    }
}

/// The closed set of grant flows.
pub enum GrantFlow {
    AuthorizationCode(AuthorizationCodeFlow),
    ClientCredentials(ClientCredentialsFlow),
    Password(PasswordFlow),
    RefreshToken(RefreshTokenFlow),
}

impl GrantFlow {
    /// The processor for `grant_type`.
    #[must_use]
    pub fn new(grant_type: GrantType, services: Arc<FlowServices>) -> Self {
        match grant_type {
            GrantType::AuthorizationCode => {
                Self::AuthorizationCode(AuthorizationCodeFlow::new(services))
            }
            GrantType::ClientCredentials => {
                Self::ClientCredentials(ClientCredentialsFlow::new(services))
            }
            GrantType::Password => Self::Password(PasswordFlow::new(services)),
            GrantType::RefreshToken => Self::RefreshToken(RefreshTokenFlow::new(services)),
        }
    }

    fn processor(&self) -> &dyn GrantFlowProcessor {
        match self {
            Self::AuthorizationCode(flow) => flow,
            Self::ClientCredentials(flow) => flow,
            Self::Password(flow) => flow,
            Self::RefreshToken(flow) => flow,
        }
    }
}

#[async_trait]
impl GrantFlowProcessor for GrantFlow {
    fn declared_grant_type(&self) -> GrantType {
        self.processor().declared_grant_type()
    }

    async fn process_authorization_request(
        &self,
        ctx: &AuthorizationRequestContext,
    ) -> AuthResult<AuthorizationResponse> {
        self.processor().process_authorization_request(ctx).await
    }

    async fn process_token_request(&self, ctx: &TokenRequestContext) -> AuthResult<TokenClaims> {
        self.processor().process_token_request(ctx).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for processor tests.

    use super::*;
    use crate::secret;
    use crate::storage::{
        InMemoryAccessTokenStorage, InMemoryAuthorizationStorage, InMemoryClientRegistry,
        InMemoryResourceOwnerStore,
    };
    use crate::token::{SigningAlgorithm, SigningKeyPair};

    pub const SECRET: &str = "s3cret";

    pub struct Fixture {
        pub services: Arc<FlowServices>,
        pub clients: Arc<InMemoryClientRegistry>,
        pub authorizations: Arc<InMemoryAuthorizationStorage>,
        pub tokens: Arc<InMemoryAccessTokenStorage>,
    }

    pub fn confidential_client(client_id: &str, grants: &[GrantType]) -> Client {
        Client {
            client_id: client_id.to_string(),
            secret_hash: Some(secret::hash_secret(SECRET).unwrap()),
            name: client_id.to_string(),
            grant_types: grants.to_vec(),
            redirect_uris: vec!["https://app/cb".to_string()],
            scopes: ScopeSet::parse("read write"),
            confidential: true,
            active: true,
            access_token_lifetime: None,
        }
    }

    pub fn fixture() -> Fixture {
        fixture_with_config(AuthConfig::default())
    }

    /// Same registrations with `config` taken as is, validated or not.
    pub fn fixture_with_config(config: AuthConfig) -> Fixture {
        let config = Arc::new(config);
        let keys = Arc::new(KeyRegistry::new(
            SigningKeyPair::generate(SigningAlgorithm::ES384).unwrap(),
        ));
        let clients = Arc::new(InMemoryClientRegistry::new());
        clients
            .register(confidential_client("c1", &GrantType::ALL))
            .unwrap();

        let owners = Arc::new(InMemoryResourceOwnerStore::new());
        owners
            .add_user("alice", "wonderland", "alice", vec!["admin".to_string()])
            .unwrap();

        let authorizations = Arc::new(InMemoryAuthorizationStorage::new());
        let tokens = Arc::new(InMemoryAccessTokenStorage::new());
        let services = Arc::new(FlowServices::new(
            config,
            keys,
            clients.clone(),
            owners,
            authorizations.clone(),
            tokens.clone(),
        ));

        Fixture {
            services,
            clients,
            authorizations,
            tokens,
        }
    }
}
