//! Request-scoped contexts handed to verifiers and processors.
//!
//! A context wraps the raw parameters with their parsed forms. The client
//! registration is attached by the processor after the registry lookup, so
//! verifiers never touch storage.

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::authorize::AuthorizationRequest;
use crate::oauth::token::TokenRequest;
use crate::types::{Client, GrantType, ScopeSet};

/// Context for an authorization (front-channel) request.
#[derive(Debug, Clone)]
pub struct AuthorizationRequestContext {
    pub request: AuthorizationRequest,
    /// Subject of the resource owner the web layer authenticated.
    pub subject: String,
    pub scope: ScopeSet,
    client: Option<Client>,
}

impl AuthorizationRequestContext {
    #[must_use]
    pub fn new(request: AuthorizationRequest, subject: impl Into<String>) -> Self {
        let scope = ScopeSet::parse_opt(request.scope.as_deref());
        Self {
            request,
            subject: subject.into(),
            scope,
            client: None,
        }
    }

    /// The resolved client registration, if it exists.
    #[must_use]
    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    #[must_use]
    pub fn with_client(mut self, client: Option<Client>) -> Self {
        self.client = client;
        self
    }

    /// The request's `redirect_uri`, or the client's only registered URI.
    #[must_use]
    pub fn effective_redirect_uri(&self) -> Option<&str> {
        self.request
            .redirect_uri
            .as_deref()
            .or_else(|| self.client().and_then(Client::default_redirect_uri))
    }
}

/// Context for a token (back-channel) request.
#[derive(Debug, Clone)]
pub struct TokenRequestContext {
    pub request: TokenRequest,
    /// `None` when `grant_type` is not one of the four known values.
    pub grant_type: Option<GrantType>,
    pub scope: ScopeSet,
    client: Option<Client>,
}

impl TokenRequestContext {
    #[must_use]
    pub fn new(request: TokenRequest) -> Self {
        let grant_type = GrantType::parse(&request.grant_type);
        let scope = ScopeSet::parse_opt(request.scope.as_deref());
        Self {
            request,
            grant_type,
            scope,
            client: None,
        }
    }

    /// The parsed grant type.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedGrantType` for an unknown `grant_type` string.
    pub fn grant_type(&self) -> AuthResult<GrantType> {
        self.grant_type
            .ok_or_else(|| AuthError::unsupported_grant_type(self.request.grant_type.clone()))
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.request.client_id.as_deref()
    }

    #[must_use]
    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    #[must_use]
    pub fn with_client(mut self, client: Option<Client>) -> Self {
        self.client = client;
        self
    }

    /// The registered client, for processors running after verification.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` if no client was attached.
    pub fn verified_client(&self) -> AuthResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| AuthError::invalid_client("Client authentication failed"))
    }
}
