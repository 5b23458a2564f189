//! # grantflow-auth
//!
//! OAuth 2.0 grant-flow processing engine.
//!
//! This crate provides:
//! - Processors for the authorization code (with PKCE), client credentials,
//!   password and refresh token grants
//! - Chained request verifiers and their registry
//! - Authorization-code and access-token stores with an in-memory backend
//! - Signing-key registry, JWT signing and JWKS export
//! - Token revocation and introspection
//!
//! HTTP routing, consent UI and durable storage are left to the embedding
//! server, which drives the engine through [`oauth::FlowDispatcher`].
//!
//! ## Modules
//!
//! - [`config`] - Engine configuration
//! - [`oauth`] - Dispatcher, grant flows, verifiers and PKCE
//! - [`token`] - Claims, signing keys, JWT encoding and token lifecycle
//! - [`storage`] - Storage traits and the in-memory implementation
//! - [`notify`] - Fire-and-forget token event notifications
//! - [`metadata`] - Authorization server metadata
//! - [`secret`] - Client secret generation and hashing

pub mod config;
pub mod error;
pub mod metadata;
pub mod notify;
pub mod oauth;
pub mod secret;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory, OAuthErrorResponse};
pub use metadata::ServerMetadata;
pub use notify::{NotificationDispatcher, NotificationEvent, NotificationSender};
pub use oauth::{
    AuthorizationRequest, AuthorizationRequestContext, AuthorizationResponse, FlowDispatcher,
    FlowServices, TokenRequest, TokenRequestContext,
};
pub use storage::{
    AccessTokenStorage, AuthorizationStorage, ClientRegistry, ResourceOwner, ResourceOwnerStore,
};
pub use token::{KeyRegistry, TokenClaims, TokenLifecycle, TokenSigner};
pub use types::{AccessTokenInfo, Client, GrantType, OngoingAuthorization, ScopeSet, TokenStatus};

/// Type alias for engine results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use grantflow_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory, OAuthErrorResponse};
    pub use crate::metadata::ServerMetadata;
    pub use crate::notify::{
        LoggingSender, NotificationDispatcher, NotificationEvent, NotificationSender,
    };
    pub use crate::oauth::{
        AuthorizationRequest, AuthorizationRequestContext, AuthorizationResponse, FlowDispatcher,
        FlowServices, GrantFlowProcessor, PkceChallenge, PkceVerifier, TokenRequest,
        TokenRequestContext, VerifierRegistry,
    };
    pub use crate::storage::{
        AccessTokenStorage, AuthorizationStorage, ClientRegistry, InMemoryAccessTokenStorage,
        InMemoryAuthorizationStorage, InMemoryClientRegistry, InMemoryResourceOwnerStore,
        ResourceOwner, ResourceOwnerStore, spawn_expiry_sweeper,
    };
    pub use crate::token::{
        IntrospectionResponse, Jwks, KeyRegistry, TokenClaims, TokenLifecycle, TokenResponse,
        TokenSigner,
    };
    pub use crate::types::{
        AccessTokenInfo, Client, GrantType, OngoingAuthorization, ScopeSet, TokenStatus,
    };
}
