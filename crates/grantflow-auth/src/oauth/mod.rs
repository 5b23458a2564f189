//! OAuth 2.0 grant processing.
//!
//! - [`dispatcher`] - entry point routing requests by grant type
//! - [`flow`] - one processor per grant type
//! - [`verifier`] - single-concern request checks and their registry
//! - [`context`] - request-scoped contexts
//! - [`authorize`] / [`token`] - raw endpoint parameters
//! - [`pkce`] - PKCE challenge/verifier implementation
//!
//! # Example
//!
//! ```ignore
//! use grantflow_auth::oauth::{
//!     AuthorizationRequestContext, FlowDispatcher, TokenRequest, TokenRequestContext,
//! };
//!
//! let dispatcher = FlowDispatcher::from_config(services);
//!
//! // Front channel, after the user logged in
//! let ctx = AuthorizationRequestContext::new(query, user.subject);
//! let response = dispatcher.process_authorization_request(&ctx).await?;
//! let location = response.redirect_url()?;
//!
//! // Back channel
//! let ctx = TokenRequestContext::new(form);
//! let claims = dispatcher.process_token_request(&ctx).await?;
//! let body = signer.token_response(&claims)?;
//! ```

pub mod authorize;
pub mod context;
pub mod dispatcher;
pub mod flow;
pub mod pkce;
pub mod token;
pub mod verifier;

pub use authorize::{AuthorizationRequest, AuthorizationResponse};
pub use context::{AuthorizationRequestContext, TokenRequestContext};
pub use dispatcher::FlowDispatcher;
pub use flow::{
    AuthorizationCodeFlow, ClientCredentialsFlow, FlowServices, GrantFlow, GrantFlowProcessor,
    PasswordFlow, RefreshTokenFlow,
};
pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier};
pub use token::{TokenRequest, parse_basic_auth};
pub use verifier::{
    AuthorizationVerifier, RequestVerifier, TokenVerifier, VerifierRegistry,
    VerifierRegistryBuilder,
};
