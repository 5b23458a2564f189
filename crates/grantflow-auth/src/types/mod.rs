//! Domain types shared across the engine.
//!
//! - [`Client`] - OAuth 2.0 client registration
//! - [`GrantType`] - Supported OAuth grant types
//! - [`ScopeSet`] - Space-delimited scope sets
//! - [`OngoingAuthorization`] - Pending authorization-code grant
//! - [`AccessTokenInfo`] - Issued token record

pub mod access_token;
pub mod authorization;
pub mod client;
pub mod scope;

pub use access_token::{AccessTokenInfo, TokenStatus};
pub use authorization::OngoingAuthorization;
pub use client::{Client, ClientValidationError, GrantType};
pub use scope::ScopeSet;
