//! Token issuance support: claims, signing keys, JWT encoding and the
//! revocation/introspection lifecycle.

pub mod claims;
pub mod jwt;
pub mod keys;
pub mod lifecycle;

pub use claims::{TokenClaims, TokenClaimsBuilder};
pub use jwt::{JwtError, RefreshTokenClaims, TokenResponse, TokenSigner};
pub use keys::{Jwk, Jwks, KeyRegistry, SigningAlgorithm, SigningKeyPair};
pub use lifecycle::{IntrospectionResponse, TokenLifecycle};
