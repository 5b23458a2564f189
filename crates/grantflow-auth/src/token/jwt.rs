//! JWT signing and validation.
//!
//! [`TokenSigner`] turns [`TokenClaims`] into signed access tokens and issues
//! the refresh tokens that accompany them. A refresh token is a JWT carrying
//! the JTI of the access-token record it can be exchanged against; the record,
//! not the JWT, decides whether the exchange is still allowed.

use std::sync::Arc;

use jsonwebtoken::{Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::claims::TokenClaims;
use crate::token::keys::KeyRegistry;
use crate::types::GrantType;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode token: {message}")]
    EncodingError { message: String },

    #[error("Failed to decode token: {message}")]
    DecodingError { message: String },

    #[error("Token expired")]
    Expired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },

    #[error("Key generation error: {message}")]
    KeyGenerationError { message: String },

    #[error("Invalid key: {message}")]
    InvalidKey { message: String },
}

impl JwtError {
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Refresh Token Claims
// ============================================================================

const REFRESH_TOKEN_USE: &str = "refresh";

/// Payload of a refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub iss: String,
    pub sub: String,
    pub client_id: String,
    /// JTI of the access-token record this refresh token is bound to.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    /// Always `"refresh"`; keeps access tokens from being replayed as
    /// refresh tokens.
    pub token_use: String,
}

// ============================================================================
// Token Response
// ============================================================================

/// RFC 6749 §5.1 token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

// ============================================================================
// Token Signer
// ============================================================================

/// Signs and validates tokens with the process key pair.
pub struct TokenSigner {
    keys: Arc<KeyRegistry>,
    issuer: String,
    refresh_ttl: Duration,
    issue_refresh_tokens: bool,
}

impl TokenSigner {
    #[must_use]
    pub fn new(keys: Arc<KeyRegistry>, config: &AuthConfig) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            refresh_ttl: config.oauth.refresh_token_ttl(),
            issue_refresh_tokens: config.oauth.issue_refresh_tokens,
        }
    }

    /// Whether a refresh token accompanies tokens issued through `grant`.
    ///
    /// Client credentials never get one (RFC 6749 §4.4.3).
    #[must_use]
    pub fn issues_refresh_token(&self, grant: GrantType) -> bool {
        self.issue_refresh_tokens && grant != GrantType::ClientCredentials
    }

    /// End of the refresh window for a token issued at `issued_at`.
    ///
    /// `None` when it falls outside the representable range.
    #[must_use]
    pub fn refresh_window(&self, issued_at: time::OffsetDateTime) -> Option<time::OffsetDateTime> {
        issued_at.checked_add(self.refresh_ttl)
    }

    /// Sign arbitrary claims with the registry key, `kid` in the header.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(self.keys.algorithm().to_jwt_algorithm());
        header.kid = Some(self.keys.kid().to_string());

        encode(&header, claims, self.keys.private_key())
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decode and validate a token signed by this process.
    ///
    /// Checks signature, issuer and expiry. Audience is left to the resource
    /// server.
    ///
    /// # Errors
    ///
    /// Returns a `JwtError` describing the first failed check.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.keys.algorithm().to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;

        decode::<T>(token, self.keys.public_key(), &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }

    /// Sign an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn sign_access_token(&self, claims: &TokenClaims) -> Result<String, JwtError> {
        self.encode(claims)
    }

    /// Issue the refresh token bound to `claims`, if the grant gets one.
    ///
    /// Its expiry matches the `refresh_expires_at` the processor recorded.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn issue_refresh_token(&self, claims: &TokenClaims) -> Result<Option<String>, JwtError> {
        if !self.issues_refresh_token(claims.grant_type) {
            return Ok(None);
        }
        let refresh = RefreshTokenClaims {
            iss: self.issuer.clone(),
            sub: claims.sub.clone(),
            client_id: claims.client_id.clone(),
            jti: claims.jti.clone(),
            iat: claims.iat,
            exp: self
                .refresh_window(claims.issued_at())
                .ok_or_else(|| JwtError::invalid_claims("Refresh token lifetime out of range"))?
                .unix_timestamp(),
            token_use: REFRESH_TOKEN_USE.to_string(),
        };
        self.encode(&refresh).map(Some)
    }

    /// Validate a presented refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGrant` for a bad signature, wrong issuer,
    /// expiry, or a token that is not a refresh token.
    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, AuthError> {
        let claims: RefreshTokenClaims = self
            .decode(token)
            .map_err(|e| AuthError::invalid_grant(format!("Invalid refresh token: {e}")))?;
        if claims.token_use != REFRESH_TOKEN_USE {
            return Err(AuthError::invalid_grant("Token is not a refresh token"));
        }
        Ok(claims)
    }

    /// Validate an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError` if the token does not verify.
    pub fn decode_access_token(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.decode(token)
    }

    /// Sign `claims` and assemble the token endpoint response.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if signing fails.
    pub fn token_response(&self, claims: &TokenClaims) -> Result<TokenResponse, AuthError> {
        let access_token = self
            .sign_access_token(claims)
            .map_err(|e| AuthError::internal(e.to_string()))?;
        let refresh_token = self
            .issue_refresh_token(claims)
            .map_err(|e| AuthError::internal(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: claims.expires_in(),
            refresh_token,
            scope: claims.scope.to_string(),
        })
    }
}
