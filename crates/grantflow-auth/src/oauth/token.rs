//! Token endpoint request parameters.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;

/// Token request parameters, as received in the form body.
///
/// Which fields are required depends on `grant_type`:
///
/// - `authorization_code`: code, redirect_uri, code_verifier (PKCE)
/// - `client_credentials`: scope (optional)
/// - `password`: username, password, scope (optional)
/// - `refresh_token`: refresh_token, scope (optional, narrowing only)
///
/// Clients authenticate with `client_id` and, when confidential,
/// `client_secret` (client_secret_post). The web layer maps HTTP Basic
/// credentials onto the same two fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    pub grant_type: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub redirect_uri: Option<String>,

    #[serde(default)]
    pub code_verifier: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenRequest {
    #[must_use]
    pub fn new(grant_type: impl Into<String>) -> Self {
        Self {
            grant_type: grant_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>, secret: Option<&str>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = secret.map(str::to_string);
        self
    }

    /// Applies `Authorization: Basic` credentials (client_secret_basic).
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` for a malformed header, or when the body
    /// names a different `client_id` than the header.
    pub fn with_basic_auth(mut self, header_value: &str) -> AuthResult<Self> {
        let (client_id, secret) = parse_basic_auth(header_value)
            .ok_or_else(|| AuthError::invalid_client("Malformed Basic authorization header"))?;
        if self
            .client_id
            .as_deref()
            .is_some_and(|body_id| body_id != client_id)
        {
            return Err(AuthError::invalid_client(
                "client_id in body does not match Basic credentials",
            ));
        }
        self.client_id = Some(client_id);
        self.client_secret = Some(secret);
        Ok(self)
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Splits a `Basic` authorization header into `(client_id, client_secret)`.
///
/// The secret may itself contain colons.
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (client_id, secret) = credentials.split_once(':')?;
    Some((client_id.to_string(), secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_auth() {
        let header = format!("Basic {}", STANDARD.encode("svc:s3cr:et"));
        assert_eq!(
            parse_basic_auth(&header),
            Some(("svc".to_string(), "s3cr:et".to_string()))
        );
        assert!(parse_basic_auth("Bearer abc").is_none());
        assert!(parse_basic_auth("Basic !!!").is_none());
    }

    #[test]
    fn test_with_basic_auth() {
        let header = format!("Basic {}", STANDARD.encode("svc:secret"));
        let request = TokenRequest::new("client_credentials")
            .with_basic_auth(&header)
            .unwrap();
        assert_eq!(request.client_id.as_deref(), Some("svc"));
        assert_eq!(request.client_secret.as_deref(), Some("secret"));

        let mismatch = TokenRequest::new("client_credentials")
            .with_client("other", None)
            .with_basic_auth(&header)
            .unwrap_err();
        assert_eq!(mismatch.oauth_error_code(), "invalid_client");
    }
}
