//! Authorization endpoint request and response types.
//!
//! # Authorization Code Flow
//!
//! 1. The client redirects the user agent to the authorization endpoint
//! 2. The user authenticates; the web layer builds an
//!    [`AuthorizationRequestContext`](crate::oauth::AuthorizationRequestContext)
//! 3. The engine mints a code and returns an [`AuthorizationResponse`]
//! 4. The web layer redirects to [`AuthorizationResponse::redirect_url`]
//! 5. The client exchanges the code at the token endpoint

use serde::{Deserialize, Serialize};

/// Authorization request parameters, as received in the query string.
///
/// # Example
///
/// ```ignore
/// GET /authorize?
///   response_type=code
///   &client_id=my-app
///   &redirect_uri=https://app.example.com/callback
///   &scope=read write
///   &state=abc123xyz
///   &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM
///   &code_challenge_method=S256
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthorizationRequest {
    /// Must be "code".
    pub response_type: String,

    pub client_id: String,

    /// May be omitted when the client has exactly one registered URI.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Space-separated scopes.
    #[serde(default)]
    pub scope: Option<String>,

    /// Opaque value echoed back to the client.
    #[serde(default)]
    pub state: Option<String>,

    /// Base64url SHA-256 of the code verifier.
    #[serde(default)]
    pub code_challenge: Option<String>,

    /// Only "S256" is accepted.
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

/// Successful authorization response.
///
/// ```ignore
/// HTTP/1.1 302 Found
/// Location: https://app.example.com/callback?code=SplxlOBeZQQYbYS6WxSbIA&state=abc123xyz
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResponse {
    /// Single-use authorization code.
    pub code: String,

    /// Echoed `state`, if the request carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Where the user agent should be sent.
    pub redirect_uri: String,
}

impl AuthorizationResponse {
    /// Builds the redirect URL with `code` and `state` appended to the query.
    ///
    /// # Errors
    ///
    /// Returns an error if `redirect_uri` is not an absolute URL.
    pub fn redirect_url(&self) -> Result<String, url::ParseError> {
        let mut url = url::Url::parse(&self.redirect_uri)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("code", &self.code);
            if let Some(state) = &self.state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_url() {
        let response = AuthorizationResponse {
            code: "abc".to_string(),
            state: Some("xyz".to_string()),
            redirect_uri: "https://app/cb".to_string(),
        };
        assert_eq!(
            response.redirect_url().unwrap(),
            "https://app/cb?code=abc&state=xyz"
        );
    }

    #[test]
    fn test_redirect_url_keeps_existing_query() {
        let response = AuthorizationResponse {
            code: "abc".to_string(),
            state: None,
            redirect_uri: "https://app/cb?tenant=1".to_string(),
        };
        assert_eq!(
            response.redirect_url().unwrap(),
            "https://app/cb?tenant=1&code=abc"
        );
    }

    #[test]
    fn test_request_from_json() {
        let request: AuthorizationRequest = serde_json::from_value(serde_json::json!({
            "response_type": "code",
            "client_id": "c1",
            "scope": "read"
        }))
        .unwrap();
        assert_eq!(request.client_id, "c1");
        assert!(request.redirect_uri.is_none());
        assert!(request.state.is_none());
    }
}
