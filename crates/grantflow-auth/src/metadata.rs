//! Authorization server metadata (RFC 8414 subset).
//!
//! Every field is configuration passed through; the document is consumed by
//! an external discovery endpoint.

use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::oauth::pkce::PkceChallengeMethod;
use crate::types::GrantType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub issuer: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    pub grant_types_supported: Vec<GrantType>,

    pub token_endpoint_auth_methods_supported: Vec<String>,

    pub response_types_supported: Vec<String>,

    pub code_challenge_methods_supported: Vec<PkceChallengeMethod>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,
}

impl ServerMetadata {
    /// Metadata for the grant types enabled in `config`.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut grants = config.oauth.grant_types.clone();
        grants.sort();
        grants.dedup();
        Self::with_grant_types(config, grants)
    }

    /// Metadata advertising exactly `grant_types`, e.g. a dispatcher's
    /// registered set.
    #[must_use]
    pub fn with_grant_types(config: &AuthConfig, grant_types: Vec<GrantType>) -> Self {
        let endpoints = &config.endpoints;
        let response_types = if grant_types.contains(&GrantType::AuthorizationCode) {
            vec!["code".to_string()]
        } else {
            Vec::new()
        };

        Self {
            issuer: config.issuer.clone(),
            authorization_endpoint: endpoints.authorization.clone(),
            token_endpoint: endpoints.token.clone(),
            introspection_endpoint: endpoints.introspection.clone(),
            revocation_endpoint: endpoints.revocation.clone(),
            jwks_uri: endpoints.jwks.clone(),
            userinfo_endpoint: endpoints.userinfo.clone(),
            grant_types_supported: grant_types,
            token_endpoint_auth_methods_supported: vec![
                "client_secret_basic".to_string(),
                "client_secret_post".to_string(),
                "none".to_string(),
            ],
            response_types_supported: response_types,
            code_challenge_methods_supported: vec![PkceChallengeMethod::S256],
            scopes_supported: endpoints.scopes_supported.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_config() {
        let mut config = AuthConfig::default();
        config.issuer = "https://auth.example.com".to_string();
        config.endpoints.token = Some("https://auth.example.com/token".to_string());
        config.oauth.grant_types = vec![GrantType::RefreshToken, GrantType::AuthorizationCode];

        let metadata = ServerMetadata::from_config(&config);
        assert_eq!(
            metadata.grant_types_supported,
            vec![GrantType::AuthorizationCode, GrantType::RefreshToken]
        );
        assert_eq!(metadata.response_types_supported, vec!["code".to_string()]);

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["issuer"], "https://auth.example.com");
        assert_eq!(json["token_endpoint"], "https://auth.example.com/token");
        assert_eq!(json["grant_types_supported"][0], "authorization_code");
        assert_eq!(json["code_challenge_methods_supported"][0], "S256");
        assert!(json.get("jwks_uri").is_none());
    }

    #[test]
    fn test_no_response_types_without_code_grant() {
        let config = AuthConfig::default();
        let metadata = ServerMetadata::with_grant_types(&config, vec![GrantType::ClientCredentials]);
        assert!(metadata.response_types_supported.is_empty());
    }
}
