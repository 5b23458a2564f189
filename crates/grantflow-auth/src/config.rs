//! Engine configuration.
//!
//! All sections default sensibly, so an empty document is a valid
//! configuration for local development.
//!
//! # Example (TOML)
//!
//! ```toml
//! issuer = "https://auth.example.com"
//! audience = ["https://api.example.com"]
//!
//! [oauth]
//! authorization_code_lifetime = "10m"
//! access_token_lifetime = "1h"
//! refresh_token_lifetime = "30d"
//! grant_types = ["authorization_code", "refresh_token"]
//!
//! [signing]
//! algorithm = "ES384"
//! private_key_path = "/etc/grantflow/signing.pem"
//! public_key_path = "/etc/grantflow/signing.pub.pem"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::types::GrantType;

/// Upper bound for every configured lifetime and for per-client overrides.
pub const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// Root engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL placed in the `iss` claim.
    pub issuer: String,

    /// Audience values placed in the `aud` claim.
    /// Defaults to the issuer when empty.
    pub audience: Vec<String>,

    /// OAuth 2.0 grant settings.
    pub oauth: OAuthConfig,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Endpoint URLs published in server metadata.
    pub endpoints: EndpointsConfig,

    /// Expiry sweeping for the in-memory stores.
    pub storage: StorageConfig,

    /// Lifecycle notification dispatch.
    pub notifications: NotificationConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            audience: Vec::new(),
            oauth: OAuthConfig::default(),
            signing: SigningConfig::default(),
            endpoints: EndpointsConfig::default(),
            storage: StorageConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// OAuth 2.0 grant settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Authorization code lifetime. Codes should be short-lived.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Default access token lifetime; clients may override it.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime, measured from each issuance.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Issue refresh tokens for user-facing grants.
    /// Client credentials never receive one.
    pub issue_refresh_tokens: bool,

    /// Grant types the dispatcher registers processors for.
    pub grant_types: Vec<GrantType>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::from_secs(600), // 10 minutes
            access_token_lifetime: Duration::from_secs(3600),      // 1 hour
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            issue_refresh_tokens: true,
            grant_types: GrantType::ALL.to_vec(),
        }
    }
}

impl OAuthConfig {
    #[must_use]
    pub fn authorization_code_ttl(&self) -> time::Duration {
        to_time_duration(self.authorization_code_lifetime)
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> time::Duration {
        to_time_duration(self.access_token_lifetime)
    }

    #[must_use]
    pub fn refresh_token_ttl(&self) -> time::Duration {
        to_time_duration(self.refresh_token_lifetime)
    }
}

fn to_time_duration(d: Duration) -> time::Duration {
    time::Duration::try_from(d).unwrap_or(time::Duration::MAX)
}

/// Token signing configuration.
///
/// When `private_key_path` is unset an ephemeral key pair is generated at
/// startup; tokens then stop verifying after a restart.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm: "RS256", "RS384" or "ES384".
    pub algorithm: String,

    /// Key ID published in the JWKS and the JWT header.
    /// Derived from the public key when unset.
    pub kid: Option<String>,

    /// PKCS#8 PEM private key.
    pub private_key_path: Option<PathBuf>,

    /// SPKI PEM public key matching `private_key_path`.
    pub public_key_path: Option<PathBuf>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS384".to_string(),
            kid: None,
            private_key_path: None,
            public_key_path: None,
        }
    }
}

impl SigningConfig {
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }
}

/// Endpoint URLs advertised by the metadata document.
///
/// These are passed through verbatim; the engine does not serve them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub authorization: Option<String>,
    pub token: Option<String>,
    pub introspection: Option<String>,
    pub revocation: Option<String>,
    pub jwks: Option<String>,
    pub userinfo: Option<String>,
    /// Scopes advertised as supported.
    pub scopes_supported: Vec<String>,
}

/// Background expiry sweeping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Interval between purges of expired codes and token records.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Notification dispatch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,

    /// Events beyond this many pending are dropped with a warning.
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 1024,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        AuthError::configuration(err.to_string())
    }
}

impl AuthConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and the
    /// [`validate`](Self::validate) errors otherwise.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Audience for issued tokens.
    #[must_use]
    pub fn effective_audience(&self) -> Vec<String> {
        if self.audience.is_empty() {
            vec![self.issuer.clone()]
        } else {
            self.audience.clone()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer URL is empty or not absolute
    /// - The signing algorithm is not supported
    /// - A lifetime or the sweep interval is zero or above [`MAX_LIFETIME`]
    /// - No grant type is enabled
    /// - Only one of the two key paths is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }
        if url::Url::parse(&self.issuer).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "issuer must be an absolute URL, got '{}'",
                self.issuer
            )));
        }

        match self.signing.algorithm.as_str() {
            "RS256" | "RS384" | "ES384" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be RS256, RS384, or ES384",
                    other
                )));
            }
        }

        match (&self.signing.private_key_path, &self.signing.public_key_path) {
            (Some(_), None) => {
                return Err(ConfigError::Missing("signing.public_key_path".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing("signing.private_key_path".to_string()));
            }
            _ => {}
        }

        let lifetimes = [
            (
                "authorization_code_lifetime",
                self.oauth.authorization_code_lifetime,
            ),
            ("access_token_lifetime", self.oauth.access_token_lifetime),
            ("refresh_token_lifetime", self.oauth.refresh_token_lifetime),
            ("sweep_interval", self.storage.sweep_interval),
        ];
        for (name, value) in lifetimes {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue(format!("{name} must be > 0")));
            }
            if value > MAX_LIFETIME {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must not exceed {} days",
                    MAX_LIFETIME.as_secs() / 86_400
                )));
            }
        }

        if self.oauth.grant_types.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one grant type must be enabled".to_string(),
            ));
        }

        if self.notifications.enabled && self.notifications.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "notifications.queue_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AuthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.signing.algorithm, "RS384");
        assert_eq!(config.oauth.grant_types.len(), 4);
    }

    #[test]
    fn test_empty_issuer_fails_validation() {
        let mut config = AuthConfig::default();
        config.issuer = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("issuer"));

        config.issuer = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_algorithm_fails_validation() {
        let mut config = AuthConfig::default();
        config.signing.algorithm = "HS256".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("signing algorithm"));
    }

    #[test]
    fn test_half_configured_key_paths() {
        let mut config = AuthConfig::default();
        config.signing.private_key_path = Some(PathBuf::from("/tmp/key.pem"));
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Missing(_)
        ));
    }

    #[test]
    fn test_zero_lifetime_fails_validation() {
        let mut config = AuthConfig::default();
        config.oauth.access_token_lifetime = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("access_token_lifetime"));
    }

    #[test]
    fn test_oversized_lifetime_fails_validation() {
        let mut config = AuthConfig::default();
        config.oauth.refresh_token_lifetime = MAX_LIFETIME;
        assert!(config.validate().is_ok());

        config.oauth.refresh_token_lifetime = MAX_LIFETIME + Duration::from_secs(1);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_token_lifetime"));

        let err = AuthConfig::from_toml_str("[oauth]\nauthorization_code_lifetime = \"100000years\"")
            .unwrap_err();
        assert!(err.to_string().contains("authorization_code_lifetime"));
    }

    #[test]
    fn test_no_grant_types_fails_validation() {
        let mut config = AuthConfig::default();
        config.oauth.grant_types.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_audience() {
        let mut config = AuthConfig::default();
        assert_eq!(config.effective_audience(), vec![config.issuer.clone()]);
        config.audience = vec!["https://api".to_string()];
        assert_eq!(config.effective_audience(), vec!["https://api".to_string()]);
    }

    #[test]
    fn test_from_toml() {
        let config = AuthConfig::from_toml_str(
            r#"
            issuer = "https://auth.example.com"

            [oauth]
            access_token_lifetime = "15m"
            grant_types = ["client_credentials"]

            [signing]
            algorithm = "ES384"

            [storage]
            sweep_interval = "30s"
            "#,
        )
        .unwrap();

        assert_eq!(config.issuer, "https://auth.example.com");
        assert_eq!(config.oauth.access_token_ttl(), time::Duration::minutes(15));
        assert_eq!(config.oauth.grant_types, vec![GrantType::ClientCredentials]);
        assert_eq!(config.signing.algorithm, "ES384");
        assert_eq!(config.storage.sweep_interval, Duration::from_secs(30));
        // untouched sections keep their defaults
        assert_eq!(config.oauth.authorization_code_ttl(), time::Duration::minutes(10));
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let err = AuthConfig::from_toml_str("issuer = 42").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = AuthConfig::from_toml_str("[oauth]\ngrant_types = [\"implicit\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = AuthConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AuthConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.issuer, parsed.issuer);
        assert_eq!(config.oauth.grant_types, parsed.oauth.grant_types);
        assert_eq!(
            config.oauth.refresh_token_lifetime,
            parsed.oauth.refresh_token_lifetime
        );
    }
}
