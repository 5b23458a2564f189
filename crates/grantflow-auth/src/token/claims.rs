//! Access token claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};

use crate::types::{GrantType, ScopeSet};

/// Claims produced by a successful token request.
///
/// Immutable once built; the web layer signs them with
/// [`TokenSigner`](crate::token::TokenSigner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub scope: ScopeSet,
    pub client_id: String,
    pub grant_type: GrantType,

    /// Additional claims such as `roles`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        client_id: impl Into<String>,
        grant_type: GrantType,
    ) -> TokenClaimsBuilder {
        TokenClaimsBuilder::new(issuer, subject, client_id, grant_type)
    }

    /// Issue time as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.iat).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Seconds between issuance and expiry, for the `expires_in` response field.
    #[must_use]
    pub fn expires_in(&self) -> i64 {
        self.exp - self.iat
    }

    /// Role names carried in the `roles` claim.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        self.extra
            .get("roles")
            .and_then(Value::as_array)
            .map(|roles| roles.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Builder for [`TokenClaims`].
///
/// Defaults: issued now, one hour lifetime, fresh UUID v4 `jti`.
pub struct TokenClaimsBuilder {
    claims: TokenClaims,
}

impl TokenClaimsBuilder {
    fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        client_id: impl Into<String>,
        grant_type: GrantType,
    ) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            claims: TokenClaims {
                iss: issuer.into(),
                sub: subject.into(),
                aud: Vec::new(),
                exp: now + 3600,
                iat: now,
                jti: uuid::Uuid::new_v4().to_string(),
                scope: ScopeSet::default(),
                client_id: client_id.into(),
                grant_type,
                extra: Map::new(),
            },
        }
    }

    #[must_use]
    pub fn audience(mut self, aud: Vec<String>) -> Self {
        self.claims.aud = aud;
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: ScopeSet) -> Self {
        self.claims.scope = scope;
        self
    }

    /// Sets `iat`; call before [`expires_in`](Self::expires_in).
    #[must_use]
    pub fn issued_at(mut self, at: OffsetDateTime) -> Self {
        let ttl = self.claims.exp - self.claims.iat;
        self.claims.iat = at.unix_timestamp();
        self.claims.exp = self.claims.iat.saturating_add(ttl);
        self
    }

    /// Sets `exp` relative to `iat`, saturating at `i64::MAX`.
    ///
    /// Callers holding an untrusted lifetime should compute the instant with
    /// `checked_add` and use [`expires_at`](Self::expires_at).
    #[must_use]
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.claims.exp = self.claims.iat.saturating_add(ttl.whole_seconds());
        self
    }

    #[must_use]
    pub fn expires_at(mut self, at: OffsetDateTime) -> Self {
        self.claims.exp = at.unix_timestamp();
        self
    }

    #[must_use]
    pub fn jti(mut self, jti: impl Into<String>) -> Self {
        self.claims.jti = jti.into();
        self
    }

    #[must_use]
    pub fn roles(self, roles: &[String]) -> Self {
        if roles.is_empty() {
            return self;
        }
        self.claim("roles", Value::from(roles.to_vec()))
    }

    /// Adds an extra claim. Registered claim names are ignored.
    #[must_use]
    pub fn claim(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if !RESERVED.contains(&name.as_str()) {
            self.claims.extra.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> TokenClaims {
        self.claims
    }
}

const RESERVED: [&str; 9] = [
    "iss",
    "sub",
    "aud",
    "exp",
    "iat",
    "jti",
    "scope",
    "client_id",
    "grant_type",
];
