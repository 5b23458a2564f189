//! Pending authorization-code grants.
//!
//! An [`OngoingAuthorization`] is created when an authorization request
//! passes verification and lives until the client exchanges the code or the
//! entry expires, whichever comes first.
//!
//! # Security
//!
//! - Authorization codes are 256 bits of OS randomness, base64url-encoded
//! - Entries are short-lived (default 10 minutes)
//! - Codes are single-use; the store removes the entry on exchange
//! - The PKCE challenge is kept for verification at token exchange

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::oauth::pkce::PkceChallengeMethod;
use crate::types::ScopeSet;

/// A pending authorization-code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OngoingAuthorization {
    /// Authorization code (one-time use), primary key.
    pub code: String,

    /// Client that initiated the request.
    pub client_id: String,

    /// Redirect URI the code was delivered to.
    /// The token request must present the same value.
    pub redirect_uri: String,

    /// Granted scopes.
    pub scope: ScopeSet,

    /// Authenticated resource owner.
    pub subject: String,

    /// PKCE code challenge, when the client sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<PkceChallengeMethod>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl OngoingAuthorization {
    /// Generates a new authorization code.
    ///
    /// 32 random bytes encoded as base64url without padding (43 characters).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if the entry is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the entry has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn make_entry(ttl: Duration) -> OngoingAuthorization {
        let now = OffsetDateTime::now_utc();
        OngoingAuthorization {
            code: OngoingAuthorization::generate_code(),
            client_id: "c1".to_string(),
            redirect_uri: "https://app/cb".to_string(),
            scope: ScopeSet::parse("read"),
            subject: "alice".to_string(),
            code_challenge: None,
            code_challenge_method: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[test]
    fn test_generate_code_format() {
        let code = OngoingAuthorization::generate_code();
        assert_eq!(code.len(), 43);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(code, OngoingAuthorization::generate_code());
    }

    #[test]
    fn test_expiry() {
        assert!(!make_entry(Duration::minutes(10)).is_expired());
        assert!(make_entry(Duration::seconds(-1)).is_expired());

        let entry = make_entry(Duration::minutes(10));
        assert!(entry.is_expired_at(entry.expires_at));
    }
}
