//! Issued access token records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{GrantType, ScopeSet};

/// Lifecycle status of an issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Issued,
    Revoked,
}

impl TokenStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "ISSUED",
            Self::Revoked => "REVOKED",
        }
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata persisted for every issued access token, keyed by JTI.
///
/// `revoked_at` is set if and only if `status` is [`TokenStatus::Revoked`].
/// Use [`AccessTokenInfo::revoke`] rather than writing the fields directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenInfo {
    /// JWT ID, primary key.
    pub jti: String,

    /// Resource owner, or the client itself for client credentials.
    pub subject: String,

    pub client_id: String,

    pub scope: ScopeSet,

    /// Grant the token was issued through.
    pub grant_type: GrantType,

    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// End of the refresh window, when a refresh token was issued alongside.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub refresh_expires_at: Option<OffsetDateTime>,

    pub status: TokenStatus,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,
}

impl AccessTokenInfo {
    /// Returns `true` if the token has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.status == TokenStatus::Revoked
    }

    /// Returns `true` if the access token itself has expired at `now`.
    #[must_use]
    pub fn is_access_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the token is usable for resource access at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        !self.is_revoked() && !self.is_access_expired_at(now)
    }

    /// Instant after which the record is of no further use.
    ///
    /// Records backing a refresh token stay until the refresh window closes.
    #[must_use]
    pub fn retained_until(&self) -> OffsetDateTime {
        match self.refresh_expires_at {
            Some(refresh) if refresh > self.expires_at => refresh,
            _ => self.expires_at,
        }
    }

    /// Returns `true` if stores should treat the record as absent at `now`.
    #[must_use]
    pub fn is_stale_at(&self, now: OffsetDateTime) -> bool {
        now >= self.retained_until()
    }

    /// Marks the record revoked at `now`.
    ///
    /// Returns `false` and leaves the record untouched if it was already
    /// revoked, so the original `revoked_at` is preserved.
    pub fn revoke(&mut self, now: OffsetDateTime) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.status = TokenStatus::Revoked;
        self.revoked_at = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn make_info() -> AccessTokenInfo {
        let now = OffsetDateTime::now_utc();
        AccessTokenInfo {
            jti: "jti-1".to_string(),
            subject: "alice".to_string(),
            client_id: "c1".to_string(),
            scope: ScopeSet::parse("read"),
            grant_type: GrantType::Password,
            issued_at: now,
            expires_at: now + Duration::hours(1),
            refresh_expires_at: None,
            status: TokenStatus::Issued,
            revoked_at: None,
        }
    }

    #[test]
    fn test_revoke_stamps_once() {
        let mut info = make_info();
        let first = OffsetDateTime::now_utc();
        assert!(info.revoke(first));
        assert_eq!(info.status, TokenStatus::Revoked);
        assert_eq!(info.revoked_at, Some(first));

        assert!(!info.revoke(first + Duration::minutes(5)));
        assert_eq!(info.revoked_at, Some(first));
    }

    #[test]
    fn test_retention_follows_refresh_window() {
        let mut info = make_info();
        assert_eq!(info.retained_until(), info.expires_at);

        let refresh = info.expires_at + Duration::days(30);
        info.refresh_expires_at = Some(refresh);
        assert_eq!(info.retained_until(), refresh);
        assert!(!info.is_stale_at(info.expires_at + Duration::days(1)));
        assert!(info.is_stale_at(refresh));
    }

    #[test]
    fn test_active() {
        let mut info = make_info();
        let now = OffsetDateTime::now_utc();
        assert!(info.is_active_at(now));
        assert!(!info.is_active_at(info.expires_at));
        info.revoke(now);
        assert!(!info.is_active_at(now));
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_value(make_info()).unwrap();
        assert_eq!(json["status"], "ISSUED");
        assert_eq!(json["grant_type"], "password");
        assert!(json.get("revoked_at").is_none());
    }
}
