//! Token lifecycle operations on the access-token store.
//!
//! Revocation and introspection (RFC 7009 / RFC 7662 semantics) by JTI.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::AuthResult;
use crate::notify::{NotificationDispatcher, NotificationEvent};
use crate::storage::AccessTokenStorage;
use crate::types::{AccessTokenInfo, TokenStatus};

/// RFC 7662 introspection response.
///
/// Inactive tokens carry nothing but `active: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl IntrospectionResponse {
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            scope: None,
            client_id: None,
            sub: None,
            exp: None,
            iat: None,
            jti: None,
            token_type: None,
        }
    }

    fn from_info(info: &AccessTokenInfo) -> Self {
        Self {
            active: true,
            scope: Some(info.scope.to_string()),
            client_id: Some(info.client_id.clone()),
            sub: Some(info.subject.clone()),
            exp: Some(info.expires_at.unix_timestamp()),
            iat: Some(info.issued_at.unix_timestamp()),
            jti: Some(info.jti.clone()),
            token_type: Some("Bearer".to_string()),
        }
    }
}

/// Revocation, introspection and listing over an [`AccessTokenStorage`].
pub struct TokenLifecycle {
    tokens: Arc<dyn AccessTokenStorage>,
    notifier: Option<NotificationDispatcher>,
}

impl TokenLifecycle {
    #[must_use]
    pub fn new(tokens: Arc<dyn AccessTokenStorage>) -> Self {
        Self {
            tokens,
            notifier: None,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: NotificationDispatcher) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Revokes the token with `jti`.
    ///
    /// Returns `true` if this call performed the revocation. Unknown and
    /// already-revoked tokens return `false`; per RFC 7009 callers report
    /// success either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn revoke(&self, jti: &str) -> AuthResult<bool> {
        let Some(info) = self.tokens.find_by_jti(jti).await? else {
            return Ok(false);
        };
        let revoked = self
            .tokens
            .transition_status(jti, TokenStatus::Issued, TokenStatus::Revoked)
            .await?;
        if revoked {
            info!(jti = %jti, client_id = %info.client_id, "Token revoked");
            if let Some(notifier) = &self.notifier {
                notifier.notify(NotificationEvent::TokenRevoked {
                    jti: info.jti,
                    client_id: info.client_id,
                    subject: info.subject,
                });
            }
        }
        Ok(revoked)
    }

    /// Introspects the token with `jti`.
    ///
    /// Unknown, expired and revoked tokens are reported inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn introspect(&self, jti: &str) -> AuthResult<IntrospectionResponse> {
        let now = OffsetDateTime::now_utc();
        Ok(match self.tokens.find_by_jti(jti).await? {
            Some(info) if info.is_active_at(now) => IntrospectionResponse::from_info(&info),
            _ => IntrospectionResponse::inactive(),
        })
    }

    /// Tokens that are neither revoked nor expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_active(&self) -> AuthResult<Vec<AccessTokenInfo>> {
        let now = OffsetDateTime::now_utc();
        let mut active: Vec<_> = self
            .tokens
            .list()
            .await?
            .into_iter()
            .filter(|info| info.is_active_at(now))
            .collect();
        active.sort_by(|a, b| a.issued_at.cmp(&b.issued_at));
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryAccessTokenStorage;
    use crate::types::{GrantType, ScopeSet};
    use time::Duration;

    fn token(jti: &str, ttl: Duration) -> AccessTokenInfo {
        let now = OffsetDateTime::now_utc();
        AccessTokenInfo {
            jti: jti.to_string(),
            subject: "alice".to_string(),
            client_id: "c1".to_string(),
            scope: ScopeSet::parse("read write"),
            grant_type: GrantType::AuthorizationCode,
            issued_at: now,
            expires_at: now + ttl,
            refresh_expires_at: Some(now + Duration::days(1)),
            status: TokenStatus::Issued,
            revoked_at: None,
        }
    }

    async fn lifecycle_with(tokens: &[AccessTokenInfo]) -> TokenLifecycle {
        let store = Arc::new(InMemoryAccessTokenStorage::new());
        for info in tokens {
            store.save(info).await.unwrap();
        }
        TokenLifecycle::new(store)
    }

    #[tokio::test]
    async fn test_introspect_active() {
        let lifecycle = lifecycle_with(&[token("t1", Duration::hours(1))]).await;

        let response = lifecycle.introspect("t1").await.unwrap();
        assert!(response.active);
        assert_eq!(response.scope.as_deref(), Some("read write"));
        assert_eq!(response.sub.as_deref(), Some("alice"));
        assert_eq!(response.client_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_introspect_inactive() {
        // access expired but still retained for its refresh window
        let lifecycle = lifecycle_with(&[token("old", Duration::seconds(-1))]).await;

        assert_eq!(
            lifecycle.introspect("old").await.unwrap(),
            IntrospectionResponse::inactive()
        );
        assert!(!lifecycle.introspect("unknown").await.unwrap().active);

        let json = serde_json::to_value(IntrospectionResponse::inactive()).unwrap();
        assert_eq!(json, serde_json::json!({ "active": false }));
    }

    #[tokio::test]
    async fn test_revoke() {
        let lifecycle = lifecycle_with(&[token("t1", Duration::hours(1))]).await;

        assert!(lifecycle.revoke("t1").await.unwrap());
        assert!(!lifecycle.revoke("t1").await.unwrap());
        assert!(!lifecycle.revoke("missing").await.unwrap());
        assert!(!lifecycle.introspect("t1").await.unwrap().active);
    }

    #[tokio::test]
    async fn test_list_active() {
        let lifecycle = lifecycle_with(&[
            token("a", Duration::hours(1)),
            token("b", Duration::hours(1)),
            token("expired", Duration::seconds(-1)),
        ])
        .await;
        lifecycle.revoke("b").await.unwrap();

        let active = lifecycle.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].jti, "a");
    }
}
