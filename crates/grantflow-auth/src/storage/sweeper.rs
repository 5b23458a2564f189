//! Periodic purge of expired codes and token records.
//!
//! Reads already ignore expired entries, so sweeping only bounds memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::storage::{AccessTokenStorage, AuthorizationStorage};

/// Removes expired entries from both stores.
pub struct ExpirySweeper {
    authorizations: Arc<dyn AuthorizationStorage>,
    tokens: Arc<dyn AccessTokenStorage>,
}

impl ExpirySweeper {
    #[must_use]
    pub fn new(
        authorizations: Arc<dyn AuthorizationStorage>,
        tokens: Arc<dyn AccessTokenStorage>,
    ) -> Self {
        Self {
            authorizations,
            tokens,
        }
    }

    /// Runs one purge pass over both stores.
    ///
    /// A failure in one store is logged and does not skip the other.
    /// Returns the number of (authorizations, tokens) removed.
    pub async fn sweep_once(&self) -> (u64, u64) {
        let codes = match self.authorizations.purge_expired().await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "Failed to purge expired authorization codes");
                0
            }
        };
        let tokens = match self.tokens.purge_expired().await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "Failed to purge expired token records");
                0
            }
        };
        if codes > 0 || tokens > 0 {
            debug!(codes, tokens, "Purged expired entries");
        }
        (codes, tokens)
    }

    /// Sweeps forever at `period`. The first pass runs immediately.
    pub async fn run(&self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period = ?period, "Expiry sweeper started");

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    ///
    /// Abort the returned handle to stop sweeping.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(period).await })
    }
}

/// Starts a background sweeper over both stores.
pub fn spawn_expiry_sweeper(
    authorizations: Arc<dyn AuthorizationStorage>,
    tokens: Arc<dyn AccessTokenStorage>,
    period: Duration,
) -> JoinHandle<()> {
    ExpirySweeper::new(authorizations, tokens).spawn(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryAccessTokenStorage, InMemoryAuthorizationStorage};
    use crate::types::{OngoingAuthorization, ScopeSet};
    use time::OffsetDateTime;

    fn expired_code() -> OngoingAuthorization {
        let now = OffsetDateTime::now_utc();
        OngoingAuthorization {
            code: OngoingAuthorization::generate_code(),
            client_id: "c1".to_string(),
            redirect_uri: "https://app/cb".to_string(),
            scope: ScopeSet::default(),
            subject: "alice".to_string(),
            code_challenge: None,
            code_challenge_method: None,
            created_at: now - time::Duration::minutes(20),
            expires_at: now - time::Duration::minutes(10),
        }
    }

    #[tokio::test]
    async fn test_sweep_once() {
        let codes = Arc::new(InMemoryAuthorizationStorage::new());
        let tokens = Arc::new(InMemoryAccessTokenStorage::new());
        codes.save(&expired_code()).await.unwrap();

        let sweeper = ExpirySweeper::new(codes.clone(), tokens);
        assert_eq!(sweeper.sweep_once().await, (1, 0));
        assert!(codes.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_sweeper_runs() {
        let codes = Arc::new(InMemoryAuthorizationStorage::new());
        let tokens = Arc::new(InMemoryAccessTokenStorage::new());
        let handle = spawn_expiry_sweeper(codes.clone(), tokens, Duration::from_millis(10));

        codes.save(&expired_code()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(codes.is_empty());
        handle.abort();
    }
}
