//! # Token Refresher
//!
//! Decides per connection whether the stored long-lived token needs
//! proactive renewal and performs the exchange. Refresh failures are
//! logged and swallowed here; the stale token is retried on the next run
//! and downstream sync steps still attempt to use it.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::instagram::InstagramClient;
use crate::models::connection::{Model as Connection, TokenState};
use crate::repositories::ConnectionRepository;

/// Fallback token lifetime when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 60 * 24 * 60 * 60;

/// Result of one connection's refresh pass.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A new token was exchanged and persisted.
    Refreshed {
        access_token: String,
        expires_at: DateTime<Utc>,
    },
    /// The remaining validity window exceeds the lead time.
    NotDue,
    /// The token is the invalid sentinel; no network call was made.
    SkippedInvalid,
    /// The exchange or the persist failed; logged, never escalated.
    Failed(String),
}

/// Returns whether the remaining validity window is short enough to
/// warrant a refresh. A negative window (already expired) qualifies too;
/// the provider's exchange endpoint still accepts recently-expired tokens.
pub fn needs_refresh(expires_at: DateTime<Utc>, now: DateTime<Utc>, lead: Duration) -> bool {
    expires_at - now < lead
}

/// Proactive token renewal for stored connections.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    repo: ConnectionRepository,
    client: InstagramClient,
    lead: Duration,
}

impl TokenRefresher {
    pub fn new(repo: ConnectionRepository, client: InstagramClient, config: &SyncConfig) -> Self {
        Self {
            repo,
            client,
            lead: Duration::days(config.refresh_lead_days),
        }
    }

    /// Refresh one connection's token if it expires within the lead
    /// window, persisting the new token and expiry on success.
    pub async fn refresh_if_expiring(
        &self,
        connection: &Connection,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        let token = match connection.token_state() {
            TokenState::Invalid => {
                debug!(shop = %connection.shop, "Token is the invalid sentinel, skipping refresh");
                return RefreshOutcome::SkippedInvalid;
            }
            TokenState::Valid(token) => token,
        };

        let expires_at = connection.token_expires_at.with_timezone(&Utc);
        if !needs_refresh(expires_at, now, self.lead) {
            return RefreshOutcome::NotDue;
        }

        counter!("token_refresh_attempts_total").increment(1);

        let refreshed = match self.client.refresh_access_token(token).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                counter!("token_refresh_failure_total").increment(1);
                warn!(
                    shop = %connection.shop,
                    error = %err,
                    "Token refresh failed, will retry on the next run"
                );
                return RefreshOutcome::Failed(err.to_string());
            }
        };

        let lifetime = refreshed
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
        let new_expires_at = now + Duration::seconds(lifetime);

        if let Err(err) = self
            .repo
            .update_token(connection.id, &refreshed.access_token, new_expires_at)
            .await
        {
            counter!("token_refresh_failure_total").increment(1);
            warn!(shop = %connection.shop, error = %err, "Failed to persist refreshed token");
            return RefreshOutcome::Failed(err.to_string());
        }

        counter!("token_refresh_success_total").increment(1);
        info!(
            shop = %connection.shop,
            expires_at = %new_expires_at,
            "Refreshed Instagram access token"
        );

        RefreshOutcome::Refreshed {
            access_token: refreshed.access_token,
            expires_at: new_expires_at,
        }
    }
}
