//! # Connection Sync Orchestrator
//!
//! One run iterates every stored connection strictly sequentially: token
//! refresh pass first, then per-connection media reconciliation and
//! profile refresh, with a minimum-interval gate throttling aggregate
//! call volume against the provider. A single connection's failure never
//! cancels the rest; failures classified as token revocation write the
//! invalid sentinel so future runs skip that connection without any
//! network call.

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::config::SyncConfig;
use crate::instagram::{ErrorClass, InstagramClient, InstagramError, classify_error_text};
use crate::media_sync::{MediaReconciler, MediaSyncStats};
use crate::models::connection::{Model as Connection, TokenState};
use crate::repositories::ConnectionRepository;
use crate::token_refresh::{RefreshOutcome, TokenRefresher};

/// Terminal outcome of one connection within a run.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Media replaced and profile refreshed.
    Success {
        #[serde(rename = "mediaCount")]
        media_count: usize,
        images: usize,
        videos: usize,
    },
    /// Token is the invalid sentinel; no network call was made.
    Skipped { reason: String },
    /// Something failed; the error text is echoed into the report.
    Failed { error: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success { .. })
    }
}

/// Per-shop entry of the run report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShopOutcome {
    pub shop: String,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Aggregated report of one orchestrator run.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub total_shops: usize,
    pub success_count: usize,
    pub fail_count: usize,
    /// Run duration in milliseconds
    pub duration: u64,
    pub results: Vec<ShopOutcome>,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Synced {} shops successfully, {} failed",
            self.success_count, self.fail_count
        )
    }
}

/// Minimum-interval gate between consecutive task starts.
///
/// The first call passes immediately; each subsequent call sleeps until
/// the configured interval has elapsed since the previous permitted start.
#[derive(Debug)]
pub struct Pacer {
    interval: TokioDuration,
    last_start: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: TokioDuration) -> Self {
        Self {
            interval,
            last_start: None,
        }
    }

    /// Wait until the minimum interval since the previous permitted start
    /// has passed, then record this start.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_start {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                sleep(self.interval - elapsed).await;
            }
        }
        self.last_start = Some(Instant::now());
    }
}

/// Runs the full sync across all stored connections.
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    connections: ConnectionRepository,
    client: InstagramClient,
    refresher: TokenRefresher,
    reconciler: MediaReconciler,
    pacing: TokioDuration,
}

impl SyncOrchestrator {
    pub fn new(
        db: std::sync::Arc<sea_orm::DatabaseConnection>,
        client: InstagramClient,
        config: &SyncConfig,
    ) -> Self {
        let connections = ConnectionRepository::new(db.clone());
        let refresher = TokenRefresher::new(connections.clone(), client.clone(), config);
        let reconciler = MediaReconciler::new(
            crate::repositories::MediaRepository::new(db),
            client.clone(),
            config,
        );
        Self {
            connections,
            client,
            refresher,
            reconciler,
            pacing: TokioDuration::from_secs(config.pacing_seconds),
        }
    }

    /// Execute one full run. Only a failure to load the connection set at
    /// all aborts the run; everything else is captured per connection.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<RunReport> {
        let started = std::time::Instant::now();
        let now = Utc::now();

        let mut connections = self
            .connections
            .list_all()
            .await
            .context("failed to load connections for sync run")?;

        if connections.is_empty() {
            info!("No shops to sync");
            return Ok(RunReport {
                total_shops: 0,
                success_count: 0,
                fail_count: 0,
                duration: started.elapsed().as_millis() as u64,
                results: Vec::new(),
            });
        }

        // Refresh pass. Failures are logged and swallowed; a successful
        // exchange replaces the snapshot token so this run already uses it.
        for connection in connections.iter_mut() {
            match self.refresher.refresh_if_expiring(connection, now).await {
                RefreshOutcome::Refreshed {
                    access_token,
                    expires_at,
                } => {
                    connection.access_token = access_token;
                    connection.token_expires_at = expires_at.into();
                }
                RefreshOutcome::Failed(err) => {
                    error!(shop = %connection.shop, error = %err, "Token refresh failed");
                }
                RefreshOutcome::NotDue | RefreshOutcome::SkippedInvalid => {}
            }
        }

        let mut pacer = Pacer::new(self.pacing);
        let mut results = Vec::with_capacity(connections.len());

        for connection in &connections {
            let outcome = self.process_connection(connection, &mut pacer).await;
            results.push(ShopOutcome {
                shop: connection.shop.clone(),
                outcome,
            });
        }

        let success_count = results.iter().filter(|r| r.outcome.is_success()).count();
        let fail_count = results.len() - success_count;
        let duration = started.elapsed();

        counter!("sync_runs_total").increment(1);
        counter!("sync_shops_succeeded_total").increment(success_count as u64);
        counter!("sync_shops_failed_total").increment(fail_count as u64);
        histogram!("sync_run_duration_ms").record(duration.as_secs_f64() * 1_000.0);

        let report = RunReport {
            total_shops: connections.len(),
            success_count,
            fail_count,
            duration: duration.as_millis() as u64,
            results,
        };

        info!(
            total_shops = report.total_shops,
            success_count = report.success_count,
            fail_count = report.fail_count,
            duration_ms = report.duration,
            "Sync run finished"
        );

        Ok(report)
    }

    /// Process one connection to a terminal outcome. The pacing gate is
    /// taken just before network work, so sentinel-skipped connections
    /// neither call the provider nor consume a pacing slot.
    async fn process_connection(&self, connection: &Connection, pacer: &mut Pacer) -> SyncOutcome {
        let token = match connection.token_state() {
            TokenState::Invalid => {
                warn!(shop = %connection.shop, "Skipping shop, token expired");
                counter!("sync_shops_skipped_total").increment(1);
                return SyncOutcome::Skipped {
                    reason: "token_expired".to_string(),
                };
            }
            TokenState::Valid(token) => token.to_string(),
        };

        pacer.wait().await;

        match self.sync_connection(connection, &token).await {
            Ok(stats) => SyncOutcome::Success {
                media_count: stats.count,
                images: stats.images,
                videos: stats.videos,
            },
            Err(err) => {
                self.handle_sync_failure(connection, &err).await;
                SyncOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Media reconciliation followed by a profile refresh for one
    /// connection. Shared by the run loop and the per-shop manual sync.
    pub async fn sync_connection(
        &self,
        connection: &Connection,
        access_token: &str,
    ) -> Result<MediaSyncStats> {
        let stats = self
            .reconciler
            .reconcile(connection.id, &connection.instagram_account_id, access_token)
            .await?;

        let details = self.client.account_details(access_token).await?;

        self.connections
            .update_profile(
                connection.id,
                &details.username,
                details.profile_picture_url.as_deref(),
                details.media_count,
            )
            .await?;

        Ok(stats)
    }

    /// Classify a failure and, for token revocations, write the sentinel
    /// so future runs short-circuit. A persistence failure here is logged
    /// only; the original fetch failure stays the reported one.
    async fn handle_sync_failure(&self, connection: &Connection, err: &anyhow::Error) {
        let class = err
            .downcast_ref::<InstagramError>()
            .map(InstagramError::classify)
            .unwrap_or_else(|| classify_error_text(&err.to_string()));

        error!(
            shop = %connection.shop,
            error = %err,
            class = ?class,
            "Shop sync failed"
        );

        if class == ErrorClass::TokenRevoked {
            counter!("sync_tokens_invalidated_total").increment(1);
            if let Err(db_err) = self.connections.mark_token_invalid(connection.id).await {
                error!(
                    shop = %connection.shop,
                    error = %db_err,
                    "Failed to persist invalid-token sentinel"
                );
            }
        }
    }
}
