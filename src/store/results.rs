//! Match results handoff
//!
//! Finished rounds are posted to a persistence collaborator that owns
//! leaderboards and history. The handoff runs off the simulation's critical
//! path and failures are logged, not retried.

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::store::stats_cache::StatsCacheClient;
use crate::ws::protocol::PlayerRoundSummary;

/// Finished-round summary handed to the persistence collaborator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub room_id: String,
    pub ended_at: chrono::DateTime<chrono::Utc>,
    pub duration_secs: u64,
    pub final_stats: Vec<PlayerRoundSummary>,
    /// Externally-accumulated counters from the stats cache, if reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_totals: Option<serde_json::Value>,
}

/// Results sink; a `None` base URL disables submission
#[derive(Clone)]
pub struct ResultsStore {
    client: Client,
    base_url: Option<String>,
}

impl ResultsStore {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Submit a finished round
    pub async fn submit_round_summary(&self, summary: &RoundSummary) -> Result<(), ResultsError> {
        let Some(base) = &self.base_url else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}/matches", base))
            .json(summary)
            .send()
            .await
            .map_err(ResultsError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResultsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Fire-and-forget handoff: enrich the summary with the cache's view of
    /// the room if the cache answers, then submit. Spawned so the round
    /// reset never waits on either collaborator.
    pub fn submit_bg(&self, mut summary: RoundSummary, cache: StatsCacheClient) {
        if !self.enabled() {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            match cache.read_all(&summary.room_id).await {
                Ok(cached) if !cached.is_empty() => {
                    summary.cached_totals = serde_json::to_value(&cached).ok();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(room_id = %summary.room_id, error = %e, "Stats cache read-all failed");
                }
            }

            match this.submit_round_summary(&summary).await {
                Ok(()) => {
                    info!(room_id = %summary.room_id, players = summary.final_stats.len(), "Round summary submitted");
                }
                Err(e) => {
                    warn!(room_id = %summary.room_id, error = %e, "Round summary submission failed");
                }
            }
        });
    }
}

/// Results collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
}
