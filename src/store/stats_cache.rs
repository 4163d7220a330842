//! Shared stats accumulation cache client
//!
//! A short-lived out-of-process cache mirrors per-room combat counters so
//! collaborators can watch a round in flight. The simulation only ever
//! issues initialize / increment / read-all against it and never depends on
//! the calls succeeding: every call site fires through the `_bg` variants,
//! which spawn and log failures at warn.

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::game::stats::StatField;
use crate::ws::protocol::RoundStats;

/// Cache client; a `None` base URL disables all calls
#[derive(Clone)]
pub struct StatsCacheClient {
    client: Client,
    base_url: Option<String>,
}

impl StatsCacheClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn enabled(&self) -> bool {
        self.base_url.is_some()
    }

    fn room_url(&self, room_id: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/rooms/{}", base, room_id))
    }

    /// Create the per-connection entry for a room
    pub async fn initialize(
        &self,
        room_id: &str,
        conn: Uuid,
        username: &str,
    ) -> Result<(), CacheError> {
        let Some(url) = self.room_url(room_id) else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}/players/{}", url, conn))
            .json(&json!({ "username": username }))
            .send()
            .await
            .map_err(CacheError::Request)?;

        check_status(response).await
    }

    /// Add `amount` to one counter field for one connection
    pub async fn increment(
        &self,
        room_id: &str,
        conn: Uuid,
        field: StatField,
        amount: f64,
    ) -> Result<(), CacheError> {
        let Some(url) = self.room_url(room_id) else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}/players/{}/increment", url, conn))
            .json(&json!({ "field": field.as_str(), "amount": amount }))
            .send()
            .await
            .map_err(CacheError::Request)?;

        check_status(response).await
    }

    /// Read every connection's accumulated counters for a room
    pub async fn read_all(
        &self,
        room_id: &str,
    ) -> Result<HashMap<Uuid, CachedPlayerStats>, CacheError> {
        let Some(url) = self.room_url(room_id) else {
            return Ok(HashMap::new());
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CacheError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(CacheError::Parse)
    }

    /// Fire-and-forget initialize; never blocks the simulation path
    pub fn initialize_bg(&self, room_id: &str, conn: Uuid, username: &str) {
        if !self.enabled() {
            return;
        }
        let this = self.clone();
        let room_id = room_id.to_string();
        let username = username.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.initialize(&room_id, conn, &username).await {
                warn!(room_id = %room_id, conn = %conn, error = %e, "Stats cache initialize failed");
            }
        });
    }

    /// Fire-and-forget increment; never blocks the simulation path
    pub fn increment_bg(&self, room_id: &str, conn: Uuid, field: StatField, amount: f64) {
        if !self.enabled() {
            return;
        }
        let this = self.clone();
        let room_id = room_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.increment(&room_id, conn, field, amount).await {
                warn!(room_id = %room_id, conn = %conn, error = %e, "Stats cache increment failed");
            }
        });
    }
}

/// One connection's counters as stored by the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPlayerStats {
    pub username: String,
    #[serde(flatten)]
    pub stats: RoundStats,
}

async fn check_status(response: reqwest::Response) -> Result<(), CacheError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(CacheError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Stats cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),
}
