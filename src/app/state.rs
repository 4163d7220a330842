//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::RoomRegistry;
use crate::store::{ResultsStore, StatsCacheClient};
use crate::ws::gateway::WsGateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<RoomRegistry>,
    pub gateway: Arc<WsGateway>,
    pub stats_cache: StatsCacheClient,
    pub results: ResultsStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Collaborator clients; both tolerate being unconfigured
        let stats_cache = StatsCacheClient::new(config.stats_cache_url.clone());
        let results = ResultsStore::new(config.results_url.clone());

        // Explicit room registry; rooms are created lazily on first join
        let registry = Arc::new(RoomRegistry::new(
            config.round_duration_secs,
            stats_cache.clone(),
        ));

        let gateway = Arc::new(WsGateway::new());

        Self {
            config,
            registry,
            gateway,
            stats_cache,
            results,
        }
    }
}
