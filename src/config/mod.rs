//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Round duration in seconds
    pub round_duration_secs: u64,
    /// Delay between round end and in-place room reset, in seconds
    pub reset_delay_secs: u64,

    /// Base URL of the shared stats accumulation cache (None = disabled)
    pub stats_cache_url: Option<String>,
    /// Base URL of the match results collaborator (None = disabled)
    pub results_url: Option<String>,

    /// Allowed client origin for CORS
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let round_duration_secs = match env::var("ROUND_DURATION_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("ROUND_DURATION_SECS"))?,
            Err(_) => 300,
        };

        let reset_delay_secs = match env::var("RESET_DELAY_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("RESET_DELAY_SECS"))?,
            Err(_) => 5,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            round_duration_secs,
            reset_delay_secs,

            stats_cache_url: env::var("STATS_CACHE_URL").ok(),
            results_url: env::var("RESULTS_URL").ok(),

            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
