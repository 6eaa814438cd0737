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

    /// Allowed client origin for CORS. `*` allows any origin.
    pub client_origin: String,
    /// Directory of static client assets served at `/`
    pub assets_dir: String,

    /// Match length in seconds
    pub match_seconds: u32,
    /// Resume play automatically after resets instead of waiting for a
    /// ready signal
    pub auto_kickoff: bool,
    /// Fixed simulation seed, for reproducible matches. Random if unset.
    pub match_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let match_seconds = match env::var("MATCH_SECONDS") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("MATCH_SECONDS"))?,
            Err(_) => 180,
        };

        let auto_kickoff = match env::var("AUTO_KICKOFF") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("AUTO_KICKOFF"))?,
            Err(_) => true,
        };

        let match_seed = match env::var("MATCH_SEED") {
            Ok(v) => Some(v.parse().map_err(|_| ConfigError::Invalid("MATCH_SEED"))?),
            Err(_) => None,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            assets_dir: env::var("ASSETS_DIR").unwrap_or_else(|_| "public".to_string()),

            match_seconds,
            auto_kickoff,
            match_seed,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
