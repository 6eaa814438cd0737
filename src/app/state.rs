//! Application state shared across routes

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::game::MatchRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<MatchRegistry>,
    /// Match that new observer connections attach to
    pub default_match_id: Uuid,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<MatchRegistry>, default_match_id: Uuid) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            default_match_id,
        }
    }
}
