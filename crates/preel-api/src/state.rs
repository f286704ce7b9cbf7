//! Application state shared across handlers.

use preel_genai::GenAiConfig;
use preel_runner::{JobRunner, StudioConfig};
use preel_store::JobStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// API configuration
    pub config: ApiConfig,
    /// In-memory job registry
    pub store: JobStore,
    /// Background pipeline runner
    pub runner: JobRunner,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: ApiConfig, studio: StudioConfig, genai: GenAiConfig) -> Self {
        let store = JobStore::new();
        let runner = JobRunner::new(store.clone(), genai, studio);

        Self {
            config,
            store,
            runner,
        }
    }
}
