//! Application state shared across handlers

use crate::config::Settings;
use crate::engines::EngineRegistry;
use crate::metrics::Metrics;
use crate::search::Search;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<EngineRegistry>,
    /// Search orchestrator
    pub search: Arc<Search>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the orchestrator, limiter and cache from settings
    pub fn new(settings: Settings, registry: EngineRegistry) -> Self {
        let registry = Arc::new(registry);
        let metrics = Arc::new(Metrics::new());
        let search = Arc::new(Search::from_settings(
            &settings,
            Arc::clone(&registry),
            Arc::clone(&metrics),
        ));

        Self {
            settings: Arc::new(settings),
            registry,
            search,
            metrics,
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
