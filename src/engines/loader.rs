//! Engine loader for initializing engines from configuration

use super::registry::EngineRegistry;
use super::traits::{Engine, EngineKind};
use super::{bing, duckduckgo, google};
use crate::config::{EngineConfig, Settings};
use crate::error;
use crate::network::HttpClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Build the registry for every supported provider.
    ///
    /// A provider that is disabled or misconfigured does not abort startup; it
    /// is recorded as unavailable and requests naming it are rejected.
    pub fn load(settings: &Settings, client: &HttpClient) -> EngineRegistry {
        let mut registry = EngineRegistry::new();

        for kind in EngineKind::ALL {
            let config = settings
                .get_engine(kind)
                .cloned()
                .unwrap_or_else(|| EngineConfig::named(kind));

            if config.disabled {
                info!("Skipping disabled engine: {}", kind);
                registry.mark_unavailable(kind, "engine is disabled in settings");
                continue;
            }

            let timeout = config
                .timeout
                .map(|secs| settings.outgoing.clamp_timeout(secs))
                .unwrap_or_else(|| settings.outgoing.default_timeout());

            match Self::create_engine(kind, &config, client.clone(), timeout) {
                Ok(engine) => {
                    info!("Loaded engine: {} (timeout {:?})", kind, timeout);
                    registry.register(engine);
                }
                Err(e) => {
                    warn!("Engine {} unavailable: {}", kind, e);
                    registry.mark_unavailable(kind, e.to_string());
                }
            }
        }

        info!("Loaded {} engines", registry.len());
        registry
    }

    fn create_engine(
        kind: EngineKind,
        config: &EngineConfig,
        client: HttpClient,
        timeout: std::time::Duration,
    ) -> error::Result<Arc<dyn Engine>> {
        let engine: Arc<dyn Engine> = match kind {
            EngineKind::Google => Arc::new(google::Google::from_config(config, client, timeout)?),
            EngineKind::Bing => Arc::new(bing::Bing::from_config(config, client, timeout)?),
            EngineKind::DuckDuckGo => {
                Arc::new(duckduckgo::DuckDuckGo::from_config(config, client, timeout))
            }
        };
        Ok(engine)
    }
}
