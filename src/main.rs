//! SearchBridge server entry point

use anyhow::Result;
use searchbridge::{
    config::{self, Settings},
    engines::EngineLoader,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// How often idle rate-limit state is dropped
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let settings = config::load()?;
    init_tracing(&settings);

    info!("Starting SearchBridge v{}", searchbridge::VERSION);

    let client = HttpClient::with_settings(&settings.outgoing)?;
    let registry = EngineLoader::load(&settings, &client);
    if registry.is_empty() {
        warn!("No search engines are available; every search will fail");
    }

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, registry);
    spawn_limiter_pruning(&state);

    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// RUST_LOG wins over the configured log level
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.general.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn spawn_limiter_pruning(state: &AppState) {
    let limiter = state.search.limiter().clone();
    if !limiter.is_enabled() {
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = limiter.prune();
            if removed > 0 {
                debug!("Pruned {} idle rate limit entries", removed);
            }
        }
    });
}
