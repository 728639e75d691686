//! Tour Routing - Axum Server

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tour_routing::api::{create_router, AppState};
use tour_routing::config::{ProviderKind, RoutingConfig};
use tour_routing::console;
use tour_routing::optimizer::RouteOptimizer;
use tour_routing::providers::build_provider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let config = RoutingConfig::from_env()?;
    console::print_banner();
    console::print_config(&config);

    if config.provider == ProviderKind::Google && config.google_api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY is not set; every optimize request will fail");
    }

    let provider = build_provider(&config)?;
    let state = Arc::new(AppState::new(RouteOptimizer::new(provider)));
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to structured output; `RUST_LOG` overrides
/// the default `tour_routing=info` filter.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive("tour_routing=info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}
