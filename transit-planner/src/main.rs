use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_planner::config::ServerConfig;
use transit_planner::network::Network;
use transit_planner::router::Router;
use transit_planner::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    info!(path = %config.network_path.display(), "loading network");
    let network = Network::load(&config.network_path)?;
    let summary = network.summary();
    info!(
        intersections = summary.intersections,
        segments = summary.segments,
        stops = summary.stops,
        lines = summary.lines,
        "network loaded"
    );

    // Filling the hub cache runs one drive search per ordered hub pair.
    let (network, router) = match config.router_config() {
        Some(router_config) => {
            tokio::task::spawn_blocking(move || {
                let router = Router::build(&network, &router_config);
                (network, Some(router))
            })
            .await?
        }
        None => (network, None),
    };

    let state = AppState::new(network, router, &config.cache);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "journey planner listening");
    info!("endpoints: GET /health, GET /network, POST /journey/plan, POST /journey/resolve");

    axum::serve(listener, app).await?;
    Ok(())
}
