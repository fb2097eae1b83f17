use campaign_planner_service::recent::DEFAULT_RECENT_CAPACITY;
use campaign_planner_service::{build_router, ServiceConfig, ServiceState};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "campaign-plannerd",
    version,
    about = "Campaign budget planner REST service"
)]
struct Cli {
    /// REST socket address to bind, e.g. 127.0.0.1:8090
    #[arg(long, default_value = "127.0.0.1:8090", env = "CAMPAIGN_PLANNER_LISTEN")]
    listen: SocketAddr,
    /// JSON catalog with default CPMs and strategy presets. Built-in values when unset.
    #[arg(long, env = "CAMPAIGN_PLANNER_CATALOG")]
    catalog: Option<PathBuf>,
    /// File used to persist recently compared custom strategies.
    #[arg(
        long,
        default_value = "data/recent-strategies.json",
        env = "CAMPAIGN_PLANNER_RECENT_STRATEGIES"
    )]
    recent_strategies: PathBuf,
    /// Number of custom strategies to remember.
    #[arg(
        long,
        default_value_t = DEFAULT_RECENT_CAPACITY,
        env = "CAMPAIGN_PLANNER_RECENT_CAPACITY"
    )]
    recent_capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "campaign_planner_service=info,info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    if let Some(catalog) = cli.catalog.as_ref() {
        info!("loading planner catalog from {}", catalog.display());
    }

    let state = ServiceState::bootstrap(ServiceConfig {
        catalog_path: cli.catalog,
        recent_path: cli.recent_strategies,
        recent_capacity: cli.recent_capacity,
    })?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(
        "campaign-planner-service REST listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;

    Ok(())
}
