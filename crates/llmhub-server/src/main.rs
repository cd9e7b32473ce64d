use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use llmhub_core::{
    config::{load_config, EngineConfig},
    scenario::{load_weight_table, ScenarioWeightResolver},
    snapshot::resolve_snapshots,
    Recommender,
};
use llmhub_server::{router, AppState, SERVICE_NAME};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "llmhub-server", about = "HTTP API for model recommendations", version)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 8787)]
    port: u16,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Snapshot JSON file (defaults to the sync cache, then the bundled sample).
    #[arg(long, env = "LLMHUB_SNAPSHOTS")]
    snapshots: Option<PathBuf>,

    /// Engine settings TOML.
    #[arg(long, env = "LLMHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Scenario weight table TOML.
    #[arg(long, env = "LLMHUB_WEIGHTS")]
    weights: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let resolver = match &args.weights {
        Some(path) => ScenarioWeightResolver::new(Arc::new(load_weight_table(path)?)),
        None => ScenarioWeightResolver::bundled()?,
    };
    let (rows, origin) = resolve_snapshots(args.snapshots.as_deref())?;
    let state = AppState::new(Recommender::new(resolver, config), rows, origin.to_string());
    tracing::info!(rows = state.row_count(), source = %origin, "snapshots loaded");

    let app = router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("{SERVICE_NAME} listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
