//! Pagina server.
//!
//! Loads configuration, builds the site, and serves pages over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pagina_kernel::config::Config;
use pagina_kernel::routes;
use pagina_kernel::state::AppState;

/// Command-line overrides for environment configuration.
#[derive(Debug, Parser)]
#[command(name = "pagina", version, about = "Serve a page tree over HTTP")]
struct Cli {
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// YAML site fixture to load (overrides SITE_FIXTURE).
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Template directory (overrides THEME_DIR).
    #[arg(long)]
    theme_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.fixture.is_some() {
        config.site_fixture = cli.fixture;
    }
    if cli.theme_dir.is_some() {
        config.theme_dir = cli.theme_dir;
    }
    info!(port = config.port, fixture = ?config.site_fixture, "configuration loaded");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    let app = routes::router()
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
