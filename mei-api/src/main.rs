use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use mei_api::{AppConfig, app, logging, router};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Calcula MEI backend: DAS calculators, saved history and usage quota.
///
/// Flags override the config file, which overrides the built-in defaults.
/// `MEI_*` environment variables sit between the file and the flags.
#[derive(Debug, Parser)]
#[command(name = "calcula-mei", version, about)]
struct Cli {
    /// TOML config file.
    #[arg(short, long, env = "MEI_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `calcula-mei.db`) or `:memory:`.
    #[arg(long)]
    database_url: Option<String>,
}

impl Cli {
    fn apply(
        self,
        config: &mut AppConfig,
    ) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.connection_string = url;
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.take().as_deref())?;
    cli.apply(&mut config);

    logging::init_logging(&config.logging.level, config.logging.file.as_deref())?;

    let state = app::build_state(&config).await?;
    let service = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
