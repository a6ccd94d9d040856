//! `demux` - serves the demo actions over one batched HTTP endpoint.
//!
//! ```text
//! demux [--config demux.toml] [--port 8080]
//! demux --version | --help
//! ```

mod actions;
mod cli;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use clap::Parser;
use demux_core::DemuxBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // RUST_LOG が設定されていればそちらを優先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    run(config).await
}

async fn run(config: ServerConfig) -> Result<()> {
    let separator = config.demux.separator.clone();
    let builder = DemuxBuilder::new().config(config.demux.clone())?;
    let demux = Arc::new(actions::install(builder, &separator)?.build()?);
    actions::install_introspection(&demux)?;

    info!(
        path = %demux.config().path,
        method = %demux.config().method,
        actions = ?demux.registry().paths(),
        "demux endpoint configured"
    );

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { axum::http::StatusCode::NOT_FOUND });
    let app = demux_core::http::attach(app, demux);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
