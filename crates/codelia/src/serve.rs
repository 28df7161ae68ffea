use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use codelia_core::AnalysisService;
use codelia_logging::{LogEvent, Logger};

use crate::api;
use crate::history::open_database;

pub async fn handle_serve_command(
    service: Arc<AnalysisService>,
    db_path: Option<&Path>,
    logger: Arc<Logger>,
    host: &str,
    port: u16,
) -> Result<()> {
    let db = Arc::new(open_database(db_path)?);
    let router = api::create_router(service, db, logger.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;
    let local = listener
        .local_addr()
        .context("Failed to read bound address")?;

    logger.log(&LogEvent::ServerStarted {
        address: local.to_string(),
    });
    info!(address = %local, "API server listening");

    eprintln!();
    eprintln!(
        "  {} {}",
        "->".bright_green(),
        format!("API on http://{}", local).bold()
    );
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}
