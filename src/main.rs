use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;

use labscan::config::{self, ServerConfig};
use labscan::core_state::CoreState;

/// Lab report extraction server.
#[derive(Debug, Parser)]
#[command(name = "labscan-server", version, about)]
struct Cli {
    #[command(flatten)]
    server: ServerConfig,
}

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!("application terminated successfully");
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(error = ?error, "application terminated with error");
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    labscan::init_tracing();
    tracing::info!(
        name = config::APP_NAME,
        version = config::APP_VERSION,
        ocr = cfg!(feature = "ocr"),
        "Starting"
    );

    let server = &cli.server;
    tracing::info!(
        host = %server.host,
        port = server.port,
        extraction_timeout_secs = server.extraction_timeout,
        max_upload_bytes = server.max_upload_bytes,
        report_skipped_matches = server.report_skipped_matches,
        "Server configuration"
    );

    let core = CoreState::from_config(server).context("failed to initialize application state")?;
    let addr = SocketAddr::new(server.host, server.port);

    labscan::api::serve(Arc::new(core), addr, shutdown_signal())
        .await
        .context("server terminated abnormally")?;

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        } else {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!("Received SIGTERM signal, initiating graceful shutdown");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
