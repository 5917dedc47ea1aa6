use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debease::{Config, Orchestrator, wait_for_shutdown_signal};

/// Package install orchestrator with a real-time event stream.
#[derive(Debug, Parser)]
#[command(name = "debease", version, about)]
struct Args {
    /// Listen address (overrides DEBEASE_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides DEBEASE_PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let env_file_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_file_loaded {
        info!("loaded .env file");
    }

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if !config.simulate {
        warn!(elevate = config.elevate, "real installer enabled: jobs run apt-get on this host");
    }

    let orchestrator = Orchestrator::builder(config).build();
    orchestrator.start().await;

    let addr = orchestrator.config().bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, workers = orchestrator.pool().size(), simulate = orchestrator.config().simulate, "debease listening");

    let app = orchestrator.router();
    let server_shutdown = orchestrator.shutdown_token();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    match wait_for_shutdown_signal().await {
        Ok(signal) => info!(signal, "shutdown requested"),
        Err(err) => error!(%err, "failed to listen for shutdown signals; shutting down"),
    }

    if let Err(err) = orchestrator.shutdown().await {
        warn!(label = err.as_label(), %err, "worker pool did not stop cleanly");
    }
    server
        .await
        .context("server task panicked")?
        .context("server error")?;

    info!("debease stopped");
    Ok(())
}
