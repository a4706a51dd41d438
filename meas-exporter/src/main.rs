//! Prometheus exporter for measurement tables.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use meas_exporter::config::LogFormat;
use meas_exporter::{Exposition, ExporterConfig, HttpServer, build_collector};

/// Prometheus exporter for measurement tables.
#[derive(Parser, Debug)]
#[command(name = "meas-exporter")]
#[command(about = "Export meas table readings as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Override listen address and log level from CLI
    config.apply_overrides(args.listen, args.log_level)?;

    // Initialize logging
    let log_level = config.logging.level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("meas_exporter={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting meas exporter");

    // Descriptor or rule problems stop the process before serving
    let collector = build_collector(&config.tables)?;
    let exposition = Arc::new(Exposition::new(collector));

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let server = HttpServer::new(exposition, listen_addr, config.prometheus.path.clone())
        .bind()
        .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut http_task = tokio::spawn(server.serve(shutdown_rx));

    // Wait for shutdown signal, or the server stopping on its own
    tokio::select! {
        res = &mut http_task => {
            error!("HTTP server exited unexpectedly");
            return match res {
                Ok(Ok(())) => Err(anyhow::anyhow!("HTTP server exited unexpectedly")),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(e.into()),
            };
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(_) => std::future::pending::<()>().await,
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    match tokio::time::timeout(Duration::from_secs(5), http_task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => info!("HTTP server did not stop in time"),
    }

    info!("Exporter stopped");
    Ok(())
}
