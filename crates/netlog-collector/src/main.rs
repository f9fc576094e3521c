//! netlogd - network log collector

use anyhow::{Context, Result};
use clap::Parser;
use netlog_collector::{Collector, CollectorHandle, ServeOptions};
use netlog_sink::LogSink;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "netlogd={0},netlog_collector={0},netlog_sink={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.into_config()?;

    info!("Starting logging server.");
    info!("Settings {:?}", config);

    if !config.folder.exists() {
        std::fs::create_dir_all(&config.folder)
            .with_context(|| format!("Failed to create {}", config.folder.display()))?;
        info!("Created log folder: {}", config.folder.display());
    }

    let sink = Arc::new(LogSink::from_config(&config)?);
    let collector = match Collector::bind(&config.bind_addr(), sink, ServeOptions::from(&config)).await {
        Ok(collector) => collector,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let handle = collector.handle();
    tokio::spawn(stop_on_signal(handle));

    let accepted = collector.serve_until_stopped().await?;
    info!("Collector shutdown complete, {} connections served", accepted);
    Ok(())
}

#[cfg(unix)]
async fn stop_on_signal(handle: CollectorHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }
    handle.abort();
}

#[cfg(not(unix))]
async fn stop_on_signal(handle: CollectorHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down..."),
        Err(e) => {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
    }
    handle.abort();
}
