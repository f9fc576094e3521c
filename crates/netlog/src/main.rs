//! netlog - forward stdin to a netlog collector

use anyhow::Result;
use clap::Parser;
use netlog_core::{Level, LogRecord};
use netlog_proto::{Delivery, Forwarder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod output;

use cli::Cli;
use output::{print_error, print_summary, Summary};

async fn forward(
    forwarder: &mut Forwarder,
    summary: &mut Summary,
    name: &str,
    level: Level,
    msg: String,
) -> Result<()> {
    let record = LogRecord::new(name, level, msg);
    match forwarder.send(&record).await? {
        Delivery::Sent => summary.sent += 1,
        Delivery::Dropped => {
            debug!("Dropped: {}", record.message);
            summary.dropped += 1;
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<Summary> {
    let mut forwarder = Forwarder::new(&cli.ip, cli.port);
    let mut summary = Summary::new(forwarder.addr());

    let greeting = format!("Network logging enable {}.", cli.ip);
    forward(&mut forwarder, &mut summary, &cli.name, cli.level, greeting).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let msg = line.trim_end().to_string();
        forward(&mut forwarder, &mut summary, &cli.name, cli.level, msg).await?;
    }

    forwarder.close().await?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("netlog={0},netlog_proto={0}", log_level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let json = cli.json;
    match run(cli).await {
        Ok(summary) => {
            print_summary(&summary, json);
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
