//! CLI argument definitions

use clap::Parser;
use netlog_core::{constants, Level};

#[derive(Parser, Debug)]
#[command(name = "netlog")]
#[command(version, about = "Forward stdin lines as log records to a netlog collector")]
pub struct Cli {
    /// Collector address
    #[arg(long)]
    pub ip: String,

    /// Collector port
    #[arg(short, long, default_value_t = constants::DEFAULT_PORT)]
    pub port: u16,

    /// Logger name attached to every record
    #[arg(short, long, default_value = constants::ROOT_LOGGER)]
    pub name: String,

    /// Level of the forwarded records (name or number)
    #[arg(short, long, default_value_t = Level::INFO)]
    pub level: Level,

    /// Print the delivery summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
