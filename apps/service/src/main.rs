//! PulseWatch service
//!
//! Runs the sweep scheduler against the configured database and offers a
//! few commands for managing monitors and inspecting their status.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "pulsewatch")]
#[command(about = "Periodic HTTP checks with uptime and response-time statistics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: $XDG_CONFIG_HOME/pulsewatch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the sweep scheduler until interrupted
    Run,
    /// Check every monitor once and exit
    Sweep,
    /// Monitor management
    #[command(subcommand)]
    Monitor(MonitorCommands),
    /// Print the status summary of a monitor as JSON
    Status {
        #[arg(value_name = "UUID")]
        monitor_id: Uuid,
    },
    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, Subcommand)]
pub enum MonitorCommands {
    /// Register a new monitor
    Add {
        /// Owning user
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        name: String,
        /// http:// or https:// URL to check
        #[arg(long)]
        url: String,
    },
    /// List monitors, optionally for one owner
    List {
        #[arg(long)]
        owner: Option<Uuid>,
    },
    /// Change the name and/or URL of a monitor
    Update {
        #[arg(value_name = "UUID")]
        monitor_id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Delete a monitor and its heartbeats
    Remove {
        #[arg(value_name = "UUID")]
        monitor_id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_with_level(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO });

    let config = Config::from_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run => commands::run(&config).await,
        Commands::Sweep => commands::sweep(&config).await,
        Commands::Monitor(cmd) => commands::monitor(&config, cmd).await,
        Commands::Status { monitor_id } => commands::status(&config, monitor_id).await,
        Commands::Config(ConfigCommands::Show) => {
            print!("{config}");
            Ok(())
        }
    }
}
