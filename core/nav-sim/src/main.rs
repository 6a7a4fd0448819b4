//! nav-sim: drives the HealthChat navigation core from the command line.
//!
//! ## Subcommands
//!
//! - `replay`: Replays a JSON-lines signal script, printing a snapshot per step
//! - `parse-notification`: Resolves a notification payload (stdin) to a deep link
//! - `check-config`: Loads and prints the navigation config

mod error;
mod inspect;
mod logging;
mod replay;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nav-sim")]
#[command(about = "HealthChat navigation simulator")]
#[command(version)]
struct Cli {
    /// Also write logs to a daily rolling file in this directory
    /// (defaults to the platform data directory when given without a value)
    #[arg(long, value_name = "DIR", num_args = 0..=1, global = true)]
    log_dir: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a signal script (one JSON object per line)
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Start with a restored signed-in session
        #[arg(long)]
        logged_in: bool,

        /// Config file (defaults to the platform config directory)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Resolve a notification payload read from stdin
    ParseNotification,

    /// Load the navigation config and print the effective values
    CheckConfig {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let log_dir = cli
        .log_dir
        .and_then(|dir| dir.or_else(logging::default_log_dir));
    let _logging_guard = logging::init(log_dir.as_deref());

    let result = match cli.command {
        Commands::Replay {
            script,
            logged_in,
            config,
        } => nav_core::load_config(config)
            .map_err(error::SimError::from)
            .and_then(|config| replay::run(&script, config, logged_in))
            .map(|_| ()),
        Commands::ParseNotification => inspect::parse_notification(),
        Commands::CheckConfig { path } => inspect::check_config(path),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "nav-sim failed");
        std::process::exit(1);
    }
}
