//! vmon - Command-line monitor and query runner
//!
//! This is the main entry point for the vmon application.

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

/// Monitor a database server and run SQL through its JSON API
#[derive(Parser)]
#[command(name = "vmon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection settings file (defaults to ~/.config/vmon/connection.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server HTTP port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// User name
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Password (sent hashed unless the settings disable it)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Send requests with the admin flag
    #[arg(long, global = true)]
    admin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a procedure and print its result tables
    Call {
        /// Procedure name, e.g. @Statistics or Statistics
        procedure: String,

        /// Positional parameters
        #[arg(allow_hyphen_values = true)]
        params: Vec<String>,
    },

    /// Refresh the dashboard once and print a summary
    Dashboard {
        /// Keep going when one of the dashboard calls fails
        #[arg(long)]
        continue_on_failure: bool,
    },

    /// Run a SQL script (use - for stdin)
    Sql {
        /// Script file
        file: String,

        /// Keep going after a failing statement
        #[arg(long)]
        continue_on_failure: bool,
    },

    /// List system and user procedures with their parameter types
    Procedures,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command; `Ok(false)` means the calls reported failure
fn run(cli: Cli) -> Result<bool> {
    let settings = commands::load_settings(&cli)?;
    let client = volt::Client::with_timeouts(settings.to_endpoint(), settings.timeouts());
    info!("Using {}", client.endpoint().key());

    match cli.command {
        Commands::Call { procedure, params } => Ok(commands::call(&client, &procedure, &params)),
        Commands::Dashboard {
            continue_on_failure,
        } => commands::dashboard(&client, continue_on_failure),
        Commands::Sql {
            file,
            continue_on_failure,
        } => commands::sql(&client, &file, continue_on_failure),
        Commands::Procedures => Ok(commands::procedures(&client)),
    }
}
