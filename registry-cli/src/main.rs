//! Main entry point for the clinic registry CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::ClientConfig;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt};
use url::Url;

mod commands;

use commands::{
    Context, patients::PatientsCommand, profile::ProfileCommand, session::SessionCommand,
    users::UsersCommand,
};

/// Clinic registry CLI
#[derive(Parser)]
#[command(name = "registry", version)]
#[command(about = "Command-line client for the clinic patient registry", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., registry.yaml or registry.json). If not provided, defaults and REGISTRY_* variables are used."
    )]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(
        long,
        global = true,
        help = "Override the API base URL (e.g., http://localhost:3000/api/v1)"
    )]
    api_url: Option<Url>,

    /// Print JSON instead of tables
    #[arg(long, global = true, help = "Print raw JSON instead of formatted output")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the clinic registry CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in, register, inspect, refresh, or end the stored session
    #[command(subcommand)]
    Session(SessionCommand),

    /// Change your name, email, avatar, or password
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// List, search, and manage patient records
    #[command(subcommand)]
    Patients(PatientsCommand),

    /// Show patient totals and aggregates
    Stats,

    /// Show registrations per day of a month
    Calendar {
        /// Month number (1-12)
        #[arg(long, short, help = "Month number (1-12). Defaults to the current month.")]
        month: Option<u32>,

        /// Year
        #[arg(long, short, help = "Year (e.g., 2025). Defaults to the current year.")]
        year: Option<i32>,

        /// Last month of a range starting at --month
        #[arg(
            long,
            requires = "month",
            help = "Show every month from --month through this month number"
        )]
        until: Option<u32>,
    },

    /// Show recent registrations, totals, and the month's calendar
    Dashboard {
        /// Month number (1-12)
        #[arg(long, short, help = "Month number (1-12). Defaults to the current month.")]
        month: Option<u32>,

        /// Year
        #[arg(long, short, help = "Year (e.g., 2025). Defaults to the current year.")]
        year: Option<i32>,
    },

    /// Manage accounts (administrators only)
    #[command(subcommand)]
    Users(UsersCommand),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: clap_complete::Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,

        /// Where to write the file
        #[arg(long, short, help = "Output path. Defaults to registry.yaml or registry.json.")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(*shell);
            return Ok(());
        }
        Commands::Config { format, output } => {
            commands::config::generate_config(format.as_deref().unwrap_or("yaml"), output.as_deref())?;
            return Ok(());
        }
        _ => {}
    }

    let config = ClientConfig::load_config(cli.config, cli.api_url)?;
    initialize_tracing(&config);
    let ctx = Context::open(&config, cli.json)?;

    match cli.command {
        Commands::Session(command) => commands::session::run(&ctx, command).await,
        Commands::Profile(command) => commands::profile::run(&ctx, command).await,
        Commands::Patients(command) => commands::patients::run(&ctx, command).await,
        Commands::Stats => commands::overview::statistics(&ctx).await,
        Commands::Calendar { month, year, until } => {
            commands::overview::calendar(&ctx, month, year, until).await
        }
        Commands::Dashboard { month, year } => {
            commands::overview::dashboard(&ctx, month, year).await
        }
        Commands::Users(command) => commands::users::run(&ctx, command).await,
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr so command output stays pipeable.
fn initialize_tracing(config: &ClientConfig) {
    fmt::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_env_filter(config: &ClientConfig) -> EnvFilter {
    let default_level = config
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::WARN);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}
