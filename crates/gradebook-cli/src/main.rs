//! gradebook CLI: replays request scripts against an in-memory gradebook.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use gradebook_service::config::load_config_from;

mod commands;

#[derive(Parser)]
#[command(
    name = "gradebook",
    version,
    about = "Role-gated student, test and result records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a request script against a fresh gradebook
    Run {
        /// Path to the .toml script
        #[arg(long)]
        script: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format for the step table
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Directory to save the JSON report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit code 1 if any step misses its expect_status
        #[arg(long)]
        fail_on_mismatch: bool,
    },

    /// Validate a script without running it
    Validate {
        /// Path to the .toml script
        #[arg(long)]
        script: PathBuf,
    },

    /// List configured users and what their roles may change
    Users {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example script
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            script,
            config,
            format,
            output,
            fail_on_mismatch,
        } => {
            let config = load_config_from(config.as_deref())?;
            init_tracing(&config.log_filter);
            commands::run::execute(config, script, format, output, fail_on_mismatch).await
        }
        Commands::Validate { script } => {
            init_tracing("warn");
            commands::validate::execute(script)
        }
        Commands::Users { config } => {
            let config = load_config_from(config.as_deref())?;
            init_tracing(&config.log_filter);
            commands::users::execute(&config)
        }
        Commands::Init => {
            init_tracing("warn");
            commands::init::execute()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
