use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod genesis;
pub mod replay;
pub mod version;

use config::{LoggingConfig, QuorumConfig};

#[derive(Parser)]
#[command(name = "quorum")]
#[command(author = "Quorum Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the quorum governance engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default configuration file
    Init {
        /// Path to config file (default: <config dir>/quorum/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print a genesis document built from the config template
    Genesis {
        /// Bond denom (overrides the config template)
        #[arg(long)]
        bond_denom: Option<String>,

        /// Path to config file (default: <config dir>/quorum/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Replay a scripted block sequence against an in-memory chain
    Replay {
        /// Path to the JSON replay script
        script: String,

        /// Path to config file (default: <config dir>/quorum/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Show version information
    Version,
}

pub fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init { config, force } => {
            let path = config
                .map(PathBuf::from)
                .unwrap_or_else(config::default_config_path);
            if path.exists() && !force {
                return Err(format!(
                    "Config file '{}' already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            QuorumConfig::create_default(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Genesis { bond_denom, config } => {
            let config = QuorumConfig::load_or_default(config.as_deref())?;
            init_logging(&config.logging)?;
            genesis::execute(&config, bond_denom)
        }
        Commands::Replay { script, config } => {
            let config = QuorumConfig::load_or_default(config.as_deref())?;
            init_logging(&config.logging)?;
            replay::execute(&config, &script)
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level. Logs go to stderr unless a file is configured, so
/// stdout stays machine-readable.
fn init_logging(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| format!("Invalid log level '{}': {}", logging.level, e))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file '{}': {}", path.display(), e))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| format!("Failed to initialize logging: {}", e).into())
}
