//! CLI module for Rudder
//!
//! Command-line interface definitions and handlers for the steering daemon.
//!
//! # Commands
//!
//! - `run` - Start the steering daemon
//! - `probe` - Discover and probe all groups once, without touching routing
//! - `status` - Query a running daemon's status endpoint
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start the daemon with the default config
//! rudder run
//!
//! # Dry measurement pass against one group
//! rudder probe --group cluster1
//!
//! # Generate shell completions
//! rudder completions bash > ~/.bash_completion.d/rudder
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod probe;
pub mod run;
pub mod status;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rudder - dynamic load-balancer steering daemon
#[derive(Parser, Debug)]
#[command(
    name = "rudder",
    version,
    about = "Steers load balancer routing toward the best worker per group"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the steering daemon
    Run(RunArgs),
    /// Discover and probe all groups once; no routing mutations
    Probe(ProbeArgs),
    /// Show a running daemon's status
    Status(StatusArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rudder.toml")]
    pub config: PathBuf,

    /// Override operational API port
    #[arg(short, long, env = "RUDDER_PORT")]
    pub port: Option<u16>,

    /// Override operational API host
    #[arg(short = 'H', long, env = "RUDDER_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUDDER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override probe interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rudder.toml")]
    pub config: PathBuf,

    /// Only probe this group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Base URL of a running daemon's operational API
    #[arg(short, long, default_value = "http://127.0.0.1:9090", env = "RUDDER_ENDPOINT")]
    pub endpoint: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "rudder.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["rudder", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("rudder.toml"));
                assert!(args.port.is_none());
                assert!(args.interval.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_port() {
        let cli = Cli::try_parse_from(["rudder", "run", "-p", "9000"]).unwrap();
        match cli.command {
            Commands::Run(args) => assert_eq!(args.port, Some(9000)),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_interval() {
        let cli = Cli::try_parse_from(["rudder", "run", "--interval", "10"]).unwrap();
        match cli.command {
            Commands::Run(args) => assert_eq!(args.interval, Some(10)),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_probe_with_group() {
        let cli = Cli::try_parse_from(["rudder", "probe", "--group", "cluster1"]).unwrap();
        match cli.command {
            Commands::Probe(args) => assert_eq!(args.group.as_deref(), Some("cluster1")),
            _ => panic!("Expected Probe command"),
        }
    }

    #[test]
    fn test_cli_parse_probe_json() {
        let cli = Cli::try_parse_from(["rudder", "probe", "--json"]).unwrap();
        match cli.command {
            Commands::Probe(args) => assert!(args.json),
            _ => panic!("Expected Probe command"),
        }
    }

    #[test]
    fn test_cli_parse_status_defaults() {
        let cli = Cli::try_parse_from(["rudder", "status"]).unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.endpoint, "http://127.0.0.1:9090");
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::try_parse_from(["rudder", "config", "init", "-o", "custom.toml"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert_eq!(args.output, PathBuf::from("custom.toml"));
                assert!(!args.force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
