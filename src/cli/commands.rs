//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aftctl - AWS Control Tower Account Factory for Terraform bootstrapper.
#[derive(Parser, Debug)]
#[command(name = "aftctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the deployment file.
    #[arg(short, long, global = true, env = "AFTCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a template deployment file.
    Init {
        /// Directory to initialize (defaults to current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the deployment file.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show the resources `deploy` would ensure, without calling AWS.
    Plan,

    /// Set up the AFT prerequisites in the AFT management account.
    Deploy {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Abort when an existence check fails instead of assuming absence.
        #[arg(long)]
        strict: bool,

        /// Directory where the seed files and archive are written.
        #[arg(long, default_value = ".")]
        workdir: PathBuf,
    },

    /// Show version information.
    Version,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_flags() {
        let cli = Cli::try_parse_from([
            "aftctl", "deploy", "--yes", "--strict", "--workdir", "/tmp/aft", "--output", "json",
        ])
        .unwrap();

        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Commands::Deploy {
                yes,
                strict,
                workdir,
            } => {
                assert!(yes);
                assert!(strict);
                assert_eq!(workdir, PathBuf::from("/tmp/aft"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["aftctl", "plan", "-c", "lz.yaml", "-v"]).unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("lz.yaml")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Plan));
    }

    #[test]
    fn test_init_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["aftctl", "init"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Init { ref path, force: false } if path == &PathBuf::from(".")
        ));
    }
}
