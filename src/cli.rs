//! Command-line interface (CLI) argument parsing module.
//!
//! This module provides CLI argument parsing using `clap`.
//! It supports running the full or short test, printing the effective
//! settings, and generating shell completions.

use crate::config::Settings;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI argument parser using clap derive macro.
///
/// # Example
///
/// ```ignore
/// let cli = Cli::parse();
/// match cli.command {
///     Some(Commands::Run { short }) => { /* ... */ }
///     Some(Commands::Config) => { /* ... */ }
///     None => { /* full test */ }
/// }
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "leakcheck",
    version,
    about = "DNS leak and DNS rebinding test",
    long_about = "Probes server-assigned subdomains to detect DNS leaks (e.g. around a VPN) \
                  and resolvers vulnerable to DNS rebinding",
    infer_subcommands = true
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Settings file (JSON); defaults to the per-user config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the test-coordination service
    #[arg(long, global = true, env = "LEAKCHECK_API_URL")]
    pub api_url: Option<String>,

    /// Maximum number of probes in flight
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_url {
            settings.api_base_url.clone_from(url);
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
    }
}

/// Output format for the test report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get all available output format names.
    #[must_use]
    pub fn names() -> &'static [&'static str] {
        &["text", "json"]
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options are: {:?}",
                s,
                Self::names()
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Available commands for the leakcheck CLI.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the DNS leak test (default)
    ///
    /// The full test probes the subdomains twice: once up front and then
    /// repeatedly during a wait window, to catch resolvers that rebind.
    #[command(alias = "r")]
    Run {
        /// Run the short test (leak only, no rebinding check)
        #[arg(short, long)]
        short: bool,
    },

    /// Print the effective settings as JSON
    #[command(alias = "c")]
    Config,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Parse CLI arguments and return verbose flag.
///
/// # Returns
///
/// Returns a tuple of `(Cli, verbose)` where `verbose` indicates
/// whether verbose logging was enabled.
#[must_use]
pub fn parse_verbose() -> (Cli, bool) {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    (cli, verbose)
}
