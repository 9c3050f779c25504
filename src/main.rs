//! leakcheck - DNS leak and rebinding test
//!
//! Binary entry point for the leakcheck CLI application.

#![warn(clippy::all, warnings)]
#![warn(clippy::pedantic, clippy::nursery)]

use clap::CommandFactory;
use leakcheck::cli::{Cli, Commands, OutputFormat};
use leakcheck::config::{Settings, SettingsLoader};
use leakcheck::report;
use leakcheck::session::{TestMode, TestSession};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set up logging based on verbosity level.
///
/// Logs go to stderr so the report on stdout stays machine-readable.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging
/// * `quiet` - Enable error-level only logging
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

/// Load settings and apply command-line overrides.
fn load_settings(cli: &Cli) -> leakcheck::Result<Settings> {
    let mut settings = SettingsLoader::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Run the test and print the report.
///
/// # Arguments
///
/// * `settings` - Effective settings
/// * `mode` - Full or short test
/// * `format` - Output format
async fn run_test(settings: Settings, mode: TestMode, format: OutputFormat) -> leakcheck::Result<()> {
    let session = TestSession::from_settings(settings)?;
    let report = session.run(mode).await?;

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => report::render_text(&report, &mut stdout)?,
        OutputFormat::Json => report::render_json(&report, &mut stdout)?,
    }
    Ok(())
}

/// Main entry point for the leakcheck CLI application.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let (cli, verbose) = leakcheck::cli::parse_verbose();
    setup_logging(verbose, cli.quiet);

    tracing::debug!("leakcheck starting...");

    match &cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        }

        Some(Commands::Config) => {
            let settings = load_settings(&cli)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }

        Some(Commands::Run { short }) => {
            let mode = if *short { TestMode::Short } else { TestMode::Full };
            run_test(load_settings(&cli)?, mode, cli.format).await?;
        }

        None => {
            // Default to the full test
            run_test(load_settings(&cli)?, TestMode::Full, cli.format).await?;
        }
    }

    Ok(())
}
