//! Shutterbox CLI: photo-kiosk runner and offline exporter
//!
//! ## Usage
//!
//! ```bash
//! shutterbox devices                        # List cameras
//! shutterbox run GUEST-42 --unattended      # Shoot six photos and export
//! shutterbox export a.png b.png ... f.png   # Strip and GIF from stills
//! shutterbox config                         # Effective YAML configuration
//! ```

use clap::Parser;
use shutterbox::config::BoothConfig;
use shutterbox_cli::{handlers, logging, Cli, CliConfig, CliError, CliResult, Commands, Verbosity};
use std::process::ExitCode;
use std::time::Duration;

/// Grace period for blocked stdin reads at shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init_logging(&config)?;
    let booth = load_booth_config(&cli)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("failed to start runtime: {e}")))?;
    let command = cli.command;
    let result = runtime.block_on(async move {
        match command {
            Commands::Devices(args) => handlers::execute_devices(&booth.capture, &args).await,
            Commands::Run(args) => handlers::execute_run(&config, booth, &args).await,
            Commands::Export(args) => {
                handlers::execute_export(&config, booth.export, &args).await
            }
            Commands::Config(args) => handlers::execute_config(&booth, &args),
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(cli.log_format.into())
}

fn load_booth_config(cli: &Cli) -> CliResult<BoothConfig> {
    match cli.config {
        Some(ref path) => BoothConfig::from_file(path)
            .map_err(|e| CliError::config(format!("{}: {e}", path.display()))),
        None => Ok(BoothConfig::default()),
    }
}
