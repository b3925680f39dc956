//! Shutterbox CLI library
//!
//! Command definitions, handlers and terminal output for the `shutterbox`
//! binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, DevicesArgs, ExportArgs, FormatArg, LogFormatArg,
    OrientationArg, RunArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{describe, OutputFormat, ProgressReporter};
