//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shutterbox: photo-kiosk sessions and souvenir strips, loops and videos
#[derive(Parser, Debug)]
#[command(name = "shutterbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Kiosk configuration file (YAML)
    #[arg(short, long, global = true, env = "SHUTTERBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List capture devices and the default selection
    Devices(DevicesArgs),

    /// Run one kiosk session and write its artifacts
    Run(RunArgs),

    /// Render a strip and loop animation from six still images
    Export(ExportArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

/// Arguments for the devices command
#[derive(Parser, Debug)]
pub struct DevicesArgs {
    /// Simulated device labels (repeatable)
    #[arg(
        long = "device",
        value_name = "LABEL",
        default_values_t = default_device_labels()
    )]
    pub devices: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Entry token of the guest
    pub token: String,

    /// Directory the artifacts are written to
    #[arg(short, long, default_value = "shutterbox-out")]
    pub output: PathBuf,

    /// Trigger and accept every shot without operator input
    #[arg(long)]
    pub unattended: bool,

    /// Directory of PNG strip backgrounds
    #[arg(long, value_name = "DIR")]
    pub backgrounds: Option<PathBuf>,

    /// Index of the strip background
    #[arg(long, default_value_t = 0)]
    pub background: usize,

    /// Simulated device labels (repeatable)
    #[arg(
        long = "device",
        value_name = "LABEL",
        default_values_t = default_device_labels()
    )]
    pub devices: Vec<String>,

    /// Device id to stream from instead of the default selection
    #[arg(long, value_name = "ID")]
    pub select: Option<String>,

    /// PNG drawn over every loop animation frame
    #[arg(long, value_name = "PNG")]
    pub loop_frame: Option<PathBuf>,
}

/// Arguments for the export command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Six still images in slot order
    #[arg(required = true, num_args = 6, value_name = "STILL")]
    pub stills: Vec<PathBuf>,

    /// Directory the artifacts are written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Name used for the output files
    #[arg(long, default_value = "photo-strip")]
    pub session: String,

    /// Directory of PNG strip backgrounds
    #[arg(long, value_name = "DIR")]
    pub backgrounds: Option<PathBuf>,

    /// Index of the strip background
    #[arg(long, default_value_t = 0)]
    pub background: usize,

    /// Plain white grid instead of the framed strip
    #[arg(long, value_name = "ORIENTATION")]
    pub plain: Option<OrientationArg>,

    /// PNG drawn over every loop animation frame
    #[arg(long, value_name = "PNG")]
    pub loop_frame: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print the built-in defaults instead of the effective configuration
    #[arg(long)]
    pub defaults: bool,

    /// Only validate the configuration
    #[arg(long)]
    pub check: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON lines
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Listing format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable table
    #[default]
    Text,
    /// JSON document
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Plain strip orientation
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OrientationArg {
    /// Two columns, three rows
    #[value(name = "2x3")]
    TwoByThree,
    /// Three columns, two rows
    #[value(name = "3x2")]
    ThreeByTwo,
}

impl From<OrientationArg> for shutterbox::export::StripOrientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::TwoByThree => Self::Columns2Rows3,
            OrientationArg::ThreeByTwo => Self::Columns3Rows2,
        }
    }
}

fn default_device_labels() -> Vec<String> {
    vec!["OBS Virtual Camera".to_string(), "Built-in Camera".to_string()]
}
