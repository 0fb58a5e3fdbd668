//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Roamer: exploratory mobile testing with coverage gap analysis
#[derive(Parser, Debug)]
#[command(name = "roamer")]
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

    /// Log format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the exploration tools over stdin/stdout, one JSON request per line
    Serve(ServeArgs),

    /// Run a scripted sequence of tool calls
    Run(RunArgs),

    /// List the available tools
    Tools(ToolsArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Device fixture (YAML)
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Explorer configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Device fixture (YAML)
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Script of tool calls (YAML)
    #[arg(short, long)]
    pub script: PathBuf,

    /// Write the final payload to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Explorer configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit with failure if any step returns an error payload
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the tools command
#[derive(Parser, Debug)]
pub struct ToolsArgs {
    /// Print the tool specs as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
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

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
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
