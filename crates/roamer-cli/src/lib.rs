//! Roamer CLI Library
//!
//! Command-line front end for the Roamer exploration engine: a stdio tool
//! server, a scripted session runner and a tool listing.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod script;
mod session;

pub use commands::{Cli, ColorArg, Commands, LogFormatArg, RunArgs, ServeArgs, ToolsArgs};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{is_error_payload, status_line, Printer};
pub use script::{run_script, Script, ScriptStep, StepResult};
pub use session::{open_explorer, respond, serve, TextContent, ToolRequest, ToolResponse, LIST_TOOLS};
