//! Roamer CLI: exploratory mobile testing from the command line
//!
//! ## Usage
//!
//! ```bash
//! roamer serve --fixture app.yaml             # JSON lines on stdin/stdout
//! roamer run --fixture app.yaml --script s.yaml --output report.txt
//! roamer tools --json                         # List tool specs
//! ```

use clap::Parser;
use roamer::tool_specs;
use roamer_cli::{
    open_explorer, run_script, serve, Cli, CliConfig, CliError, CliResult, Commands, LogFormat,
    Printer, RunArgs, Script, ServeArgs, ToolsArgs, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);
    console::set_colors_enabled(config.color.should_color());

    match cli.command {
        Commands::Serve(args) => run_serve(&args).await,
        Commands::Run(args) => run_session(&config, &args).await,
        Commands::Tools(args) => run_tools(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_log_format(cli.log_format.clone().into())
}

/// Logs go to stderr so stdout carries only payloads; `RUST_LOG` wins over flags
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color());
    let _ = match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

async fn run_serve(args: &ServeArgs) -> CliResult<()> {
    let mut explorer = open_explorer(&args.fixture, args.config.as_deref())?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve(&mut explorer, stdin, tokio::io::stdout()).await?;
    Ok(())
}

async fn run_session(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut explorer = open_explorer(&args.fixture, args.config.as_deref())?;
    let script = Script::load(&args.script)?;
    let results = run_script(&mut explorer, &script).await;

    let printer = Printer::new(config.color.should_color(), config.verbosity.is_quiet());
    for (i, result) in results.iter().enumerate() {
        printer.step(i + 1, &result.tool, &result.payload);
        if config.verbosity.is_verbose() {
            printer.status(i + 1, &result.tool, !result.is_error());
        }
    }
    let errors = results.iter().filter(|r| r.is_error()).count();
    printer.summary(results.len(), errors);

    if let (Some(path), Some(last)) = (&args.output, results.last()) {
        std::fs::write(path, &last.payload)?;
        printer.success(&format!("Wrote {}", path.display()));
    }
    if args.strict && errors > 0 {
        return Err(CliError::script(format!("{errors} step(s) returned errors")));
    }
    Ok(())
}

fn run_tools(config: &CliConfig, args: &ToolsArgs) -> CliResult<()> {
    let specs = tool_specs();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
    } else {
        Printer::new(config.color.should_color(), config.verbosity.is_quiet()).tools(&specs);
    }
    Ok(())
}
