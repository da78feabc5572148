mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::io::IsTerminal;
use std::process;

use clap::Parser;
use colored::*;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, OutputFormat},
    commands::CommandExecutor,
    config::AppConfig,
    error::hint_for,
    output::{OutputManager, use_color},
};

const DEFAULT_LOG_FILTER: &str = "insight=info,interview_client=info";

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let format = args.output;
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        debug!(error = ?e, "Command failed");
        let hint = hint_for(&e);

        match format {
            OutputFormat::Json => {
                let error_json = serde_json::json!({
                    "status": "error",
                    "message": format!("{e:#}"),
                    "hint": hint,
                });
                println!("{error_json}");
            }
            OutputFormat::Pretty => {
                if !std::io::stderr().is_terminal() {
                    colored::control::set_override(false);
                }
                eprintln!("{} {e:#}", "Error:".red().bold());
                if let Some(hint) = hint {
                    eprintln!("{}", hint.yellow());
                }
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    debug!(?config, "Configuration loaded");

    let colored = use_color(args.output, std::io::stdout().is_terminal());
    let output = OutputManager::new(args.output, colored);
    let mut executor = CommandExecutor::new(&config, args.base_url.as_deref(), output).await?;
    let result = executor.execute(args.command).await;
    executor.log_session_events();
    result
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("insight=debug,interview_client=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .init();
}
