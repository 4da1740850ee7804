//! elm-static-html CLI - render Elm views to static HTML.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "elm-static-html")]
#[command(about = "Render Elm views to static HTML")]
#[command(version)]
pub struct Cli {
    /// Provide an Elm file to compile to HTML
    #[arg(short, long)]
    filename: Option<PathBuf>,

    /// Write to a particular file. Defaults to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Be more chatty
    #[arg(short, long, env = "ELM_STATIC_HTML_VERBOSE")]
    verbose: bool,

    /// Provide a json file for use as config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate an example elm-static-html.json
    #[arg(long)]
    init_config: bool,

    /// Elm compiler executable
    #[arg(long, env = "ELM_STATIC_HTML_ELM", default_value = "elm")]
    elm: PathBuf,

    /// Node.js executable used to run the compiled views
    #[arg(long, env = "ELM_STATIC_HTML_NODE", default_value = "node")]
    node: PathBuf,

    /// Refuse outputs outside the project and stop on the first failed write
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries rendered HTML
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        commands::init::run()?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.config.is_none() && cli.filename.is_none() {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    }

    commands::build::run(cli).await
}
