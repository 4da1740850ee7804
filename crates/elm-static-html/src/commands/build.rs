//! Render the configured views.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use elm_static_build::{
    BuildError, BuildOptions, ElmCompiler, NodeRuntime, StaticBuilder, WritePolicy,
};
use elm_static_config::BuildConfig;

use crate::Cli;

/// Load configuration from the file given with `--config`.
fn load_config(path: &Path) -> Result<BuildConfig> {
    tracing::debug!("Using the config file {}", path.display());

    BuildConfig::load(path).with_context(|| {
        format!(
            "Failed to load config file {}! You can make an initial config through --init-config",
            path.display()
        )
    })
}

/// Run the build.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match (&cli.config, &cli.filename) {
        (Some(path), _) => load_config(path)?,
        (None, Some(filename)) => {
            tracing::debug!("Loading file {}", filename.display());
            if cli.output.is_none() {
                tracing::debug!("Outputting to stdout");
            }
            BuildConfig::single(filename, cli.output.clone())
        }
        (None, None) => anyhow::bail!("Either --filename or --config is required"),
    };

    let project_root = std::env::current_dir().context("Failed to read current directory")?;

    let options = BuildOptions {
        write_policy: if cli.strict {
            WritePolicy::Strict
        } else {
            WritePolicy::Lenient
        },
        ..BuildOptions::new(project_root)
    };

    let builder = StaticBuilder::with_toolchain(
        options,
        Box::new(ElmCompiler::new(&cli.elm)),
        Box::new(NodeRuntime::new(&cli.node)),
    );

    match builder.build(&config).await {
        Ok(result) => {
            tracing::debug!(
                "Rendered {} jobs from {} modules in {}ms",
                result.jobs,
                result.modules,
                result.duration_ms
            );
            if result.dispatch.failed > 0 {
                tracing::warn!("{} outputs could not be written", result.dispatch.failed);
            }
            tracing::debug!("Done!");
            Ok(ExitCode::SUCCESS)
        }
        Err(BuildError::CompilerFailed { code }) => {
            tracing::error!("Exited with the code {}", code);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
