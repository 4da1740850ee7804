//! Compiler invocation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

/// Exit code reported when the compiler is killed by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Where and how to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Directory the compiler runs in
    pub cwd: PathBuf,

    /// Output artifact, relative to `cwd`
    pub output: PathBuf,
}

/// Errors that prevent the compiler from running at all.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a driver program into a runnable artifact.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `entry` once and return the compiler's exit code.
    ///
    /// Diagnostics are the compiler's own business; only the code is reported.
    async fn compile(&self, entry: &Path, options: &CompileOptions) -> Result<i32, CompilerError>;
}

/// `elm make` driven as a child process.
#[derive(Debug, Clone)]
pub struct ElmCompiler {
    program: PathBuf,
}

impl ElmCompiler {
    /// Use the given `elm` executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, entry: &Path, options: &CompileOptions) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("make")
            .arg(entry)
            .arg("--output")
            .arg(&options.output)
            .current_dir(&options.cwd);
        command
    }
}

impl Default for ElmCompiler {
    fn default() -> Self {
        Self::new("elm")
    }
}

#[async_trait]
impl Compiler for ElmCompiler {
    async fn compile(&self, entry: &Path, options: &CompileOptions) -> Result<i32, CompilerError> {
        tracing::debug!(
            "Running {} make {} in {}",
            self.program.display(),
            entry.display(),
            options.cwd.display()
        );

        let status = self
            .command(entry, options)
            .status()
            .await
            .map_err(|source| CompilerError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        Ok(status.code().unwrap_or(SIGNAL_EXIT_CODE))
    }
}
