//! Running the patched artifact to completion.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use elm_static_codegen::OUTPUT_PORT;
use elm_static_config::{Destination, DRIVER_MODULE_NAME};

use crate::workdir::{WorkDirectory, ARTIFACT_NAME, RESULT_NAME};

/// One rendered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    /// Where the HTML goes
    pub destination: Destination,

    /// Rendered HTML, or a decode error description
    pub html: String,
}

impl RenderedOutput {
    /// Pair a destination with its HTML.
    pub fn new(destination: Destination, html: impl Into<String>) -> Self {
        Self {
            destination,
            html: html.into(),
        }
    }
}

/// Errors that can occur while running the artifact.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to write runner script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for the renderer: {0}")]
    Wait(#[source] io::Error),

    #[error("Renderer exited with code {0}")]
    Exited(i32),

    #[error("Failed to access renderer output {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Renderer produced no output")]
    NoOutput,

    #[error("Failed to decode renderer output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A started artifact that produces its whole result once.
#[async_trait]
pub trait RunUnit: Send {
    /// Wait for the artifact to finish and collect every rendered job, in order.
    async fn await_result(self: Box<Self>) -> Result<Vec<RenderedOutput>, RunError>;
}

/// Loads the compiled artifact of a work directory.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Start the artifact in `work_dir`.
    async fn start(&self, work_dir: &WorkDirectory) -> Result<Box<dyn RunUnit>, RunError>;
}

/// Runs the artifact under Node.js.
///
/// The runner writes the port's message to [`RESULT_NAME`] in the work
/// directory. Anything the program prints itself goes to stderr.
#[derive(Debug, Clone)]
pub struct NodeRuntime {
    program: PathBuf,
}

impl NodeRuntime {
    /// Use the given `node` executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NodeRuntime {
    fn default() -> Self {
        Self::new("node")
    }
}

#[async_trait]
impl Runtime for NodeRuntime {
    async fn start(&self, work_dir: &WorkDirectory) -> Result<Box<dyn RunUnit>, RunError> {
        let result = work_dir.result();
        match fs::remove_file(&result) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                return Err(RunError::Output {
                    path: result.display().to_string(),
                    source: e,
                });
            }
            _ => {}
        }

        let script = work_dir.runner();
        fs::write(&script, runner_script()).map_err(|source| RunError::Script {
            path: script.display().to_string(),
            source,
        })?;

        tracing::debug!("Running {} {}", self.program.display(), script.display());

        let child = Command::new(&self.program)
            .arg(&script)
            .current_dir(work_dir.path())
            .stdin(Stdio::null())
            .stdout(io::stderr())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        Ok(Box::new(NodeUnit { child, result }))
    }
}

struct NodeUnit {
    child: Child,
    result: PathBuf,
}

#[async_trait]
impl RunUnit for NodeUnit {
    async fn await_result(self: Box<Self>) -> Result<Vec<RenderedOutput>, RunError> {
        let NodeUnit { mut child, result } = *self;
        let status = child.wait().await.map_err(RunError::Wait)?;

        if !status.success() {
            return Err(RunError::Exited(status.code().unwrap_or(-1)));
        }

        let bytes = match tokio::fs::read(&result).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(RunError::NoOutput),
            Err(e) => {
                return Err(RunError::Output {
                    path: result.display().to_string(),
                    source: e,
                })
            }
        };

        decode_output(&bytes)
    }
}

/// Decode the `[[destination, html], ...]` document the runner writes.
pub fn decode_output(bytes: &[u8]) -> Result<Vec<RenderedOutput>, RunError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(RunError::NoOutput);
    }

    let pairs: Vec<(String, String)> = serde_json::from_slice(bytes)?;

    Ok(pairs
        .into_iter()
        .map(|(destination, html)| RenderedOutput::new(Destination::parse(&destination), html))
        .collect())
}

/// Script that loads the artifact and saves the port's single message as JSON.
fn runner_script() -> String {
    format!(
        r#"const fs = require('fs');
const path = require('path');
const {{ Elm }} = require('./{artifact}');

const app = Elm.{module}.init();

app.ports.{port}.subscribe(function (pairs) {{
    fs.writeFileSync(path.join(__dirname, '{result}'), JSON.stringify(pairs));
}});
"#,
        artifact = ARTIFACT_NAME,
        module = DRIVER_MODULE_NAME,
        port = OUTPUT_PORT,
        result = RESULT_NAME,
    )
}
