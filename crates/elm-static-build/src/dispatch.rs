//! Routing rendered HTML to files and standard output.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use elm_static_config::Destination;

use crate::runtime::RenderedOutput;

/// What to do about unsafe destinations and failed writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Write anywhere; log failed writes and carry on
    #[default]
    Lenient,

    /// Refuse destinations outside the project root; stop at the first failed write
    Strict,
}

/// Errors surfaced by dispatch under [`WritePolicy::Strict`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Refusing to write outside the project root: {0}")]
    UnsafePath(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write to stdout: {0}")]
    Stdout(#[source] io::Error),
}

/// Counts of what dispatch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// File writes that succeeded
    pub files: usize,

    /// Strings printed to stdout
    pub printed: usize,

    /// Writes that failed and were skipped
    pub failed: usize,
}

/// Writes rendered outputs in order.
pub struct Dispatcher<W: Write> {
    root: PathBuf,
    policy: WritePolicy,
    stdout: W,
}

impl<W: Write> Dispatcher<W> {
    /// Create a dispatcher resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>, policy: WritePolicy, stdout: W) -> Self {
        Self {
            root: root.into(),
            policy,
            stdout,
        }
    }

    /// Write every output. Later writes to the same file replace earlier ones.
    pub fn dispatch(&mut self, outputs: &[RenderedOutput]) -> Result<DispatchSummary, DispatchError> {
        if self.policy == WritePolicy::Strict {
            check_destinations(outputs)?;
        }

        let mut summary = DispatchSummary::default();

        for output in outputs {
            let result = match &output.destination {
                Destination::Stdout => {
                    tracing::debug!("Printing {} bytes to stdout", output.html.len());
                    self.print(&output.html).map(|()| summary.printed += 1)
                }
                Destination::File(path) => {
                    tracing::debug!("Saving to {}", path.display());
                    self.write_file(path, &output.html).map(|()| summary.files += 1)
                }
            };

            if let Err(e) = result {
                if self.policy == WritePolicy::Strict {
                    return Err(e);
                }
                tracing::error!("{}", e);
                summary.failed += 1;
            }
        }

        if let Err(e) = self.stdout.flush() {
            let e = DispatchError::Stdout(e);
            if self.policy == WritePolicy::Strict {
                return Err(e);
            }
            tracing::error!("{}", e);
            summary.failed += 1;
        }

        Ok(summary)
    }

    /// Give back the stdout writer.
    pub fn into_inner(self) -> W {
        self.stdout
    }

    fn print(&mut self, html: &str) -> Result<(), DispatchError> {
        writeln!(self.stdout, "{}", html).map_err(DispatchError::Stdout)
    }

    fn write_file(&self, path: &Path, html: &str) -> Result<(), DispatchError> {
        let target = self.root.join(path);
        let to_error = |source: io::Error| DispatchError::Write {
            path: target.display().to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }

        fs::write(&target, format!("{}\n", html)).map_err(to_error)
    }
}

/// Reject absolute destinations and ones that climb out with `..`.
pub fn check_destinations(outputs: &[RenderedOutput]) -> Result<(), DispatchError> {
    for path in outputs.iter().filter_map(|o| o.destination.as_path()) {
        if !is_contained(path) {
            return Err(DispatchError::UnsafePath(path.to_path_buf()));
        }
    }

    Ok(())
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
