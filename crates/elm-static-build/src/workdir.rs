//! The isolated directory holding every build intermediate.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use elm_static_config::{DRIVER_MODULE_NAME, PROJECT_FILE_NAME};

/// Name of the work directory under the project root.
pub const WORK_DIR_NAME: &str = ".elm-static-html";

/// File name of the compiled driver.
pub const ARTIFACT_NAME: &str = "emitter.js";

/// File name of the script that runs the compiled driver.
pub const RUNNER_NAME: &str = "runner.js";

/// File the runner writes the rendered pairs to.
pub const RESULT_NAME: &str = "rendered.json";

/// Work directory for one project.
///
/// Created or reused at the start of a run and left in place afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirectory {
    project_root: PathBuf,
    dir: PathBuf,
}

impl WorkDirectory {
    /// Describe the work directory of `project_root` without touching disk.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let dir = project_root.join(WORK_DIR_NAME);

        Self { project_root, dir }
    }

    /// Create the directory if needed. An existing directory is reused.
    pub fn create(project_root: impl Into<PathBuf>) -> io::Result<Self> {
        let work_dir = Self::new(project_root);
        fs::create_dir_all(&work_dir.dir)?;

        Ok(work_dir)
    }

    /// Project root this directory belongs to.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The directory itself.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Derived `elm.json`.
    pub fn project_file(&self) -> PathBuf {
        self.dir.join(PROJECT_FILE_NAME)
    }

    /// Generated driver source.
    pub fn driver_source(&self) -> PathBuf {
        self.dir.join(format!("{}.elm", DRIVER_MODULE_NAME))
    }

    /// Compiled driver.
    pub fn artifact(&self) -> PathBuf {
        self.dir.join(ARTIFACT_NAME)
    }

    /// Runner script.
    pub fn runner(&self) -> PathBuf {
        self.dir.join(RUNNER_NAME)
    }

    /// Rendered pairs written by the runner.
    pub fn result(&self) -> PathBuf {
        self.dir.join(RESULT_NAME)
    }
}
