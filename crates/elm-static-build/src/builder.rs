//! Build pipeline: discover modules, synthesize, compile, patch, run, dispatch.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use elm_static_codegen::{patch_file, CodegenError, DriverSynthesizer, FormatOptions};
use elm_static_config::{collect_modules, BuildConfig, ProjectDescriptor, ProjectError};

use crate::compiler::{CompileOptions, Compiler, CompilerError, ElmCompiler};
use crate::dispatch::{DispatchError, DispatchSummary, Dispatcher, WritePolicy};
use crate::runtime::{NodeRuntime, RunError, Runtime};
use crate::workdir::{WorkDirectory, ARTIFACT_NAME, WORK_DIR_NAME};

/// Options for a build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory holding `elm.json`; relative outputs resolve against it
    pub project_root: PathBuf,

    /// Handling of unsafe destinations and failed writes
    pub write_policy: WritePolicy,

    /// HTML formatting used by the driver
    pub format: FormatOptions,
}

impl BuildOptions {
    /// Default options for a project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            write_policy: WritePolicy::default(),
            format: FormatOptions::default(),
        }
    }
}

/// Result of a build.
#[derive(Debug)]
pub struct BuildResult {
    /// Modules that made it into the driver
    pub modules: usize,

    /// Jobs the driver rendered
    pub jobs: usize,

    /// What dispatch wrote
    pub dispatch: DispatchSummary,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Work directory holding the intermediates
    pub work_dir: PathBuf,
}

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Failed to prepare work directory {path}: {source}")]
    WorkDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error("Compiler exited with code {code}")]
    CompilerFailed { code: i32 },

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Runs the whole pipeline once.
pub struct StaticBuilder {
    options: BuildOptions,
    synthesizer: DriverSynthesizer,
    compiler: Box<dyn Compiler>,
    runtime: Box<dyn Runtime>,
}

impl StaticBuilder {
    /// Create a builder using `elm` and `node` from `PATH`.
    pub fn new(options: BuildOptions) -> Self {
        Self::with_toolchain(
            options,
            Box::new(ElmCompiler::default()),
            Box::new(NodeRuntime::default()),
        )
    }

    /// Create a builder with a specific compiler and runtime.
    pub fn with_toolchain(
        options: BuildOptions,
        compiler: Box<dyn Compiler>,
        runtime: Box<dyn Runtime>,
    ) -> Self {
        let synthesizer = DriverSynthesizer::with_options(options.format);

        Self {
            options,
            synthesizer,
            compiler,
            runtime,
        }
    }

    /// Build, printing stdout outputs to the process's standard output.
    pub async fn build(&self, config: &BuildConfig) -> Result<BuildResult, BuildError> {
        let mut stdout = io::stdout();
        self.build_into(config, &mut stdout).await
    }

    /// Build, printing stdout outputs to `stdout`.
    pub async fn build_into<W: Write>(
        &self,
        config: &BuildConfig,
        stdout: &mut W,
    ) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let root = &self.options.project_root;

        config.warn_duplicate_destinations();

        let modules = collect_modules(root, config);
        let jobs: usize = modules.iter().map(|m| m.jobs.len()).sum();
        if modules.is_empty() {
            tracing::warn!("No usable modules found; the driver will render nothing");
        }

        let project = ProjectDescriptor::load(root)?;

        let work_dir = WorkDirectory::create(root).map_err(|source| BuildError::WorkDir {
            path: root.join(WORK_DIR_NAME).display().to_string(),
            source,
        })?;

        project
            .for_work_dir(root)
            .write(&work_dir.project_file())?;

        let driver = self.synthesizer.synthesize(&modules)?;
        let driver_path = work_dir.driver_source();
        fs::write(&driver_path, driver).map_err(|source| BuildError::WorkDir {
            path: driver_path.display().to_string(),
            source,
        })?;
        tracing::debug!("Wrote driver files to {}", work_dir.path().display());

        let options = CompileOptions {
            cwd: work_dir.path().to_path_buf(),
            output: PathBuf::from(ARTIFACT_NAME),
        };
        let code = self.compiler.compile(&driver_path, &options).await?;
        if code != 0 {
            return Err(BuildError::CompilerFailed { code });
        }

        patch_file(&work_dir.artifact())?;

        let unit = self.runtime.start(&work_dir).await?;
        let outputs = unit.await_result().await?;
        tracing::debug!("Renderer produced {} outputs", outputs.len());

        let mut dispatcher = Dispatcher::new(root.clone(), self.options.write_policy, stdout);
        let dispatch = dispatcher.dispatch(&outputs)?;

        Ok(BuildResult {
            modules: modules.len(),
            jobs,
            dispatch,
            duration_ms: start.elapsed().as_millis() as u64,
            work_dir: work_dir.path().to_path_buf(),
        })
    }
}
