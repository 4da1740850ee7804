//! Render job configuration and Elm module discovery.
//!
//! Turns the loosely shaped `elm-static-html.json` document (or a single
//! file/output pair from the command line) into an ordered list of render
//! jobs, and reads each source file's module declaration.

pub mod config;
pub mod job;
pub mod module;
pub mod project;

pub use config::{starter_config, BuildConfig, ConfigError, FileJobs, CONFIG_FILE_NAME};
pub use job::{
    normalize, try_normalize, Destination, JobError, RenderJob, DEFAULT_VIEW_FUNCTION,
    STDOUT_SENTINEL,
};
pub use module::{
    collect_modules, extract, parse_module_name, ModuleConfig, ModuleError, DRIVER_MODULE_NAME,
};
pub use project::{
    ProjectDescriptor, ProjectError, HTML_PACKAGE, HTML_PACKAGE_VERSION, PROJECT_FILE_NAME,
};
