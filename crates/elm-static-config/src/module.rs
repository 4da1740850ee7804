//! Module discovery: reads the declared module name off each source file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::BuildConfig;
use crate::job::RenderJob;

/// Name of the generated driver module; user modules may not take it.
pub const DRIVER_MODULE_NAME: &str = "PrivateMain";

const MODULE_KEYWORD: &str = "module";

/// A source file's validated module name plus its render jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Source file path
    pub filename: PathBuf,

    /// Module name declared on the first line
    pub module_name: String,

    /// Jobs in configuration order
    pub jobs: Vec<RenderJob>,
}

/// Reasons a source file is skipped.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File is empty")]
    Empty,

    #[error("Expected module name on first line of file, found `{0}`")]
    MissingDeclaration(String),

    #[error("No module name provided")]
    NoName,

    #[error("You can't call your module PrivateMain! Please rename it.")]
    Reserved,

    #[error("`{0}` is not a valid module name")]
    InvalidName(String),
}

/// Extract the module name from a file's contents.
pub fn parse_module_name(source: &str) -> Result<String, ModuleError> {
    static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Z][A-Za-z0-9_]*(\.[A-Z][A-Za-z0-9_]*)*$")
            .expect("Invalid module name regex")
    });

    if source.is_empty() {
        return Err(ModuleError::Empty);
    }

    let first_line = source.lines().next().unwrap_or("");
    let tokens: Vec<&str> = first_line.split(' ').collect();

    if tokens.len() < 2 || tokens[0] != MODULE_KEYWORD {
        return Err(ModuleError::MissingDeclaration(first_line.to_string()));
    }

    let name = tokens[1].trim();

    if name.is_empty() {
        return Err(ModuleError::NoName);
    }
    if name == DRIVER_MODULE_NAME {
        return Err(ModuleError::Reserved);
    }
    if !NAME_RE.is_match(name) {
        return Err(ModuleError::InvalidName(name.to_string()));
    }

    Ok(name.to_string())
}

/// Read `filename` under `root` and pair its module name with `jobs`.
pub fn extract(root: &Path, filename: &Path, jobs: &[RenderJob]) -> Result<ModuleConfig, ModuleError> {
    let path = root.join(filename);
    let source = fs::read_to_string(&path).map_err(|source| ModuleError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(ModuleConfig {
        filename: filename.to_path_buf(),
        module_name: parse_module_name(&source)?,
        jobs: jobs.to_vec(),
    })
}

/// Extract a module for every configured file, skipping the ones that fail.
pub fn collect_modules(root: &Path, config: &BuildConfig) -> Vec<ModuleConfig> {
    config
        .files()
        .iter()
        .filter_map(|file| match extract(root, &file.filename, &file.jobs) {
            Ok(module) => {
                tracing::debug!(
                    "Found module {} in {}",
                    module.module_name,
                    file.filename.display()
                );
                Some(module)
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.filename.display(), e);
                None
            }
        })
        .collect()
}
