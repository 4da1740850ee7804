//! Build configuration, loaded from a JSON document or assembled from CLI flags.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::job::{normalize, Destination, RenderJob, DEFAULT_VIEW_FUNCTION};

/// Default name of the configuration document.
pub const CONFIG_FILE_NAME: &str = "elm-static-html.json";

/// Jobs requested for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJobs {
    /// Elm source file, relative to the project root
    pub filename: PathBuf,

    /// Normalized jobs in configuration order
    pub jobs: Vec<RenderJob>,
}

/// Normalized build configuration.
///
/// Files keep the order in which the configuration lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    files: Vec<FileJobs>,
}

/// Raw configuration document.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    files: Map<String, Value>,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Serialized config is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl BuildConfig {
    /// Configuration for a single file rendering its default view.
    ///
    /// Without an output the result goes to standard output.
    pub fn single(filename: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        let output = output.map(Destination::File).unwrap_or(Destination::Stdout);

        Self {
            files: vec![FileJobs {
                filename: filename.into(),
                jobs: vec![RenderJob::new(output, DEFAULT_VIEW_FUNCTION)],
            }],
        }
    }

    /// Parse and normalize a configuration document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let raw: ConfigFile = serde_json::from_str(source)?;

        let files = raw
            .files
            .iter()
            .map(|(filename, jobs)| FileJobs {
                filename: PathBuf::from(filename),
                jobs: normalize(jobs),
            })
            .collect();

        Ok(Self { files })
    }

    /// Load a configuration document from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json(&source)?;
        tracing::debug!("Loaded {} files from {}", config.files.len(), path.display());

        Ok(config)
    }

    /// Files with their jobs.
    pub fn files(&self) -> &[FileJobs] {
        &self.files
    }

    /// Total number of jobs across all files.
    pub fn job_count(&self) -> usize {
        self.files.iter().map(|f| f.jobs.len()).sum()
    }

    /// File destinations targeted by more than one job, in first-seen order.
    pub fn duplicate_destinations(&self) -> Vec<&Path> {
        let mut counts: HashMap<&Path, usize> = HashMap::new();
        let mut order = Vec::new();

        for path in self
            .files
            .iter()
            .flat_map(|f| f.jobs.iter())
            .filter_map(|job| job.output.as_path())
        {
            let count = counts.entry(path).or_insert(0);
            if *count == 0 {
                order.push(path);
            }
            *count += 1;
        }

        order.into_iter().filter(|p| counts[p] > 1).collect()
    }

    /// Log every file destination written by more than one job.
    pub fn warn_duplicate_destinations(&self) {
        for path in self.duplicate_destinations() {
            tracing::warn!(
                "Multiple jobs write to {}; the last one in the config wins",
                path.display()
            );
        }
    }
}

/// Starter configuration document written by `--init-config`.
pub fn starter_config() -> Result<String, ConfigError> {
    let config = serde_json::json!({
        "files": {
            "Main.elm": {
                "output": "index.html",
                "viewFunction": DEFAULT_VIEW_FUNCTION
            }
        }
    });

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    config.serialize(&mut ser).map_err(ConfigError::Serialize)?;

    Ok(String::from_utf8(buf)?)
}
