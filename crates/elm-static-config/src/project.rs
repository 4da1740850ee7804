//! Project descriptor (`elm.json`) loading and rewriting for the work directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// File name of the project descriptor.
pub const PROJECT_FILE_NAME: &str = "elm.json";

/// Package the driver program needs to decode and print views.
pub const HTML_PACKAGE: &str = "ThinkAlexandria/elm-html-in-elm";

/// Version of [`HTML_PACKAGE`] injected into the derived descriptor.
pub const HTML_PACKAGE_VERSION: &str = "1.0.1";

/// An application `elm.json`.
///
/// Fields this tool does not touch are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectDescriptor {
    #[serde(rename = "source-directories")]
    pub source_directories: Vec<String>,

    pub dependencies: Dependencies,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// The `dependencies` table of an application descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Dependencies {
    pub direct: BTreeMap<String, String>,

    #[serde(default)]
    pub indirect: BTreeMap<String, String>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Errors that can occur when handling the project descriptor.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Failed to load {path}: {source}. Make sure elm.json is in the current dir")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse elm.json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to serialize elm.json: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectDescriptor {
    /// Load `elm.json` from the project root.
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let path = root.join(PROJECT_FILE_NAME);
        let source = fs::read_to_string(&path).map_err(|source| ProjectError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Ok(serde_json::from_str(&source)?)
    }

    /// Derive the descriptor used to compile from inside the work directory.
    ///
    /// Source directories become absolute under `root`; the work directory
    /// (`.`) and `root` itself are appended; the HTML package is added as a
    /// direct dependency.
    pub fn for_work_dir(&self, root: &Path) -> Self {
        let mut sources: Vec<String> = Vec::new();
        let mut push = |dir: String| {
            if !sources.contains(&dir) {
                sources.push(dir);
            }
        };

        for dir in &self.source_directories {
            push(path_string(&root.join(dir)));
        }
        push(".".to_string());
        push(path_string(root));

        let mut dependencies = self.dependencies.clone();
        dependencies.indirect.remove(HTML_PACKAGE);
        dependencies
            .direct
            .insert(HTML_PACKAGE.to_string(), HTML_PACKAGE_VERSION.to_string());

        Self {
            source_directories: sources,
            dependencies,
            rest: self.rest.clone(),
        }
    }

    /// Write the descriptor as JSON.
    pub fn write(&self, path: &Path) -> Result<(), ProjectError> {
        let json = serde_json::to_string_pretty(self).map_err(ProjectError::Serialize)?;

        fs::write(path, json).map_err(|source| ProjectError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

fn path_string(path: &Path) -> String {
    let path: PathBuf = path.components().collect();
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const ELM_JSON: &str = r#"{
        "type": "application",
        "source-directories": ["src"],
        "elm-version": "0.19.1",
        "dependencies": {
            "direct": { "elm/html": "1.0.0" },
            "indirect": {
                "elm/json": "1.1.3",
                "ThinkAlexandria/elm-html-in-elm": "1.0.0"
            }
        },
        "test-dependencies": { "direct": {}, "indirect": {} }
    }"#;

    #[test]
    fn derives_work_dir_descriptor() {
        let descriptor: ProjectDescriptor = serde_json::from_str(ELM_JSON).unwrap();

        let derived = descriptor.for_work_dir(Path::new("/project"));

        assert_eq!(
            derived.source_directories,
            vec!["/project/src".to_string(), ".".to_string(), "/project".to_string()]
        );
        assert_eq!(
            derived.dependencies.direct.get(HTML_PACKAGE).map(String::as_str),
            Some(HTML_PACKAGE_VERSION)
        );
        assert!(!derived.dependencies.indirect.contains_key(HTML_PACKAGE));
        assert_eq!(derived.rest.get("elm-version"), Some(&Value::from("0.19.1")));
    }

    #[test]
    fn does_not_repeat_root_source_directory() {
        let mut descriptor: ProjectDescriptor = serde_json::from_str(ELM_JSON).unwrap();
        descriptor.source_directories = vec![".".to_string()];

        let derived = descriptor.for_work_dir(Path::new("/project"));

        assert_eq!(
            derived.source_directories,
            vec!["/project".to_string(), ".".to_string()]
        );
    }

    #[test]
    fn load_fails_without_elm_json() {
        let temp = tempdir().unwrap();

        assert!(matches!(
            ProjectDescriptor::load(temp.path()),
            Err(ProjectError::Read { .. })
        ));
    }

    #[test]
    fn writes_and_reloads() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(PROJECT_FILE_NAME), ELM_JSON).unwrap();

        let descriptor = ProjectDescriptor::load(temp.path()).unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        descriptor
            .for_work_dir(temp.path())
            .write(&work.join(PROJECT_FILE_NAME))
            .unwrap();

        let reloaded = ProjectDescriptor::load(&work).unwrap();
        assert!(reloaded.dependencies.direct.contains_key(HTML_PACKAGE));
        assert!(reloaded.rest.contains_key("test-dependencies"));
    }

    #[test]
    fn write_errors_are_not_reported_as_parse_errors() {
        let temp = tempdir().unwrap();
        let descriptor: ProjectDescriptor = serde_json::from_str(ELM_JSON).unwrap();

        let result = descriptor.write(&temp.path().join("missing").join(PROJECT_FILE_NAME));
        assert!(matches!(result, Err(ProjectError::Write { .. })));

        let source = serde_json::from_str::<Value>("{").unwrap_err();
        let message = ProjectError::Serialize(source).to_string();
        assert!(message.starts_with("Failed to serialize elm.json"));
    }
}
