//! Render jobs and normalization of raw job entries.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Output value that routes a job to standard output instead of a file.
pub const STDOUT_SENTINEL: &str = "::stdout";

/// View function rendered when the configuration only names an output.
pub const DEFAULT_VIEW_FUNCTION: &str = "view";

/// Where a rendered job ends up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The shared standard-output stream
    Stdout,
    /// A file path, relative paths resolve against the project root
    File(PathBuf),
}

impl Destination {
    /// Parse a raw output value.
    pub fn parse(raw: &str) -> Self {
        if raw == STDOUT_SENTINEL {
            Destination::Stdout
        } else {
            Destination::File(PathBuf::from(raw))
        }
    }

    /// The file path, if this destination is a file.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Destination::Stdout => None,
            Destination::File(path) => Some(path),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str(STDOUT_SENTINEL),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One (destination, view function) pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Where the rendered HTML goes
    pub output: Destination,

    /// Function on the owning module producing the view
    pub view_function: String,
}

impl RenderJob {
    /// Create a job.
    pub fn new(output: Destination, view_function: impl Into<String>) -> Self {
        Self {
            output,
            view_function: view_function.into(),
        }
    }

    /// Raw output string as written into the driver program.
    pub fn output_key(&self) -> String {
        self.output.to_string()
    }
}

/// A job entry that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Malformed job {0}: it should have an output field and a viewFunction field")]
    Malformed(Value),

    #[error("Unsupported job entry {0}: expected a string, an object or an array")]
    Unsupported(Value),
}

/// Normalize one raw `files` entry into a list of jobs.
///
/// Malformed entries are logged and dropped; the rest are kept in order.
pub fn normalize(raw: &Value) -> Vec<RenderJob> {
    let (jobs, errors) = try_normalize(raw);

    for error in errors {
        tracing::warn!("{}", error);
    }

    jobs
}

/// Like [`normalize`], but hands back the dropped entries instead of logging them.
pub fn try_normalize(raw: &Value) -> (Vec<RenderJob>, Vec<JobError>) {
    let items: Vec<&Value> = match raw {
        Value::String(output) => {
            return (
                vec![RenderJob::new(
                    Destination::parse(output),
                    DEFAULT_VIEW_FUNCTION,
                )],
                Vec::new(),
            );
        }
        Value::Object(_) => vec![raw],
        Value::Array(items) => items.iter().collect(),
        other => return (Vec::new(), vec![JobError::Unsupported(other.clone())]),
    };

    let mut jobs = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for item in items {
        match job_from_object(item) {
            Some(job) => jobs.push(job),
            None => errors.push(JobError::Malformed(item.clone())),
        }
    }

    (jobs, errors)
}

fn job_from_object(item: &Value) -> Option<RenderJob> {
    let output = non_empty_str(item.get("output")?)?;
    let view_function = non_empty_str(item.get("viewFunction")?)?;

    Some(RenderJob::new(Destination::parse(output), view_function))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn index_job() -> RenderJob {
        RenderJob::new(Destination::File(PathBuf::from("index.html")), "view")
    }

    #[test]
    fn string_becomes_default_view_job() {
        assert_eq!(normalize(&json!("index.html")), vec![index_job()]);
    }

    #[test]
    fn single_object_is_wrapped() {
        let raw = json!({ "output": "index.html", "viewFunction": "view" });

        assert_eq!(normalize(&raw), vec![index_job()]);
    }

    #[test]
    fn one_element_array_passes_through() {
        let raw = json!([{ "output": "index.html", "viewFunction": "view" }]);

        assert_eq!(normalize(&raw), vec![index_job()]);
    }

    #[test]
    fn keeps_array_order() {
        let raw = json!([
            { "output": "b.html", "viewFunction": "second" },
            { "output": "::stdout", "viewFunction": "first" },
        ]);

        let jobs = normalize(&raw);

        assert_eq!(
            jobs,
            vec![
                RenderJob::new(Destination::File(PathBuf::from("b.html")), "second"),
                RenderJob::new(Destination::Stdout, "first"),
            ]
        );
    }

    #[test]
    fn drops_malformed_entries_only() {
        let raw = json!([
            { "output": "a.html" },
            { "viewFunction": "view" },
            { "output": "", "viewFunction": "view" },
            { "output": "index.html", "viewFunction": "view" },
        ]);

        let (jobs, errors) = try_normalize(&raw);

        assert_eq!(jobs, vec![index_job()]);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| matches!(e, JobError::Malformed(_))));
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let (jobs, errors) = try_normalize(&json!(42));

        assert!(jobs.is_empty());
        assert!(matches!(errors.as_slice(), [JobError::Unsupported(_)]));
    }

    #[test]
    fn parses_stdout_sentinel() {
        assert_eq!(Destination::parse("::stdout"), Destination::Stdout);
        assert_eq!(Destination::Stdout.to_string(), "::stdout");
        assert_eq!(
            Destination::parse("out/page.html").as_path(),
            Some(Path::new("out/page.html"))
        );
    }
}
