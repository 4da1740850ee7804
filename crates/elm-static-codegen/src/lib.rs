//! Driver program synthesis and compiled artifact patching.
//!
//! [`driver`] writes the Elm program that renders every configured view;
//! [`patch`] rewrites the JavaScript the compiler produces from it.

pub mod driver;
pub mod patch;

pub use driver::{DriverSynthesizer, FormatOptions, OUTPUT_PORT, SERIALIZE_PLACEHOLDER};
pub use patch::{patch, patch_file, rules, Patched, RewriteRule};

/// Errors that can occur while generating or patching code.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("Failed to render driver template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
