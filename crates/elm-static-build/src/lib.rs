//! Compile, run and dispatch pipeline for elm-static-html.
//!
//! [`StaticBuilder`] drives one build: it writes the driver program and a
//! derived `elm.json` into the [`WorkDirectory`], compiles the driver, patches
//! the output, runs it and routes every rendered string to its destination.

pub mod builder;
pub mod compiler;
pub mod dispatch;
pub mod runtime;
pub mod workdir;

pub use builder::{BuildError, BuildOptions, BuildResult, StaticBuilder};
pub use compiler::{CompileOptions, Compiler, CompilerError, ElmCompiler};
pub use dispatch::{DispatchError, DispatchSummary, Dispatcher, WritePolicy};
pub use runtime::{NodeRuntime, RenderedOutput, RunError, RunUnit, Runtime};
pub use workdir::WorkDirectory;
