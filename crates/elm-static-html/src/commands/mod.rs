//! CLI commands.

pub mod build;
pub mod init;
