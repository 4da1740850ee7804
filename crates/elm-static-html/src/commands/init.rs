//! Generate a starter configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use elm_static_config::{starter_config, CONFIG_FILE_NAME};

/// Run the init command in the current directory.
pub fn run() -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    tracing::debug!("Initializing {}..", CONFIG_FILE_NAME);
    let path = write_config(&cwd)?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

/// Write the starter config into `dir`, replacing any existing one.
pub fn write_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    let config = starter_config().context("Failed to serialize starter config")?;

    fs::write(&path, format!("{}\n", config))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elm_static_config::BuildConfig;
    use tempfile::tempdir;

    #[test]
    fn writes_loadable_starter_config() {
        let temp = tempdir().unwrap();

        let path = write_config(temp.path()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.job_count(), 1);
    }
}
