// Configuration loader
// Reads ~/.courtbook/config.toml (or an explicit path), then environment overrides

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::constants::CONFIG_FILE;
use super::settings::Config;

/// Default config file location
pub fn default_config_path() -> Result<PathBuf> {
    Ok(Config::home_dir()?.join(CONFIG_FILE))
}

/// Load configuration.
///
/// An explicit `path` must exist. The default path may be absent, in which
/// case built-in defaults plus environment variables are used.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            read_config_file(path)?
        }
        None => {
            let path = default_config_path()?;
            if path.exists() {
                read_config_file(&path)?
            } else {
                debug!("No config file at {}; using defaults", path.display());
                Config::default()
            }
        }
    };

    config.apply_env(|key| std::env::var(key).ok());

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_reads_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[selection]\nmax_columns = 8\n\n[webdriver]\nendpoint = \"http://127.0.0.1:4444\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.selection.max_columns, 8);
        assert_eq!(config.webdriver.endpoint, "http://127.0.0.1:4444");
    }

    #[test]
    fn test_invalid_toml_is_reported_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[selection\nmax_columns = ").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[wait]\npolicy = \"eventually\"\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
