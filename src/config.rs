//! TOML configuration for compiles started from the command line.
//!
//! ```toml
//! display_name = "Support bot"
//!
//! [project]
//! persistence_enabled = true
//! comments_enabled = false
//! admin_ids = [123456789]
//! ```

use crate::error::ConfigError;
use crate::project::ProjectSettings;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name searched for in the working directory.
pub const CONFIG_FILE: &str = "botflow.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub project: ProjectSettings,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Finds and loads the configuration.
///
/// Search order:
/// 1. Explicit path if provided; it must exist
/// 2. `botflow.toml` in the working directory
/// 3. Defaults
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_in(explicit_path, Path::new("."))
}

/// [`load_config`] with the local search rooted at `dir`.
pub fn load_config_in(explicit_path: Option<&Path>, dir: &Path) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local = dir.join(CONFIG_FILE);
    if local.exists() {
        info!(path = local.display().to_string(); "Loading configuration from local path");
        return load_config_file(&local);
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.display().to_string()));
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_local_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_in(None, dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn local_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "display_name = \"Shop\"\n[project]\npersistence_enabled = true\nadmin_ids = [7]\n",
        )
        .unwrap();
        let config = load_config_in(None, dir.path()).unwrap();
        assert_eq!(config.display_name.as_deref(), Some("Shop"));
        assert!(config.project.persistence_enabled);
        assert!(!config.project.comments_enabled);
        assert_eq!(config.project.admin_ids, vec![7]);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config_in(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[project\n").unwrap();
        let err = load_config_in(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
