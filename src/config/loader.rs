//! Settings loader.
//!
//! This module provides functionality to load settings from JSON files
//! or the default per-user location.

use crate::config::settings::Settings;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Name of the settings file inside the config directory.
const CONFIG_FILE: &str = "config.json";

/// Settings loader.
///
/// Provides methods to load settings from different sources.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let settings = SettingsLoader::load_from_file("leakcheck.json")?;
    /// println!("probing with {} workers", settings.concurrency);
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default location.
    ///
    /// Reads `$CONFIG_DIR/leakcheck/config.json` when it exists and falls back
    /// to the built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> Result<Settings> {
        Self::load_from_dir(&Self::config_dir())
    }

    /// Load `config.json` from `dir`, or the defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Settings> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        Self::load_from_file(&path).map_err(|e| match e {
            Error::Json(e) => Error::config(format!("{}: {e}", path.display())),
            other => other,
        })
    }

    /// Load from an explicit path if given, otherwise from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_default(),
        }
    }

    /// Get the config directory path.
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leakcheck")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"concurrency": 3, "probe_scheme": "http"}}"#).unwrap();

        let settings = SettingsLoader::load_from_file(file.path()).unwrap();
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.probe_scheme, "http");
        assert_eq!(settings.phase2_window_secs, 69);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            SettingsLoader::load_from_file(file.path()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"probe_timeout_secs": 0}}"#).unwrap();
        assert!(matches!(
            SettingsLoader::load_from_file(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_in_dir_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::load_from_dir(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_broken_file_in_dir_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[1, 2").unwrap();
        let err = SettingsLoader::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"api_base_url": "http://127.0.0.1:8080"}"#).unwrap();

        let settings = SettingsLoader::load(Some(&path)).unwrap();
        assert_eq!(settings.api_base_url, "http://127.0.0.1:8080");

        assert!(SettingsLoader::load(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_config_dir() {
        assert!(SettingsLoader::config_dir().ends_with("leakcheck"));
    }
}
