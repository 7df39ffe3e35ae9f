use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs;

pub const PORT_ENV: &str = "CSS_FINGERPRINT_PORT";

/// Selects the in-memory store instead of a database file.
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
  #[error("Failed to read settings file {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("Failed to parse settings file {path}: {source}")]
  Json {
    path: PathBuf,
    source: serde_json::Error,
  },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
  #[serde(default = "default_port")]
  pub port: u16,
  #[serde(default)]
  pub database_path: Option<PathBuf>, // None = app data dir, ":memory:" = no persistence
  #[serde(default)]
  pub base_url: String, // Prefix for generated URLs, empty = root-relative
  #[serde(default = "default_result_delay_ms")]
  pub result_delay_ms: u64,
  #[serde(default = "default_result_delay_ch_headers")]
  pub result_delay_ch_headers: Vec<String>,
  #[serde(default = "default_validate_catalog")]
  pub validate_catalog: bool,
  // Every page view creates a visit; older ones are deleted. 0 keeps them forever.
  #[serde(default = "default_visit_retention_secs")]
  pub visit_retention_secs: u64,
}

fn default_bind_address() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  8787
}

fn default_result_delay_ms() -> u64 {
  1500
}

fn default_result_delay_ch_headers() -> Vec<String> {
  vec![
    "Sec-CH-UA-Full-Version-List".to_string(),
    "Sec-CH-UA-Platform-Version".to_string(),
  ]
}

fn default_validate_catalog() -> bool {
  true
}

fn default_visit_retention_secs() -> u64 {
  24 * 60 * 60
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
      port: default_port(),
      database_path: None,
      base_url: String::new(),
      result_delay_ms: default_result_delay_ms(),
      result_delay_ch_headers: default_result_delay_ch_headers(),
      validate_catalog: default_validate_catalog(),
      visit_retention_secs: default_visit_retention_secs(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
  Memory,
  File(PathBuf),
}

impl ServerSettings {
  /// Reads `path`; a missing file yields the defaults.
  pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    // Missing fields fall back to their serde defaults
    serde_json::from_str(&content).map_err(|source| SettingsError::Json {
      path: path.to_path_buf(),
      source,
    })
  }

  /// An explicit path must exist; otherwise the default settings file is
  /// used when present.
  pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
    match explicit {
      Some(path) if !path.exists() => Err(SettingsError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
      }),
      Some(path) => Self::load_from(path),
      None => Self::load_from(&app_dirs::settings_file()),
    }
  }

  pub fn apply_env(&mut self) {
    if let Ok(raw) = std::env::var(PORT_ENV) {
      match raw.parse::<u16>() {
        Ok(port) => self.port = port,
        Err(e) => log::warn!("Ignoring {PORT_ENV}={raw}: {e}"),
      }
    }
  }

  pub fn database_location(&self) -> DatabaseLocation {
    match &self.database_path {
      Some(path) if path.as_os_str() == MEMORY_DATABASE => DatabaseLocation::Memory,
      Some(path) => DatabaseLocation::File(path.clone()),
      None => DatabaseLocation::File(app_dirs::database_path()),
    }
  }

  pub fn listen_address(&self) -> String {
    format!("{}:{}", self.bind_address, self.port)
  }

  /// `None` when visits are kept forever.
  pub fn visit_retention(&self) -> Option<Duration> {
    (self.visit_retention_secs > 0).then(|| Duration::from_secs(self.visit_retention_secs))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ServerSettings::load_from(&dir.path().join("nope.json")).unwrap();
    assert_eq!(settings, ServerSettings::default());
    assert_eq!(settings.listen_address(), "127.0.0.1:8787");
  }

  #[test]
  fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{ "port": 9000, "base_url": "https://probe.example" }"#).unwrap();

    let settings = ServerSettings::load_from(&path).unwrap();
    assert_eq!(settings.port, 9000);
    assert_eq!(settings.base_url, "https://probe.example");
    assert_eq!(settings.result_delay_ms, 1500);
    assert!(settings.validate_catalog);
    assert_eq!(settings.visit_retention(), Some(Duration::from_secs(86400)));
  }

  #[test]
  fn test_zero_retention_keeps_visits() {
    let settings = ServerSettings {
      visit_retention_secs: 0,
      ..Default::default()
    };
    assert_eq!(settings.visit_retention(), None);
  }

  #[test]
  fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
      ServerSettings::load_from(&path),
      Err(SettingsError::Json { .. })
    ));
  }

  #[test]
  fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
      ServerSettings::load(Some(&missing)),
      Err(SettingsError::Io { .. })
    ));
  }

  #[test]
  fn test_database_location() {
    let mut settings = ServerSettings {
      database_path: Some(PathBuf::from(MEMORY_DATABASE)),
      ..Default::default()
    };
    assert_eq!(settings.database_location(), DatabaseLocation::Memory);

    settings.database_path = Some(PathBuf::from("/var/lib/visits.db"));
    assert_eq!(
      settings.database_location(),
      DatabaseLocation::File(PathBuf::from("/var/lib/visits.db"))
    );

    let _guard = app_dirs::set_test_data_dir(PathBuf::from("/tmp/css-fp"));
    settings.database_path = None;
    assert_eq!(
      settings.database_location(),
      DatabaseLocation::File(PathBuf::from("/tmp/css-fp/visits.sqlite3"))
    );
  }

  #[test]
  #[serial]
  fn test_port_env_override() {
    let mut settings = ServerSettings::default();

    std::env::set_var(PORT_ENV, "9100");
    settings.apply_env();
    assert_eq!(settings.port, 9100);

    std::env::set_var(PORT_ENV, "not-a-port");
    settings.apply_env();
    assert_eq!(settings.port, 9100);

    std::env::remove_var(PORT_ENV);
  }
}
