//! # Desk Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`QUOTE_*`)
//! 2. Config file (`--config <path>`, else `quote-desk.toml` in the
//!    platform config directory, if present)
//! 3. Defaults (this file)
//!
//! ## Example `quote-desk.toml`
//! ```toml
//! [store]
//! backend = "sqlite"
//! data_dir = "/srv/quotes"
//!
//! [session]
//! idle_limit_secs = 600
//! idle_poll_secs = 15
//!
//! [shop]
//! name = "In Ấn Minh Phát"
//! ```
//!
//! ## Thread Safety
//! Read-only after initialization, so no mutex needed.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use quote_core::{IDLE_LIMIT_SECS, IDLE_POLL_SECS};

/// Config file name looked up in the platform config directory.
pub const CONFIG_FILE: &str = "quote-desk.toml";

/// Upper bound for both session intervals (one week).
pub const MAX_IDLE_SECS: u64 = 7 * 24 * 60 * 60;

/// Which persistence backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// `orders.json` + `owner_pin.txt` in the data directory
    #[default]
    Json,
    /// `quotes.db` in the data directory
    Sqlite,
    /// Nothing survives the process
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    /// Data directory. Default: platform data directory.
    pub data_dir: Option<PathBuf>,
    /// SQLite file name inside the data directory.
    pub database_file: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            backend: StoreBackend::Json,
            data_dir: None,
            database_file: "quotes.db".to_string(),
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Owner sessions idle longer than this are demoted.
    pub idle_limit_secs: u64,
    /// How often the idle check runs.
    pub idle_poll_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        SessionSection {
            idle_limit_secs: IDLE_LIMIT_SECS,
            idle_poll_secs: IDLE_POLL_SECS,
        }
    }
}

/// `[shop]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopSection {
    /// Printed above the quote title. Empty: not printed.
    pub name: String,
}

/// Desk configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub store: StoreSection,
    pub session: SessionSection,
    pub shop: ShopSection,
}

impl DeskConfig {
    /// Loads defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => DeskConfig::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Config file loaded");
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies `QUOTE_*` overrides.
    ///
    /// ## Environment Variables
    /// - `QUOTE_STORE`: `json`, `sqlite` or `memory`
    /// - `QUOTE_DATA_DIR`: data directory
    /// - `QUOTE_IDLE_LIMIT_SECS`: idle limit in seconds
    /// - `QUOTE_IDLE_POLL_SECS`: idle poll interval in seconds
    /// - `QUOTE_SHOP_NAME`: shop name on printed quotes
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |key: &str, value: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        if let Some(value) = lookup("QUOTE_STORE") {
            self.store.backend = value
                .parse()
                .map_err(|_| invalid("QUOTE_STORE", &value))?;
        }
        if let Some(value) = lookup("QUOTE_DATA_DIR") {
            self.store.data_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("QUOTE_IDLE_LIMIT_SECS") {
            self.session.idle_limit_secs = value
                .trim()
                .parse()
                .map_err(|_| invalid("QUOTE_IDLE_LIMIT_SECS", &value))?;
        }
        if let Some(value) = lookup("QUOTE_IDLE_POLL_SECS") {
            self.session.idle_poll_secs = value
                .trim()
                .parse()
                .map_err(|_| invalid("QUOTE_IDLE_POLL_SECS", &value))?;
        }
        if let Some(value) = lookup("QUOTE_SHOP_NAME") {
            self.shop.name = value;
        }
        Ok(())
    }

    /// Rejects settings the desk cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.idle_limit_secs == 0 {
            return Err(ConfigError::Invalid(
                "session.idle_limit_secs must be greater than 0".to_string(),
            ));
        }
        if self.session.idle_poll_secs == 0 {
            return Err(ConfigError::Invalid(
                "session.idle_poll_secs must be greater than 0".to_string(),
            ));
        }
        for (key, value) in [
            ("session.idle_limit_secs", self.session.idle_limit_secs),
            ("session.idle_poll_secs", self.session.idle_poll_secs),
        ] {
            if value > MAX_IDLE_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at most {} (one week)",
                    key, MAX_IDLE_SECS
                )));
            }
        }
        if self.store.database_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.database_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The data directory to use.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/vn.print-quote.quote-desk`
    /// - **Windows**: `%APPDATA%\print-quote\quote-desk\data`
    /// - **Linux**: `~/.local/share/quote-desk`
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.store.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.store.database_file)
    }

    /// Capped at [`MAX_IDLE_SECS`] for configs that skipped [`Self::validate`].
    pub fn idle_limit(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session.idle_limit_secs.min(MAX_IDLE_SECS) as i64)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_secs(self.session.idle_poll_secs)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("vn", "print-quote", "quote-desk")
}

/// `quote-desk.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeskConfig::default();
        assert_eq!(config.store.backend, StoreBackend::Json);
        assert_eq!(config.session.idle_limit_secs, 600);
        assert_eq!(config.session.idle_poll_secs, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DeskConfig::from_toml(
            r#"
            [store]
            backend = "sqlite"

            [shop]
            name = "In Ấn Minh Phát"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.database_file, "quotes.db");
        assert_eq!(config.session.idle_poll_secs, 15);
        assert_eq!(config.shop.name, "In Ấn Minh Phát");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = DeskConfig::from_toml("[session]\nidle_limit_secs = 900\n").unwrap();
        config
            .apply_env(env(&[
                ("QUOTE_STORE", "memory"),
                ("QUOTE_IDLE_LIMIT_SECS", "120"),
                ("QUOTE_DATA_DIR", "/tmp/quotes"),
            ]))
            .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.session.idle_limit_secs, 120);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/quotes"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/quotes/quotes.db"));
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = DeskConfig::default();
        let err = config
            .apply_env(env(&[("QUOTE_STORE", "postgres")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = config
            .apply_env(env(&[("QUOTE_IDLE_POLL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("QUOTE_IDLE_POLL_SECS"));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = DeskConfig::default();
        config.session.idle_poll_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_idle_limit_is_rejected() {
        let mut config = DeskConfig::default();
        config
            .apply_env(env(&[("QUOTE_IDLE_LIMIT_SECS", "10000000000000000")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.idle_limit_secs must be at most"));
        assert_eq!(config.idle_limit(), chrono::Duration::weeks(1));

        config.session.idle_limit_secs = MAX_IDLE_SECS;
        config.session.idle_poll_secs = u64::MAX;
        assert!(config.validate().is_err());
        config.session.idle_poll_secs = 15;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            DeskConfig::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[store]\nbackend = \"json\"\n").unwrap();
        assert!(DeskConfig::from_file(&path).is_ok());
    }
}
