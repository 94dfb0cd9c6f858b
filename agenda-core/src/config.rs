//! Client configuration at ~/.config/agenda/config.toml

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::error::{AgendaError, AgendaResult};

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Settings read from the config file, overridable with `AGENDA_*` env vars
/// (e.g. `AGENDA_BASE_URL`).
#[derive(Debug, Deserialize, Clone)]
pub struct AgendaConfig {
    /// Root URL of the meetings API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// IANA timezone used to derive local dates and clock times.
    /// Falls back to the system zone, then UTC.
    pub timezone: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        AgendaConfig {
            base_url: default_base_url(),
            timezone: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AgendaConfig {
    pub fn config_dir() -> AgendaResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda"))
    }

    pub fn config_path() -> AgendaResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Where the bearer token and cached profile are persisted.
    pub fn session_path() -> AgendaResult<PathBuf> {
        Ok(Self::config_dir()?.join("session.toml"))
    }

    /// Load the config, creating a commented default file on first run.
    pub fn load() -> AgendaResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> AgendaResult<Self> {
        let config: AgendaConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("AGENDA").try_parsing(true))
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AgendaResult<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| AgendaError::Config(format!("Invalid base_url '{}': {e}", self.base_url)))?;

        if let Some(name) = &self.timezone {
            name.parse::<Tz>()
                .map_err(|_| AgendaError::Config(format!("Unknown timezone '{name}'")))?;
        }

        Ok(())
    }

    /// Timezone for local dates: configured, else system, else UTC.
    pub fn tz(&self) -> Tz {
        self.timezone
            .as_deref()
            .and_then(|name| name.parse().ok())
            .or_else(|| {
                iana_time_zone::get_timezone()
                    .ok()
                    .and_then(|name| name.parse().ok())
            })
            .unwrap_or(Tz::UTC)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendaResult<()> {
        let contents = format!(
            "\
# agenda configuration

# Root URL of the meetings API:
# base_url = \"{}\"

# Timezone for the calendar grid (defaults to the system timezone):
# timezone = \"America/Santiago\"

# Seconds before an API request is abandoned:
# request_timeout_secs = {}
",
            DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgendaError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commented_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda").join("config.toml");
        AgendaConfig::create_default_config(&path).unwrap();

        let config = AgendaConfig::load_from(&path).unwrap();
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(config.timezone.is_none());
    }

    #[test]
    fn explicit_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"https://api.example.com\"\ntimezone = \"America/Santiago\"\nrequest_timeout_secs = 5\n",
        )
        .unwrap();

        let config = AgendaConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.tz(), chrono_tz::America::Santiago);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timezone = \"Mars/Olympus\"\n").unwrap();

        assert!(matches!(
            AgendaConfig::load_from(&path),
            Err(AgendaError::Config(_))
        ));
    }
}
