use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use thiserror::Error;

use crate::analyzer::BandThresholds;
use crate::model::Units;

/// Environment variable checked before the config file for the credential.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Sample value written by `setup`; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No OpenWeatherMap API key configured.\n\
         Set the {API_KEY_ENV} environment variable or add `api_key` to the config file.\n\
         Get a free key from https://openweathermap.org/api"
    )]
    MissingApiKey,

    #[error(
        "The configured API key is still the placeholder '{PLACEHOLDER_API_KEY}'.\n\
         Replace it with your real OpenWeatherMap key."
    )]
    PlaceholderApiKey,
}

/// Process-wide configuration, constructed once at startup and passed
/// explicitly into each component. Never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap credential. May be empty until `setup` has run.
    pub api_key: String,

    /// Provider endpoint; overridable so tests can point at a local server.
    pub base_url: String,

    /// Per-call HTTP timeout, seconds.
    pub timeout_secs: u64,

    pub units: Units,

    /// Courtesy delay between successive calls in a batch, milliseconds.
    pub rate_limit_delay_ms: u64,

    /// Temperature band thresholds, in the configured units.
    pub bands: BandThresholds,

    pub cities_file: PathBuf,
    pub data_file: PathBuf,
    pub report_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            units: Units::Metric,
            rate_limit_delay_ms: 100,
            bands: BandThresholds::default(),
            cities_file: PathBuf::from("cities.txt"),
            data_file: PathBuf::from("weather_data.csv"),
            report_file: PathBuf::from("weather_report.txt"),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    /// The fail-fast credential check: errors on a missing or placeholder
    /// key so no network activity is attempted with bad credentials.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::PlaceholderApiKey);
        }
        Ok(key)
    }

    /// Load config from disk, or return defaults if no file exists yet.
    /// The `OPENWEATHER_API_KEY` environment variable, when set, overrides
    /// the file's credential.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                cfg.api_key = key;
            }
        }

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-report", "weather-report")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.rate_limit_delay(), Duration::from_millis(100));
        assert_eq!(cfg.units, Units::Metric);
        assert_eq!(cfg.cities_file, PathBuf::from("cities.txt"));
        assert_eq!(cfg.data_file, PathBuf::from("weather_data.csv"));
        assert_eq!(cfg.report_file, PathBuf::from("weather_report.txt"));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));

        let cfg = Config {
            api_key: "   ".into(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn placeholder_api_key_is_rejected() {
        let cfg = Config {
            api_key: PLACEHOLDER_API_KEY.into(),
            ..Config::default()
        };

        let err = cfg.require_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::PlaceholderApiKey));
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn real_api_key_is_accepted() {
        let cfg = Config {
            api_key: "abc123".into(),
            ..Config::default()
        };
        assert_eq!(cfg.require_api_key().expect("valid key"), "abc123");
    }

    #[test]
    fn toml_roundtrip_preserves_settings() {
        let cfg = Config {
            api_key: "abc123".into(),
            timeout_secs: 30,
            units: Units::Imperial,
            rate_limit_delay_ms: 250,
            ..Config::default()
        };

        let toml = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml).expect("parse");

        assert_eq!(parsed.api_key, "abc123");
        assert_eq!(parsed.timeout_secs, 30);
        assert_eq!(parsed.units, Units::Imperial);
        assert_eq!(parsed.rate_limit_delay_ms, 250);
        assert_eq!(parsed.bands, BandThresholds::default());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let parsed: Config = toml::from_str("api_key = \"abc123\"").expect("parse");

        assert_eq!(parsed.api_key, "abc123");
        assert_eq!(parsed.timeout_secs, 10);
        assert_eq!(parsed.bands, BandThresholds::default());
    }
}
