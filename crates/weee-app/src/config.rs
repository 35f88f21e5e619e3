//! Configuration for the classification engine and the CLI.
//!
//! `EngineConfig` is the in-process tuning surface, validated once at
//! initialization. `Config` is the file-backed CLI configuration, stored
//! at `~/.config/weee-checker/config.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use weee_types::{ConfigError, Error, OutputFormat, Result};

/// Thresholds and knobs consumed by the engine. All values have
/// documented defaults; `validate` rejects out-of-range settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum lead of the top category score over the runner-up
    pub margin: f64,
    /// Minimum absolute top score
    pub floor: f64,
    /// Confidence multiplier applied when the arbiter disagrees with the
    /// rule-based top category
    pub disagreement_discount: f64,
    /// Upper bound on one arbiter call; `None` leaves it to the caller
    pub arbiter_timeout: Option<Duration>,
    /// Opt-in size-bucket fallback for candidates with no keyword signal
    pub size_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            margin: 0.15,
            floor: 0.30,
            disagreement_discount: 0.5,
            arbiter_timeout: None,
            size_fallback: false,
        }
    }
}

impl EngineConfig {
    /// Fatal at initialization: a misconfigured engine never runs.
    pub fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "margin must be a non-negative finite number, got {}",
                self.margin
            )));
        }
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "floor must be a non-negative finite number, got {}",
                self.floor
            )));
        }
        if !self.disagreement_discount.is_finite()
            || !(0.0..=1.0).contains(&self.disagreement_discount)
        {
            return Err(Error::InvalidConfiguration(format!(
                "disagreement_discount must be within [0, 1], got {}",
                self.disagreement_discount
            )));
        }
        if let Some(timeout) = self.arbiter_timeout {
            if timeout.is_zero() {
                return Err(Error::InvalidConfiguration(
                    "arbiter_timeout must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_margin() -> f64 {
    0.15
}

fn default_floor() -> f64 {
    0.30
}

fn default_discount() -> f64 {
    0.5
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

/// File-backed CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_margin")]
    pub margin: f64,

    #[serde(default = "default_floor")]
    pub floor: f64,

    #[serde(default = "default_discount")]
    pub disagreement_discount: f64,

    /// Arbiter call timeout in seconds
    #[serde(default)]
    pub arbiter_timeout_secs: Option<u64>,

    /// Command line for the arbitration oracle (e.g. a CLI LLM client)
    #[serde(default)]
    pub arbiter_command: Option<String>,

    /// Size-bucket fallback for label-less signal (off by default)
    #[serde(default)]
    pub size_fallback: bool,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            floor: default_floor(),
            disagreement_discount: default_discount(),
            arbiter_timeout_secs: None,
            arbiter_command: None,
            size_fallback: false,
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("weee-checker");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default path, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from an explicit path, or create default
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Derive the validated engine configuration.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let config = EngineConfig {
            margin: self.margin,
            floor: self.floor,
            disagreement_discount: self.disagreement_discount,
            arbiter_timeout: self.arbiter_timeout_secs.map(Duration::from_secs),
            size_fallback: self.size_fallback,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
        Config::default().engine_config().unwrap();
    }

    #[test]
    fn test_out_of_range_values_are_fatal() {
        let mut config = EngineConfig::default();
        config.margin = -0.1;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));

        let mut config = EngineConfig::default();
        config.disagreement_discount = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.floor = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.arbiter_timeout = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.margin = 0.2;
        config.arbiter_command = Some("llm-arbiter --json".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.margin, 0.2);
        assert_eq!(loaded.arbiter_command.as_deref(), Some("llm-arbiter --json"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(loaded.margin, 0.15);
        assert_eq!(loaded.output_format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"margin": 0.25}"#).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.margin, 0.25);
        assert_eq!(loaded.floor, 0.30);
    }
}
