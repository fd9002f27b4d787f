//! Configuration management for hazardwatch
//!
//! Every tunable constant of the engine lives here: tier cut points, the
//! auto-confirm countdown, the tick interval and the filter lookup tables.
//! Values load from TOML, then `HAZARDWATCH_*` environment overrides apply,
//! then the result is validated as a whole.

use crate::classify::{ClusterThresholds, DuplicateClassifier, ReportThresholds};
use crate::error::{HazardError, Result};
use crate::filtering::{FilterGraph, FiltersConfig};
use crate::review::{
    ReviewSettings, DEFAULT_AUTO_CONFIRM_TICKS, DEFAULT_TICK_INTERVAL, SYSTEM_ACTOR,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Tier cut points for both classification schemes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default)]
    pub report: ReportThresholds,
    #[serde(default)]
    pub cluster: ClusterThresholds,
}

/// Auto-confirm countdown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub auto_confirm_ticks: u32,
    /// Wall-clock length of one tick, e.g. "1s" or "250ms"
    pub tick_interval: String,
    pub system_actor: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            auto_confirm_ticks: DEFAULT_AUTO_CONFIRM_TICKS,
            tick_interval: format!("{}s", DEFAULT_TICK_INTERVAL.as_secs()),
            system_actor: SYSTEM_ACTOR.to_string(),
        }
    }
}

impl ReviewConfig {
    pub fn settings(&self) -> ReviewSettings {
        ReviewSettings {
            auto_confirm_ticks: self.auto_confirm_ticks,
            system_actor: self.system_actor.clone(),
        }
    }

    pub fn tick_duration(&self) -> Result<Duration> {
        parse_duration(&self.tick_interval).ok_or_else(|| HazardError::InvalidConfigValue {
            path: "review.tick_interval".to_string(),
            message: format!("Cannot parse '{}' as a duration", self.tick_interval),
        })
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_confirm_ticks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_interval: Option<String>,
}

/// Parse "250ms", "1s", "2m", "1h" or a bare number of seconds
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let value: u64 = digits.parse().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_secs(value.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(value.checked_mul(3600)?)),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HazardError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HazardError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| HazardError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| HazardError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(ticks) = overrides.auto_confirm_ticks {
            self.review.auto_confirm_ticks = ticks;
        }
        if let Some(interval) = overrides.tick_interval {
            self.review.tick_interval = interval;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: HAZARDWATCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply overrides from (name, value) pairs; names without the prefix are ignored
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("HAZARDWATCH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "REVIEW__AUTO_CONFIRM_TICKS" => {
                self.review.auto_confirm_ticks = parse_value(path, value)?;
            }
            "REVIEW__TICK_INTERVAL" => {
                self.review.tick_interval = value.to_string();
            }
            "REVIEW__SYSTEM_ACTOR" => {
                self.review.system_actor = value.to_string();
            }
            "CLASSIFICATION__REPORT__STRONG" => {
                self.classification.report.strong = parse_value(path, value)?;
            }
            "CLASSIFICATION__REPORT__POSSIBLE" => {
                self.classification.report.possible = parse_value(path, value)?;
            }
            "CLASSIFICATION__REPORT__LOW" => {
                self.classification.report.low = parse_value(path, value)?;
            }
            "CLASSIFICATION__CLUSTER__STRONG" => {
                self.classification.cluster.strong = parse_value(path, value)?;
            }
            "CLASSIFICATION__CLUSTER__POSSIBLE" => {
                self.classification.cluster.possible = parse_value(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Classifier built from the configured cut points
    pub fn classifier(&self) -> DuplicateClassifier {
        DuplicateClassifier::new(self.classification.report, self.classification.cluster)
    }

    /// Filter graph built from the configured chains
    pub fn filter_graph(&self) -> Result<FilterGraph> {
        FilterGraph::from_config(&self.filters)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HazardError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("hazardwatch").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| HazardError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            classification: ClassificationConfig::default(),
            review: ReviewConfig::default(),
            filters: FiltersConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s"), Some(Duration::from_secs(1)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration("3d"), None);
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        assert_eq!(parse_duration("307445734561825861m"), None);
        assert_eq!(parse_duration("5124095576030432h"), None);
        assert_eq!(
            parse_duration("307445734561825860m"),
            Some(Duration::from_secs(307445734561825860 * 60))
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vec![
            ("HAZARDWATCH_REVIEW__AUTO_CONFIRM_TICKS".to_string(), "30".to_string()),
            ("HAZARDWATCH_CLASSIFICATION__REPORT__STRONG".to_string(), "0.9".to_string()),
            ("HAZARDWATCH_REVIEW__SYSTEM_ACTOR".to_string(), "Auto".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ]);
        assert_eq!(config.review.auto_confirm_ticks, 30);
        assert_eq!(config.classification.report.strong, 0.9);
        assert_eq!(config.review.system_actor, "Auto");
    }

    #[test]
    fn test_bad_env_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(vec![(
            "HAZARDWATCH_REVIEW__AUTO_CONFIRM_TICKS".to_string(),
            "soon".to_string(),
        )]);
        assert_eq!(config.review.auto_confirm_ticks, DEFAULT_AUTO_CONFIRM_TICKS);
    }

    #[test]
    fn test_apply_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "demo".to_string(),
            ProfileOverrides {
                auto_confirm_ticks: Some(5),
                tick_interval: Some("100ms".to_string()),
            },
        );
        config.apply_profile("demo").unwrap();
        assert_eq!(config.review.auto_confirm_ticks, 5);
        assert_eq!(config.review.tick_duration().unwrap(), Duration::from_millis(100));
        assert!(config.apply_profile("missing").is_err());
    }
}
