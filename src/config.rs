use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::ModelVersion;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Which probability model to run (v1 or v2)
    pub model_version: ModelVersion,
    /// Bankroll in dollars, the base for stake sizing
    pub bankroll: Decimal,
    /// League-average passing TDs per game, the v2 normalization baseline
    #[serde(default = "default_league_td_rate")]
    pub league_avg_td_rate: f64,
}

fn default_league_td_rate() -> f64 {
    1.5
}

/// Decision thresholds that gate whether a prediction is actionable.
///
/// Passed by value into tracker/calibrator calls; the engine never reads
/// these from ambient state. The currently applied set lives in storage
/// and is only changed through `Calibrator::apply_calibration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum edge percentage for an actionable prediction
    pub edge_threshold: f64,
    /// Minimum model confidence score (v2 only; v1 predictions pass)
    pub confidence_threshold: f64,
    /// Minimum days between prediction and event resolution
    pub min_hold_days: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            edge_threshold: 5.0,
            confidence_threshold: 0.5,
            min_hold_days: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    /// Precision the recommended edge threshold must reach
    #[serde(default = "default_precision_target")]
    pub precision_target: f64,
    /// Trailing window length in weeks
    #[serde(default = "default_weeks_back")]
    pub weeks_back: i32,
    /// Resolved outcomes required before a recommendation is made
    #[serde(default = "default_min_resolved_sample")]
    pub min_resolved_sample: usize,
}

fn default_precision_target() -> f64 {
    0.55
}

fn default_weeks_back() -> i32 {
    6
}

fn default_min_resolved_sample() -> usize {
    20
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            precision_target: default_precision_target(),
            weeks_back: default_weeks_back(),
            min_resolved_sample: default_min_resolved_sample(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .set_default("engine.league_avg_td_rate", 1.5)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("GRIDEDGE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (GRIDEDGE_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("GRIDEDGE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_default() {
        let t = Thresholds::default();
        assert_eq!(t.edge_threshold, 5.0);
        assert_eq!(t.min_hold_days, 0);
    }

    #[test]
    fn test_thresholds_roundtrip() {
        let t = Thresholds {
            edge_threshold: 8.0,
            confidence_threshold: 0.6,
            min_hold_days: 2,
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: Thresholds = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn test_calibration_defaults() {
        let c = CalibrationConfig::default();
        assert_eq!(c.min_resolved_sample, 20);
        assert!(c.precision_target > 0.5);
    }
}
