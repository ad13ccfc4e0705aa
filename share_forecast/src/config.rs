//! Configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [pipeline]
//! current_year = 2025
//! latest_week_query = "completed_weeks"
//!
//! [pipeline.amg]
//! query = "amg_totals"
//!
//! [pipeline.market]
//! query = "market_totals"
//!
//! [pipeline.model]
//! n_estimators = 100
//! seed = 42
//!
//! [data]
//! dir = "data"
//!
//! [output]
//! path = "forecasts/market_share_forecasts_ytd.csv"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use crate::error::{ForecastError, Result};
use crate::family::MetricFamily;
use crate::models::forest::ForestParams;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Everything the forecasting pipeline needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Year being forecast; earlier years are training data
    #[serde(default = "default_current_year")]
    pub current_year: i32,
    /// Query answering "latest completed week". Must not name a family table:
    /// its last row would be the latest week, leaving no row to forecast from.
    #[serde(default = "default_latest_week_query")]
    pub latest_week_query: String,
    #[serde(default = "FamilyConfig::amg")]
    pub amg: FamilyConfig,
    #[serde(default = "FamilyConfig::market")]
    pub market: FamilyConfig,
    #[serde(default)]
    pub model: ForestParams,
}

/// Per-family data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyConfig {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Directory holding one CSV per query
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Forecast table, replaced on every run
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

fn default_current_year() -> i32 {
    chrono::Utc::now().year()
}

fn default_latest_week_query() -> String {
    "completed_weeks".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("forecasts/market_share_forecasts_ytd.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FamilyConfig {
    pub fn amg() -> Self {
        Self {
            query: "amg_totals".to_string(),
        }
    }

    pub fn market() -> Self {
        Self {
            query: "market_totals".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(default_current_year())
    }
}

impl PipelineConfig {
    /// Default queries and model for `current_year`
    pub fn new(current_year: i32) -> Self {
        Self {
            current_year,
            latest_week_query: default_latest_week_query(),
            amg: FamilyConfig::amg(),
            market: FamilyConfig::market(),
            model: ForestParams::default(),
        }
    }

    pub fn family(&self, family: MetricFamily) -> &FamilyConfig {
        match family {
            MetricFamily::Amg => &self.amg,
            MetricFamily::Market => &self.market,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1900..=9999).contains(&self.current_year) {
            return Err(ForecastError::InvalidParameter(format!(
                "current_year {} is out of range",
                self.current_year
            )));
        }

        let queries = [
            ("latest_week_query", &self.latest_week_query),
            ("amg.query", &self.amg.query),
            ("market.query", &self.market.query),
        ];
        if let Some((name, _)) = queries.iter().find(|(_, q)| q.trim().is_empty()) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} must not be empty",
                name
            )));
        }

        if let Some(family) = MetricFamily::ALL
            .into_iter()
            .find(|f| self.family(*f).query.trim() == self.latest_week_query.trim())
        {
            return Err(ForecastError::InvalidParameter(format!(
                "latest_week_query '{}' is the {} table; use a table of completed weeks",
                self.latest_week_query, family
            )));
        }

        self.model.validate()
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> std::result::Result<Self, ConfigError> {
        let config: ForecastConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.pipeline
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.level must not be empty".into(),
            ));
        }

        Ok(())
    }
}
