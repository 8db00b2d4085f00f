//! Serializable run configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use trendgate_core::StrategyConfig;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy config: {0}")]
    Strategy(#[from] trendgate_core::ConfigError),

    #[error("invalid indicator config: {0}")]
    Indicator(String),

    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("initial_cash must be > 0 (got {0})")]
    InitialCash(f64),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything needed to reproduce a session.
///
/// Every field has a default; an empty TOML file reproduces the original
/// driver's setup (BTC-USDT 15-minute bars, 2022-02-01..2022-02-08, 100k cash).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub data: DataConfig,
    pub indicators: IndicatorConfig,
    pub strategy: StrategyConfig,
    pub initial_cash: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            indicators: IndicatorConfig::default(),
            strategy: StrategyConfig::default(),
            initial_cash: 100_000.0,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.indicators.validate()?;
        if self.data.start > self.data.end {
            return Err(ConfigError::DateRange {
                start: self.data.start,
                end: self.data.end,
            });
        }
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::InitialCash(self.initial_cash));
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Where bars come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// CSV file with `Datetime,Open,High,Low,Close,Volume` rows.
    pub path: PathBuf,
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
    /// Generate this many synthetic bars instead of reading `path`.
    pub synthetic: Option<usize>,
    /// Seed label for synthetic bars.
    pub seed: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("datas/15min_BTC-USDT.csv"),
            start: NaiveDate::from_ymd_opt(2022, 2, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2022, 2, 8).unwrap_or_default(),
            synthetic: None,
            seed: "trendgate".into(),
        }
    }
}

/// Indicator parameters used by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Trend filter EMA period.
    pub trend_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sar_af_start: f64,
    pub sar_af_step: f64,
    pub sar_af_max: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            trend_period: 200,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sar_af_start: 0.02,
            sar_af_step: 0.02,
            sar_af_max: 0.20,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trend_period == 0 || self.macd_fast == 0 || self.macd_signal == 0 {
            return Err(ConfigError::Indicator("periods must be >= 1".into()));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::Indicator(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        if !(self.sar_af_start > 0.0 && self.sar_af_step > 0.0) {
            return Err(ConfigError::Indicator(
                "SAR acceleration factors must be > 0".into(),
            ));
        }
        if self.sar_af_max < self.sar_af_start {
            return Err(ConfigError::Indicator(format!(
                "sar_af_max ({}) must be >= sar_af_start ({})",
                self.sar_af_max, self.sar_af_start
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_matches_original_driver() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.initial_cash, 100_000.0);
        assert_eq!(config.data.start, NaiveDate::from_ymd_opt(2022, 2, 1).unwrap());
        assert_eq!(config.data.end, NaiveDate::from_ymd_opt(2022, 2, 8).unwrap());
        assert_eq!(config.indicators.trend_period, 200);
    }

    #[test]
    fn nested_tables_override() {
        let config = RunConfig::from_toml_str(
            r#"
            initial_cash = 5000.0

            [data]
            synthetic = 2000
            start = "2022-03-01"
            end = "2022-03-31"

            [indicators]
            trend_period = 50

            [strategy.sizing]
            scale_factor = 0.001
            "#,
        )
        .unwrap();
        assert_eq!(config.initial_cash, 5000.0);
        assert_eq!(config.data.synthetic, Some(2000));
        assert_eq!(config.indicators.trend_period, 50);
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.strategy.sizing.scale_factor, 0.001);
    }

    #[test]
    fn inverted_date_range_rejected() {
        let err = RunConfig::from_toml_str(
            r#"
            [data]
            start = "2022-02-08"
            end = "2022-02-01"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DateRange { .. }));
    }

    #[test]
    fn bad_sizing_rejected() {
        let err = RunConfig::from_toml_str(
            r#"
            [strategy.sizing]
            floor = 3.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Strategy(_)));
    }

    #[test]
    fn bad_macd_rejected() {
        let mut config = RunConfig::default();
        config.indicators.macd_fast = 30;
        assert!(matches!(config.validate(), Err(ConfigError::Indicator(_))));
    }

    #[test]
    fn run_id_deterministic() {
        let config = RunConfig::default();
        let id1 = config.run_id().unwrap();
        let id2 = config.run_id().unwrap();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn run_id_changes_with_params() {
        let a = RunConfig::default();
        let mut b = RunConfig::default();
        b.strategy.sizing.scale_factor = 0.02;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }
}
