//! Indicator feed adapter.
//!
//! The collaborator computes indicator series; this module only reads them.
//! `IndicatorValues` holds named per-bar series and `FeedAdapter` folds the
//! three readings the engine needs into one [`IndicatorSnapshot`] per bar.

use crate::domain::IndicatorSnapshot;
use crate::error::{ConfigError, EngineError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container for precomputed indicator series.
///
/// Built once before the bar loop, then queried by bar index during the loop.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Names of the three series that make up a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedKeys {
    pub trend_filter: String,
    pub cross_signal: String,
    pub stop_level: String,
}

impl Default for FeedKeys {
    fn default() -> Self {
        Self {
            trend_filter: "trend_filter".into(),
            cross_signal: "cross_signal".into(),
            stop_level: "stop_level".into(),
        }
    }
}

impl FeedKeys {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trend_filter.is_empty() {
            return Err(ConfigError::EmptyFeedKey("trend_filter"));
        }
        if self.cross_signal.is_empty() {
            return Err(ConfigError::EmptyFeedKey("cross_signal"));
        }
        if self.stop_level.is_empty() {
            return Err(ConfigError::EmptyFeedKey("stop_level"));
        }
        Ok(())
    }
}

/// Wraps the collaborator's per-bar indicator outputs into snapshots.
#[derive(Debug, Clone, Default)]
pub struct FeedAdapter {
    keys: FeedKeys,
}

impl FeedAdapter {
    pub fn new(keys: FeedKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &FeedKeys {
        &self.keys
    }

    /// Snapshot for `bar_index`.
    ///
    /// `Ok(None)` while any series is missing or still NaN (indicator warmup).
    /// Readings that are present but unusable are an `InvalidSnapshot`.
    pub fn snapshot(
        &self,
        values: &IndicatorValues,
        bar_index: usize,
    ) -> Result<Option<IndicatorSnapshot>, EngineError> {
        let read = |key: &str| values.get(key, bar_index).filter(|v| !v.is_nan());

        let (Some(trend_filter), Some(cross_signal), Some(stop_level)) = (
            read(&self.keys.trend_filter),
            read(&self.keys.cross_signal),
            read(&self.keys.stop_level),
        ) else {
            return Ok(None);
        };

        let snapshot = IndicatorSnapshot::new(trend_filter, cross_signal, stop_level);
        snapshot
            .validate()
            .map_err(|reason| EngineError::invalid(format!("bar {bar_index}: {reason}")))?;
        Ok(Some(snapshot))
    }
}
