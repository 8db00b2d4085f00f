//! Per-step inputs to the decision engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC bar for the traded instrument at one time step.
///
/// Produced by the collaborator in strictly increasing timestamp order. The
/// engine consumes it and keeps nothing beyond the previous timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSnapshot {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl BarSnapshot {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Check prices for NaN, non-positive values and OHLC inconsistencies.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_void() {
            return Err(format!("NaN price in bar at {}", self.timestamp));
        }
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(format!(
                "non-positive or infinite price in bar at {}",
                self.timestamp
            ));
        }
        if self.high < self.low {
            return Err(format!(
                "high {} below low {} at {}",
                self.high, self.low, self.timestamp
            ));
        }
        if self.open > self.high || self.open < self.low {
            return Err(format!("open {} outside [low, high] at {}", self.open, self.timestamp));
        }
        if self.close > self.high || self.close < self.low {
            return Err(format!(
                "close {} outside [low, high] at {}",
                self.close, self.timestamp
            ));
        }
        Ok(())
    }
}

/// Indicator readings paired 1:1 with a [`BarSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Slow trend filter on the price scale (e.g. a 200-period EMA).
    pub trend_filter: f64,
    /// Signed momentum cross: > 0 bullish, < 0 bearish, 0 neutral.
    pub cross_signal: f64,
    /// Trailing stop value on the price scale (parabolic SAR).
    pub stop_level: f64,
}

impl IndicatorSnapshot {
    pub fn new(trend_filter: f64, cross_signal: f64, stop_level: f64) -> Self {
        Self {
            trend_filter,
            cross_signal,
            stop_level,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.trend_filter.is_finite() || self.trend_filter <= 0.0 {
            return Err(format!("invalid trend filter {}", self.trend_filter));
        }
        if !self.stop_level.is_finite() || self.stop_level <= 0.0 {
            return Err(format!("invalid stop level {}", self.stop_level));
        }
        if !self.cross_signal.is_finite() {
            return Err(format!("invalid cross signal {}", self.cross_signal));
        }
        Ok(())
    }

    /// Regime convention: price exactly on the filter is bullish.
    pub fn is_bullish(&self, close: f64) -> bool {
        close >= self.trend_filter
    }
}
