//! Indicator computation — the collaborator's side of the feed.
//!
//! Indicators are pure functions: bar history in, numeric series out. They
//! are precomputed once before the bar loop and handed to the core as
//! [`IndicatorValues`], keyed by the strategy's [`FeedKeys`]. The first
//! `lookback()` values of every series are `f64::NAN` (warmup).
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or later.

pub mod ema;
pub mod macd;
pub mod parabolic_sar;

pub use ema::{ema_of_series, Ema};
pub use macd::MacdCross;
pub use parabolic_sar::ParabolicSar;

use crate::config::IndicatorConfig;
use trendgate_core::domain::BarSnapshot;
use trendgate_core::{FeedKeys, IndicatorValues};

pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_200").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[BarSnapshot]) -> Vec<f64>;
}

/// The three indicators the strategy reads, built from config.
pub fn build_indicators(config: &IndicatorConfig) -> [Box<dyn Indicator>; 3] {
    [
        Box::new(Ema::new(config.trend_period)),
        Box::new(MacdCross::new(
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        )),
        Box::new(ParabolicSar::new(
            config.sar_af_start,
            config.sar_af_step,
            config.sar_af_max,
        )),
    ]
}

/// Compute trend filter, cross signal and stop level for every bar.
pub fn precompute(bars: &[BarSnapshot], config: &IndicatorConfig, keys: &FeedKeys) -> IndicatorValues {
    let [trend, cross, stop] = build_indicators(config);
    let mut values = IndicatorValues::new();
    values.insert(keys.trend_filter.clone(), trend.compute(bars));
    values.insert(keys.cross_signal.clone(), cross.compute(bars));
    values.insert(keys.stop_level.clone(), stop.compute(bars));
    values
}

/// Longest warmup among the configured indicators.
pub fn warmup_bars(config: &IndicatorConfig) -> usize {
    build_indicators(config)
        .iter()
        .map(|i| i.lookback())
        .max()
        .unwrap_or(0)
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<BarSnapshot> {
    use chrono::{Duration, TimeZone, Utc};
    let start = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            BarSnapshot::new(
                start + Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() < eps,
        "expected {expected}, got {actual}"
    );
}
