//! Parabolic SAR (Wilder), used as the stop level.
//!
//! Inherently sequential: maintains direction, extreme point (EP) and
//! acceleration factor (AF).
//!
//! Parameters: af_start (default 0.02), af_step (default 0.02), af_max (default 0.20).
//! Lookback: 1 (needs at least 2 bars to start).

use super::Indicator;
use trendgate_core::domain::BarSnapshot;

#[derive(Debug, Clone)]
pub struct ParabolicSar {
    af_start: f64,
    af_step: f64,
    af_max: f64,
    name: String,
}

impl ParabolicSar {
    pub fn new(af_start: f64, af_step: f64, af_max: f64) -> Self {
        assert!(af_start > 0.0, "AF start must be > 0");
        assert!(af_step > 0.0, "AF step must be > 0");
        assert!(af_max >= af_start, "AF max must be >= AF start");
        Self {
            af_start,
            af_step,
            af_max,
            name: format!("psar_{af_start}_{af_step}_{af_max}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(0.02, 0.02, 0.20)
    }
}

impl Indicator for ParabolicSar {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[BarSnapshot]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < 2 || bars[..2].iter().any(|b| b.is_void()) {
            return result;
        }

        // Initial direction from the first two closes.
        let mut is_long = bars[1].close >= bars[0].close;
        let mut af = self.af_start;
        let (mut sar, mut ep) = if is_long {
            (bars[0].low, bars[1].high)
        } else {
            (bars[0].high, bars[1].low)
        };
        result[1] = sar;

        for i in 2..n {
            let bar = &bars[i];
            if bar.is_void() {
                continue;
            }

            let mut next = sar + af * (ep - sar);

            if is_long {
                // Never above the two previous lows.
                next = next.min(bars[i - 1].low).min(bars[i - 2].low);
                if bar.low < next {
                    is_long = false;
                    next = ep;
                    ep = bar.low;
                    af = self.af_start;
                } else if bar.high > ep {
                    ep = bar.high;
                    af = (af + self.af_step).min(self.af_max);
                }
            } else {
                // Never below the two previous highs.
                next = next.max(bars[i - 1].high).max(bars[i - 2].high);
                if bar.high > next {
                    is_long = true;
                    next = ep;
                    ep = bar.high;
                    af = self.af_start;
                } else if bar.low < ep {
                    ep = bar.low;
                    af = (af + self.af_step).min(self.af_max);
                }
            }

            sar = next;
            result[i] = sar;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<BarSnapshot> {
        let start = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| {
                BarSnapshot::new(start + Duration::minutes(15 * i as i64), open, high, low, close)
            })
            .collect()
    }

    #[test]
    fn psar_uptrend_below_price() {
        let data: Vec<_> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 3.0;
                (base, base + 2.0, base - 1.0, base + 1.5)
            })
            .collect();
        let bars = make_ohlc_bars(&data);
        let result = ParabolicSar::default_params().compute(&bars);

        for i in 2..10 {
            assert!(
                result[i] < bars[i].low,
                "PSAR ({}) should be below low ({}) at bar {i} in uptrend",
                result[i],
                bars[i].low,
            );
        }
    }

    #[test]
    fn psar_reversal_flips_above_price() {
        let data = [
            (100.0, 105.0, 98.0, 103.0),
            (103.0, 108.0, 101.0, 107.0),
            (107.0, 112.0, 105.0, 111.0),
            (111.0, 115.0, 109.0, 114.0),
            (114.0, 114.5, 100.0, 101.0),
            (101.0, 102.0, 95.0, 96.0),
            (96.0, 97.0, 90.0, 91.0),
        ];
        let bars = make_ohlc_bars(&data);
        let result = ParabolicSar::default_params().compute(&bars);

        assert!(result[3] < bars[3].close);
        assert!(result[4] < bars[4].close);
        // Reversal bar: SAR jumps to the prior extreme point.
        assert_eq!(result[5], 115.0);
        assert!(result[6] > bars[6].close);
    }

    #[test]
    fn psar_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        let result = ParabolicSar::default_params().compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn psar_long_trend_stays_valid() {
        let data: Vec<_> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64;
                (base, base + 1.0, base - 0.5, base + 0.8)
            })
            .collect();
        let result = ParabolicSar::new(0.02, 0.02, 0.10).compute(&make_ohlc_bars(&data));
        assert_eq!(result.iter().filter(|v| !v.is_nan()).count(), 29);
    }

    #[test]
    fn psar_lookback() {
        assert_eq!(ParabolicSar::default_params().lookback(), 1);
    }
}
