//! MACD line / signal line cross, used as the cross signal.
//!
//! MACD = EMA(fast) - EMA(slow) of closes; signal = EMA(signal) of MACD.
//! Output per bar: +1.0 where MACD crosses above its signal line, -1.0 where
//! it crosses below, 0.0 otherwise.
//! Lookback: slow + signal - 1 (a cross needs the previous bar's lines too).

use super::ema::ema_of_series;
use super::Indicator;
use trendgate_core::domain::BarSnapshot;

#[derive(Debug, Clone)]
pub struct MacdCross {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl MacdCross {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be below slow period");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_cross_{fast}_{slow}_{signal}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(12, 26, 9)
    }

    /// MACD and signal line series.
    pub fn lines(&self, bars: &[BarSnapshot]) -> (Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        // Signal EMA starts where the MACD line does.
        let mut signal = vec![f64::NAN; macd.len()];
        if let Some(first) = macd.iter().position(|v| !v.is_nan()) {
            let tail = ema_of_series(&macd[first..], self.signal);
            signal[first..].copy_from_slice(&tail);
        }
        (macd, signal)
    }
}

impl Indicator for MacdCross {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 1
    }

    fn compute(&self, bars: &[BarSnapshot]) -> Vec<f64> {
        let (macd, signal) = self.lines(bars);
        let mut result = vec![f64::NAN; bars.len()];

        for i in 1..bars.len() {
            let prev = macd[i - 1] - signal[i - 1];
            let curr = macd[i] - signal[i];
            if prev.is_nan() || curr.is_nan() {
                continue;
            }
            result[i] = if prev <= 0.0 && curr > 0.0 {
                1.0
            } else if prev >= 0.0 && curr < 0.0 {
                -1.0
            } else {
                0.0
            };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn v_shape(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                if i < n / 2 {
                    200.0 - i as f64
                } else {
                    200.0 - (n / 2) as f64 + (i - n / 2) as f64 * 1.5
                }
            })
            .collect()
    }

    #[test]
    fn warmup_is_nan() {
        let macd = MacdCross::new(3, 6, 3);
        let result = macd.compute(&make_bars(&v_shape(40)));
        assert_eq!(macd.lookback(), 8);
        assert!(result[..8].iter().all(|v| v.is_nan()));
        assert!(!result[8].is_nan());
    }

    #[test]
    fn sine_wave_crosses_alternate() {
        let closes: Vec<f64> = (0..240)
            .map(|i| 100.0 + 10.0 * (i as f64 * std::f64::consts::TAU / 40.0).sin())
            .collect();
        let result = MacdCross::default_params().compute(&make_bars(&closes));

        let crosses: Vec<f64> = result
            .iter()
            .copied()
            .filter(|v| !v.is_nan() && *v != 0.0)
            .collect();
        assert!(crosses.iter().filter(|v| **v == 1.0).count() >= 3);
        assert!(crosses.iter().filter(|v| **v == -1.0).count() >= 3);
        assert!(crosses.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn signal_line_starts_after_macd() {
        let macd = MacdCross::default_params();
        let (line, signal) = macd.lines(&make_bars(&v_shape(80)));
        assert!(line[24].is_nan());
        assert!(!line[25].is_nan());
        assert!(signal[32].is_nan());
        assert!(!signal[33].is_nan());
    }
}
