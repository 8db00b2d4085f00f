//! Cross latch: remembers the last momentum cross until it is acted on.
//!
//! A cross often happens on a bar where the trailing stop still sits on the
//! wrong side of price. The latch keeps the bias armed so the entry can be
//! taken on a later bar, until the entry is taken or the opposite cross
//! replaces it. A zero reading leaves the latch unchanged.

use serde::{Deserialize, Serialize};

/// Directional bias armed by the cross signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bias {
    #[default]
    None,
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Default)]
pub struct CrossLatch {
    bias: Bias,
}

impl CrossLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bias(&self) -> Bias {
        self.bias
    }

    /// Fold one cross reading into the latch and return the resulting bias.
    pub fn observe(&mut self, cross_signal: f64) -> Bias {
        if cross_signal > 0.0 {
            self.bias = Bias::Bullish;
        } else if cross_signal < 0.0 {
            self.bias = Bias::Bearish;
        }
        self.bias
    }

    /// Disarm after an entry; returns the bias that was consumed.
    pub fn consume(&mut self) -> Bias {
        std::mem::take(&mut self.bias)
    }

    /// Put back a bias whose entry never happened (rejected or cancelled).
    ///
    /// A cross observed after the consume takes precedence.
    pub fn restore(&mut self, bias: Bias) {
        if self.bias == Bias::None {
            self.bias = bias;
        }
    }
}
