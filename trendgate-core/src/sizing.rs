//! Per-direction position multipliers.
//!
//! Each direction carries a multiplier that starts at the base unit, grows
//! after a favourable closed trade and shrinks after an adverse one:
//!
//! ```text
//! multiplier += (exit - entry) * direction_sign * scale_factor
//! multiplier  = max(multiplier, floor)
//! ```
//!
//! A regime flip away from a direction resets that direction's multiplier to
//! the base unit. The floor keeps the strategy trading after a losing streak.

use crate::domain::{Direction, PositionState};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Parameters of the sizing rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingPolicy {
    /// Multiplier value after a reset.
    pub base_unit: f64,
    /// Converts a per-unit price move into a multiplier delta.
    pub scale_factor: f64,
    /// Lowest multiplier a trade update may leave behind.
    pub floor: f64,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            base_unit: 1.0,
            scale_factor: 0.01,
            floor: 1.0,
        }
    }
}

impl SizingPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_unit.is_finite() && self.base_unit > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "base_unit",
                requirement: "> 0",
                value: self.base_unit,
            });
        }
        if !(self.scale_factor.is_finite() && self.scale_factor >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "scale_factor",
                requirement: ">= 0",
                value: self.scale_factor,
            });
        }
        if !(self.floor.is_finite() && self.floor > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "floor",
                requirement: "> 0",
                value: self.floor,
            });
        }
        if self.floor > self.base_unit {
            return Err(ConfigError::OutOfRange {
                field: "floor",
                requirement: "<= base_unit",
                value: self.floor,
            });
        }
        Ok(())
    }
}

/// The two multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingState {
    pub long_multiplier: f64,
    pub short_multiplier: f64,
}

/// Owns the [`SizingState`] and applies the [`SizingPolicy`].
#[derive(Debug, Clone)]
pub struct SizingController {
    policy: SizingPolicy,
    state: SizingState,
}

impl SizingController {
    pub fn new(policy: SizingPolicy) -> Self {
        Self {
            policy,
            state: SizingState {
                long_multiplier: policy.base_unit,
                short_multiplier: policy.base_unit,
            },
        }
    }

    pub fn policy(&self) -> &SizingPolicy {
        &self.policy
    }

    pub fn state(&self) -> SizingState {
        self.state
    }

    /// Multiplier that sizes the next entry in `direction`. Zero when flat.
    pub fn multiplier(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.state.long_multiplier,
            Direction::Short => self.state.short_multiplier,
            Direction::Flat => 0.0,
        }
    }

    /// Reset `direction`'s multiplier to the base unit.
    pub fn reset(&mut self, direction: Direction) {
        let base = self.policy.base_unit;
        match direction {
            Direction::Long => self.state.long_multiplier = base,
            Direction::Short => self.state.short_multiplier = base,
            Direction::Flat => {}
        }
    }

    /// Apply a closed trade's outcome and return the updated multiplier.
    pub fn record_trade(&mut self, direction: Direction, entry_price: f64, exit_price: f64) -> f64 {
        let delta = (exit_price - entry_price) * direction.sign() * self.policy.scale_factor;
        let floor = self.policy.floor;
        let slot = match direction {
            Direction::Long => &mut self.state.long_multiplier,
            Direction::Short => &mut self.state.short_multiplier,
            Direction::Flat => return 0.0,
        };
        *slot = (*slot + delta).max(floor);
        *slot
    }

    /// Apply the outcome of closing `position` at `exit_price`.
    pub fn record_close(&mut self, position: &PositionState, exit_price: f64) -> f64 {
        self.record_trade(position.direction, position.entry_price, exit_price)
    }
}
