//! Bracket levels and intrabar exit resolution.
//!
//! The bracket is symmetric around the entry bar's close: the stop sits at the
//! trailing stop value and the take-profit sits the same distance on the other
//! side (`take_profit = close * 2 - stop_level`). The same formula serves both
//! directions because a short entry requires `stop_level > close`.
//!
//! A bar-only feed cannot tell whether high or low traded first, so
//! [`BracketLevels::resolve`] fixes the order per direction:
//! - Long: take-profit is checked before stop-loss (profit priority).
//! - Short: stop-loss is checked before take-profit (loss priority).
//!
//! The simulated broker resolves OCO pairs with the same function so both
//! sides agree on which leg filled.

use crate::domain::{
    Direction, ExitReason, IdGen, IntentRole, OrderIntent, OrderKind, PositionState,
};
use serde::{Deserialize, Serialize};

/// Take-profit and stop-loss prices of one bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketLevels {
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl BracketLevels {
    /// Symmetric-distance bracket from the entry bar's close and stop level.
    pub fn from_entry(close: f64, stop_level: f64) -> Self {
        Self {
            take_profit: close * 2.0 - stop_level,
            stop_loss: stop_level,
        }
    }

    pub fn of(position: &PositionState) -> Self {
        Self {
            take_profit: position.take_profit_price,
            stop_loss: position.stop_loss_price,
        }
    }

    /// Both levels must be tradable prices on the correct sides.
    pub fn is_valid_for(&self, direction: Direction) -> bool {
        if !(self.take_profit > 0.0 && self.stop_loss > 0.0) {
            return false;
        }
        match direction {
            Direction::Long => self.take_profit > self.stop_loss,
            Direction::Short => self.take_profit < self.stop_loss,
            Direction::Flat => false,
        }
    }

    /// Which level, if any, the bar's range touched, with its fill price.
    pub fn resolve(&self, direction: Direction, high: f64, low: f64) -> Option<(ExitReason, f64)> {
        match direction {
            Direction::Long => {
                if high >= self.take_profit {
                    Some((ExitReason::TakeProfit, self.take_profit))
                } else if low <= self.stop_loss {
                    Some((ExitReason::StopLoss, self.stop_loss))
                } else {
                    None
                }
            }
            Direction::Short => {
                if high >= self.stop_loss {
                    Some((ExitReason::StopLoss, self.stop_loss))
                } else if low <= self.take_profit {
                    Some((ExitReason::TakeProfit, self.take_profit))
                } else {
                    None
                }
            }
            Direction::Flat => None,
        }
    }

    /// Build the OCO leg pair closing `size` units of a `direction` position.
    ///
    /// Returns `(take_profit, stop_loss)`; each leg links the other.
    pub fn legs(
        &self,
        direction: Direction,
        size: f64,
        ids: &mut IdGen,
    ) -> Option<(OrderIntent, OrderIntent)> {
        let side = direction.exit_side()?;
        let tp_id = ids.next_intent_id();
        let sl_id = ids.next_intent_id();

        let take_profit = OrderIntent {
            id: tp_id,
            side,
            kind: OrderKind::Limit {
                price: self.take_profit,
            },
            size,
            linked: Some(sl_id),
            role: IntentRole::TakeProfit,
        };
        let stop_loss = OrderIntent {
            id: sl_id,
            side,
            kind: OrderKind::Stop {
                price: self.stop_loss,
            },
            size,
            linked: Some(tp_id),
            role: IntentRole::StopLoss,
        };
        Some((take_profit, stop_loss))
    }
}
