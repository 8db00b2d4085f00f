use super::ids::IntentId;
use super::order::OrderSide;
use serde::{Deserialize, Serialize};

/// Direction of the single tracked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Flat,
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Flat => 0.0,
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    /// Side of the order that opens a position in this direction.
    pub fn entry_side(&self) -> Option<OrderSide> {
        match self {
            Direction::Flat => None,
            Direction::Long => Some(OrderSide::Buy),
            Direction::Short => Some(OrderSide::Sell),
        }
    }

    /// Side of the order that closes a position in this direction.
    pub fn exit_side(&self) -> Option<OrderSide> {
        match self {
            Direction::Flat => None,
            Direction::Long => Some(OrderSide::Sell),
            Direction::Short => Some(OrderSide::Buy),
        }
    }
}

/// The engine's single position, including its bracket.
///
/// Fixed shape: the bracket leg references are always present as fields,
/// `None` when no leg is outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
    /// True once both bracket legs are acknowledged by the collaborator.
    pub has_open_bracket: bool,
    pub take_profit_leg: Option<IntentId>,
    pub stop_loss_leg: Option<IntentId>,
}

impl PositionState {
    pub fn flat() -> Self {
        Self {
            direction: Direction::Flat,
            size: 0.0,
            entry_price: 0.0,
            take_profit_price: 0.0,
            stop_loss_price: 0.0,
            has_open_bracket: false,
            take_profit_leg: None,
            stop_loss_leg: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.direction.sign() * self.size * (current_price - self.entry_price)
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::flat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_signs_and_sides() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Flat.sign(), 0.0);
        assert_eq!(Direction::Long.entry_side(), Some(OrderSide::Buy));
        assert_eq!(Direction::Short.exit_side(), Some(OrderSide::Buy));
        assert_eq!(Direction::Flat.entry_side(), None);
    }

    #[test]
    fn short_unrealized_pnl() {
        let pos = PositionState {
            direction: Direction::Short,
            size: 2.0,
            entry_price: 100.0,
            ..PositionState::flat()
        };
        assert_eq!(pos.unrealized_pnl(95.0), 10.0);
    }
}
