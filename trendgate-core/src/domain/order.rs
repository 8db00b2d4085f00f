//! Order intents, cancellation requests and broker outcomes.
//!
//! These are the only values exchanged with the collaborator. The engine emits
//! intents and cancels; the collaborator answers with outcomes.

use super::ids::IntentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order kind and its price parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Fill at the next available price.
    Market,
    /// Fill at the limit price or better.
    Limit { price: f64 },
    /// Becomes a market order once the stop price trades.
    Stop { price: f64 },
}

impl OrderKind {
    pub fn price(&self) -> Option<f64> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit { price } | OrderKind::Stop { price } => Some(*price),
        }
    }
}

/// What the intent is for, from the engine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentRole {
    Entry,
    TakeProfit,
    StopLoss,
    /// Market close issued by a regime-invalidation exit.
    ForcedExit,
}

impl IntentRole {
    pub fn is_bracket_leg(&self) -> bool {
        matches!(self, IntentRole::TakeProfit | IntentRole::StopLoss)
    }
}

/// An order the engine asks the collaborator to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub id: IntentId,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub size: f64,
    /// One-cancels-other sibling, set on both bracket legs.
    pub linked: Option<IntentId>,
    pub role: IntentRole,
}

/// Request to cancel a previously emitted intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub intent_id: IntentId,
    pub reason: String,
}

/// Broker-side status reported back for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// The order is live at the broker.
    Accepted,
    Filled,
    Canceled,
    Rejected,
}

/// Outcome of an intent, reported by the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub intent_id: IntentId,
    pub kind: OutcomeKind,
    pub side: OrderSide,
    /// Present only for `Filled`.
    pub executed_price: Option<f64>,
}

impl OrderOutcome {
    pub fn accepted(intent_id: IntentId, side: OrderSide) -> Self {
        Self {
            intent_id,
            kind: OutcomeKind::Accepted,
            side,
            executed_price: None,
        }
    }

    pub fn filled(intent_id: IntentId, side: OrderSide, price: f64) -> Self {
        Self {
            intent_id,
            kind: OutcomeKind::Filled,
            side,
            executed_price: Some(price),
        }
    }

    pub fn canceled(intent_id: IntentId, side: OrderSide) -> Self {
        Self {
            intent_id,
            kind: OutcomeKind::Canceled,
            side,
            executed_price: None,
        }
    }

    pub fn rejected(intent_id: IntentId, side: OrderSide) -> Self {
        Self {
            intent_id,
            kind: OutcomeKind::Rejected,
            side,
            executed_price: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_kind_price() {
        assert_eq!(OrderKind::Market.price(), None);
        assert_eq!(OrderKind::Limit { price: 110.0 }.price(), Some(110.0));
        assert_eq!(OrderKind::Stop { price: 95.0 }.price(), Some(95.0));
    }

    #[test]
    fn bracket_roles() {
        assert!(IntentRole::TakeProfit.is_bracket_leg());
        assert!(IntentRole::StopLoss.is_bracket_leg());
        assert!(!IntentRole::Entry.is_bracket_leg());
        assert!(!IntentRole::ForcedExit.is_bracket_leg());
    }

    #[test]
    fn outcome_constructors() {
        let fill = OrderOutcome::filled(IntentId(3), OrderSide::Sell, 101.5);
        assert_eq!(fill.kind, OutcomeKind::Filled);
        assert_eq!(fill.executed_price, Some(101.5));

        let rej = OrderOutcome::rejected(IntentId(4), OrderSide::Buy);
        assert_eq!(rej.kind, OutcomeKind::Rejected);
        assert!(rej.executed_price.is_none());
    }

    #[test]
    fn intent_serializes_with_oco_link() {
        let intent = OrderIntent {
            id: IntentId(2),
            side: OrderSide::Sell,
            kind: OrderKind::Limit { price: 110.0 },
            size: 1.0,
            linked: Some(IntentId(3)),
            role: IntentRole::TakeProfit,
        };
        let json = serde_json::to_string(&intent).unwrap();
        let back: OrderIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(intent, back);
    }
}
