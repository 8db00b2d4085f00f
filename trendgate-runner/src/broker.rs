//! Simulated broker — the collaborator's order matching and cash accounting.
//!
//! Fill rules, evaluated once per bar in [`SimBroker::on_bar`]:
//! - Market: fills at the bar's open (orders are always submitted after the
//!   previous bar was matched, so this is next-bar-open execution)
//! - Limit / Stop: fills at the order's level once the bar's range touches it
//! - OCO pairs: both legs resting are resolved together with
//!   [`BracketLevels::resolve`], the same rule the engine uses; the winner
//!   fills and the sibling is canceled
//!
//! No slippage, commission or margin checks.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trendgate_core::domain::{
    BarSnapshot, CancelRequest, Direction, ExitReason, IntentId, OrderIntent, OrderKind,
    OrderOutcome, OrderSide,
};
use trendgate_core::engine::BracketLevels;

/// One executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub intent_id: IntentId,
    pub side: OrderSide,
    pub size: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SimBroker {
    resting: Vec<OrderIntent>,
    cash: f64,
    position: f64,
    last_close: Option<f64>,
    fills: Vec<Fill>,
}

impl SimBroker {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            resting: Vec::new(),
            cash: initial_cash,
            position: 0.0,
            last_close: None,
            fills: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Signed units held: positive long, negative short.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Cash plus the position marked at the last seen close.
    pub fn value(&self) -> f64 {
        self.cash + self.position * self.last_close.unwrap_or(0.0)
    }

    pub fn resting(&self) -> &[OrderIntent] {
        &self.resting
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Accept an intent for matching from the next bar on.
    pub fn submit(&mut self, intent: OrderIntent) -> OrderOutcome {
        let price_ok = intent
            .kind
            .price()
            .map_or(true, |p| p.is_finite() && p > 0.0);
        if !(intent.size.is_finite() && intent.size > 0.0 && price_ok) {
            warn!(id = %intent.id, size = intent.size, kind = ?intent.kind, "order rejected");
            return OrderOutcome::rejected(intent.id, intent.side);
        }
        debug!(id = %intent.id, side = %intent.side, kind = ?intent.kind, "order accepted");
        let outcome = OrderOutcome::accepted(intent.id, intent.side);
        self.resting.push(intent);
        outcome
    }

    /// Cancel a resting order. `None` if it already filled or was canceled.
    pub fn cancel(&mut self, request: &CancelRequest) -> Option<OrderOutcome> {
        let pos = self
            .resting
            .iter()
            .position(|i| i.id == request.intent_id)?;
        let intent = self.resting.remove(pos);
        debug!(id = %intent.id, reason = %request.reason, "order canceled");
        Some(OrderOutcome::canceled(intent.id, intent.side))
    }

    /// Match resting orders against `bar`.
    pub fn on_bar(&mut self, bar: &BarSnapshot) -> Vec<OrderOutcome> {
        let mut orders = std::mem::take(&mut self.resting);
        orders.sort_by_key(|o| o.id);

        let mut outcomes = Vec::new();
        let mut handled: HashSet<IntentId> = HashSet::new();

        for order in &orders {
            if handled.contains(&order.id) {
                continue;
            }

            let sibling = order
                .linked
                .and_then(|id| orders.iter().find(|o| o.id == id && !handled.contains(&o.id)));

            match (order.kind, sibling) {
                (OrderKind::Market, _) => {
                    handled.insert(order.id);
                    outcomes.push(self.execute(order, bar.open, bar.timestamp));
                }
                (_, Some(sibling)) => {
                    handled.insert(order.id);
                    handled.insert(sibling.id);
                    match self.match_pair(order, sibling, bar) {
                        Some((winner, price)) => {
                            let loser = if winner.id == order.id { sibling } else { order };
                            outcomes.push(self.execute(winner, price, bar.timestamp));
                            outcomes.push(OrderOutcome::canceled(loser.id, loser.side));
                        }
                        None => {
                            self.resting.push(order.clone());
                            self.resting.push(sibling.clone());
                        }
                    }
                }
                (_, None) => {
                    handled.insert(order.id);
                    match touched_level(order, bar) {
                        Some(price) => outcomes.push(self.execute(order, price, bar.timestamp)),
                        None => self.resting.push(order.clone()),
                    }
                }
            }
        }

        self.last_close = Some(bar.close);
        outcomes
    }

    /// Resolve an OCO pair. Returns the leg that fills and its price.
    fn match_pair<'a>(
        &self,
        a: &'a OrderIntent,
        b: &'a OrderIntent,
        bar: &BarSnapshot,
    ) -> Option<(&'a OrderIntent, f64)> {
        let (take_profit, stop_loss) = match (a.kind, b.kind) {
            (OrderKind::Limit { .. }, OrderKind::Stop { .. }) => (a, b),
            (OrderKind::Stop { .. }, OrderKind::Limit { .. }) => (b, a),
            // Not a bracket: match each leg on its own, lowest id first.
            _ => {
                return touched_level(a, bar)
                    .map(|p| (a, p))
                    .or_else(|| touched_level(b, bar).map(|p| (b, p)))
            }
        };
        let levels = BracketLevels {
            take_profit: take_profit.kind.price()?,
            stop_loss: stop_loss.kind.price()?,
        };
        let direction = match take_profit.side {
            OrderSide::Sell => Direction::Long,
            OrderSide::Buy => Direction::Short,
        };
        match levels.resolve(direction, bar.high, bar.low)? {
            (ExitReason::TakeProfit, price) => Some((take_profit, price)),
            (_, price) => Some((stop_loss, price)),
        }
    }

    fn execute(&mut self, order: &OrderIntent, price: f64, timestamp: DateTime<Utc>) -> OrderOutcome {
        let signed = match order.side {
            OrderSide::Buy => order.size,
            OrderSide::Sell => -order.size,
        };
        self.position += signed;
        self.cash -= signed * price;
        debug!(id = %order.id, side = %order.side, price, size = order.size, "order filled");
        self.fills.push(Fill {
            intent_id: order.id,
            side: order.side,
            size: order.size,
            price,
            timestamp,
        });
        OrderOutcome::filled(order.id, order.side, price)
    }
}

/// Fill price of a standalone limit or stop order on `bar`, if triggered.
fn touched_level(order: &OrderIntent, bar: &BarSnapshot) -> Option<f64> {
    match (order.kind, order.side) {
        (OrderKind::Market, _) => Some(bar.open),
        (OrderKind::Limit { price }, OrderSide::Sell) | (OrderKind::Stop { price }, OrderSide::Buy) => {
            (bar.high >= price).then_some(price)
        }
        (OrderKind::Limit { price }, OrderSide::Buy) | (OrderKind::Stop { price }, OrderSide::Sell) => {
            (bar.low <= price).then_some(price)
        }
    }
}
