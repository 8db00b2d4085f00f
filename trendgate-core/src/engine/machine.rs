//! Position decision engine — the per-bar state machine.
//!
//! Driven synchronously by the collaborator through two calls:
//! - [`DecisionEngine::on_bar`] once per bar, in strict timestamp order
//! - [`DecisionEngine::on_order_outcome`] for every outcome the broker reports
//!
//! Both return the intents and cancel requests the collaborator must route.
//!
//! Exits are settled exactly once. A bracket exit is settled either by the
//! engine's own bar check or by the broker's fill of a leg, whichever comes
//! first. A leg of the held position that fills after its cancel was requested
//! still settles it. A regime-invalidation exit is settled by the fill of the
//! forced exit; until then the position stays held. Other outcomes arriving
//! for retired intents are logged and dropped.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::domain::{
    BarSnapshot, CancelRequest, ClosedTrade, Direction, ExitReason, IdGen, IndicatorSnapshot,
    IntentId, IntentRole, OrderIntent, OrderKind, OrderOutcome, OutcomeKind, PositionState,
};
use crate::engine::bracket::BracketLevels;
use crate::engine::intent_book::{IntentBook, IntentStatus};
use crate::engine::latch::{Bias, CrossLatch};
use crate::engine::state::{EngineOutput, PendingEntry, Phase};
use crate::error::{ConfigError, EngineError};
use crate::sizing::{SizingController, SizingState};

pub struct DecisionEngine {
    config: StrategyConfig,
    sizing: SizingController,
    position: PositionState,
    phase: Phase,
    latch: CrossLatch,
    book: IntentBook,
    ids: IdGen,
    pending_entry: Option<PendingEntry>,
    /// A bracket leg was lost while holding; re-place the pair on the next bar.
    bracket_retry: bool,
    /// Forced exit sent to the broker and not yet resolved.
    pending_exit: Option<IntentId>,
    bars_seen: usize,
    last_timestamp: Option<DateTime<Utc>>,
    opened_at: Option<DateTime<Utc>>,
    trades: Vec<ClosedTrade>,
}

impl DecisionEngine {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sizing: SizingController::new(config.sizing),
            config,
            position: PositionState::flat(),
            phase: Phase::Flat,
            latch: CrossLatch::new(),
            book: IntentBook::new(),
            ids: IdGen::default(),
            pending_entry: None,
            bracket_retry: false,
            pending_exit: None,
            bars_seen: 0,
            last_timestamp: None,
            opened_at: None,
            trades: Vec::new(),
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn sizing(&self) -> SizingState {
        self.sizing.state()
    }

    /// Intents emitted and still live at the collaborator, ordered by id.
    pub fn outstanding(&self) -> Vec<&OrderIntent> {
        self.book.live()
    }

    pub fn intent_book(&self) -> &IntentBook {
        &self.book
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn cross_bias(&self) -> Bias {
        self.latch.bias()
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// True while a lost bracket leg is waiting to be re-placed.
    pub fn bracket_retry_pending(&self) -> bool {
        self.bracket_retry
    }

    /// The forced exit awaiting its fill, if any.
    pub fn pending_exit(&self) -> Option<IntentId> {
        self.pending_exit
    }

    // ── Bar handling ───────────────────────────────────────────────────

    pub fn on_bar(
        &mut self,
        bar: &BarSnapshot,
        indicators: &IndicatorSnapshot,
    ) -> Result<EngineOutput, EngineError> {
        self.check_snapshot(bar, indicators)?;
        self.last_timestamp = Some(bar.timestamp);
        self.bars_seen += 1;

        let mut out = EngineOutput::default();
        match self.phase {
            Phase::Flat => self.evaluate_entry(bar, indicators, &mut out)?,
            Phase::EnteringLong | Phase::EnteringShort => {
                debug!(phase = ?self.phase, "entry pending, no new decisions");
            }
            Phase::HoldingLong | Phase::HoldingShort => {
                self.manage_position(bar, indicators, &mut out)?
            }
        }
        Ok(out)
    }

    fn check_snapshot(
        &self,
        bar: &BarSnapshot,
        indicators: &IndicatorSnapshot,
    ) -> Result<(), EngineError> {
        bar.validate().map_err(EngineError::invalid)?;
        indicators.validate().map_err(EngineError::invalid)?;
        if let Some(prev) = self.last_timestamp {
            if bar.timestamp <= prev {
                return Err(EngineError::invalid(format!(
                    "bar timestamp {} is not after previous {prev}",
                    bar.timestamp
                )));
            }
        }
        Ok(())
    }

    fn evaluate_entry(
        &mut self,
        bar: &BarSnapshot,
        indicators: &IndicatorSnapshot,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        if self.book.has_live() {
            debug!(live = self.book.live_count(), "waiting on outstanding intents");
            return Ok(());
        }

        let bias = self.latch.observe(indicators.cross_signal);
        let close = bar.close;

        if indicators.is_bullish(close) {
            self.sizing.reset(Direction::Short);
            if bias == Bias::Bullish && indicators.stop_level < close {
                self.open(Direction::Long, bar, indicators, out)?;
            }
        } else {
            self.sizing.reset(Direction::Long);
            if bias == Bias::Bearish && indicators.stop_level > close {
                self.open(Direction::Short, bar, indicators, out)?;
            }
        }
        Ok(())
    }

    fn open(
        &mut self,
        direction: Direction,
        bar: &BarSnapshot,
        indicators: &IndicatorSnapshot,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        let Some(side) = direction.entry_side() else {
            return Ok(());
        };
        let levels = BracketLevels::from_entry(bar.close, indicators.stop_level);
        if !levels.is_valid_for(direction) {
            debug!(?direction, ?levels, "bracket not tradable, entry skipped");
            return Ok(());
        }

        let size = self.sizing.multiplier(direction);
        let intent = OrderIntent {
            id: self.ids.next_intent_id(),
            side,
            kind: OrderKind::Market,
            size,
            linked: None,
            role: IntentRole::Entry,
        };
        self.book.submit(intent.clone(), self.current_bar())?;

        let consumed_bias = self.latch.consume();
        self.pending_entry = Some(PendingEntry {
            intent_id: intent.id,
            direction,
            size,
            levels,
            consumed_bias,
        });
        self.phase = Phase::entering(direction);

        info!(
            "{side} CREATE, {:.2} size={size:.4} take_profit={:.2} stop_loss={:.2}",
            bar.close, levels.take_profit, levels.stop_loss
        );
        out.intents.push(intent);
        Ok(())
    }

    fn manage_position(
        &mut self,
        bar: &BarSnapshot,
        indicators: &IndicatorSnapshot,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        if let Some(exit) = self.pending_exit {
            debug!(%exit, "forced exit outstanding");
            return Ok(());
        }

        let direction = self.position.direction;
        let bullish = indicators.is_bullish(bar.close);
        let regime_against = match direction {
            Direction::Long => !bullish,
            Direction::Short => bullish,
            Direction::Flat => false,
        };

        if regime_against {
            return self.force_close(bar, out);
        }

        if self.position.has_open_bracket {
            let levels = BracketLevels::of(&self.position);
            if let Some((reason, price)) = levels.resolve(direction, bar.high, bar.low) {
                self.settle_bracket(reason, price, out)?;
            }
            return Ok(());
        }

        if self.bracket_retry && !self.has_live_legs() {
            warn!(?direction, "position unprotected, re-placing bracket");
            let legs = self.place_bracket()?;
            out.intents.extend(legs);
        }
        Ok(())
    }

    /// Regime flipped against the held direction: exit at market, cancel legs.
    /// The position closes when the exit fills.
    fn force_close(&mut self, bar: &BarSnapshot, out: &mut EngineOutput) -> Result<(), EngineError> {
        let direction = self.position.direction;
        let Some(side) = direction.exit_side() else {
            return Ok(());
        };

        for role in [IntentRole::TakeProfit, IntentRole::StopLoss] {
            for leg in self.book.live_with_role(role) {
                self.request_cancel(leg, "regime invalidation", out)?;
            }
        }

        let intent = OrderIntent {
            id: self.ids.next_intent_id(),
            side,
            kind: OrderKind::Market,
            size: self.position.size,
            linked: None,
            role: IntentRole::ForcedExit,
        };
        self.book.submit(intent.clone(), self.current_bar())?;
        warn!(
            ?direction,
            close = bar.close,
            "trend filter flipped against position, forcing exit"
        );
        self.pending_exit = Some(intent.id);
        self.position.has_open_bracket = false;
        self.bracket_retry = false;
        out.intents.push(intent);
        Ok(())
    }

    /// A bracket level traded on this bar: settle at that level and cancel the
    /// sibling. The touched leg stays with the broker, which will confirm it.
    fn settle_bracket(
        &mut self,
        reason: ExitReason,
        price: f64,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        let (hit, other) = match reason {
            ExitReason::TakeProfit => (self.position.take_profit_leg, self.position.stop_loss_leg),
            _ => (self.position.stop_loss_leg, self.position.take_profit_leg),
        };
        if let Some(id) = hit {
            if self.book.is_live(id) {
                self.book
                    .retire(id, IntentStatus::Settled, self.current_bar(), "level touched")?;
            }
        }
        if let Some(id) = other {
            self.request_cancel(id, "OCO sibling settled", out)?;
        }
        self.close_position(price, reason);
        Ok(())
    }

    fn place_bracket(&mut self) -> Result<Vec<OrderIntent>, EngineError> {
        let levels = BracketLevels::of(&self.position);
        let Some((take_profit, stop_loss)) =
            levels.legs(self.position.direction, self.position.size, &mut self.ids)
        else {
            return Ok(Vec::new());
        };

        let bar = self.current_bar();
        self.book.submit(take_profit.clone(), bar)?;
        self.book.submit(stop_loss.clone(), bar)?;

        self.position.take_profit_leg = Some(take_profit.id);
        self.position.stop_loss_leg = Some(stop_loss.id);
        self.position.has_open_bracket = false;
        self.bracket_retry = false;

        debug!(
            take_profit = levels.take_profit,
            stop_loss = levels.stop_loss,
            "bracket placed"
        );
        Ok(vec![take_profit, stop_loss])
    }

    fn close_position(&mut self, exit_price: f64, reason: ExitReason) {
        let closed = std::mem::take(&mut self.position);
        let multiplier = self.sizing.record_close(&closed, exit_price);
        let trade = ClosedTrade {
            direction: closed.direction,
            size: closed.size,
            entry_price: closed.entry_price,
            exit_price,
            exit_reason: reason,
            opened_at: self.opened_at.take(),
            closed_at: self.last_timestamp,
            pnl: closed.unrealized_pnl(exit_price),
        };
        info!(
            "CLOSE {:?} {:?} at {exit_price:.2}, pnl {:.2}, next multiplier {multiplier:.4}",
            trade.direction, reason, trade.pnl
        );
        self.trades.push(trade);
        self.phase = Phase::Flat;
        self.bracket_retry = false;
        self.pending_exit = None;
    }

    // ── Outcome handling ───────────────────────────────────────────────

    pub fn on_order_outcome(&mut self, outcome: &OrderOutcome) -> Result<EngineOutput, EngineError> {
        let id = outcome.intent_id;
        let Some(tracked) = self.book.get(id) else {
            return Err(EngineError::unknown_intent(id));
        };
        let (role, status, side) = (tracked.intent.role, tracked.status, tracked.intent.side);

        if outcome.side != side {
            return Err(EngineError::inconsistent(format!(
                "outcome side {} does not match intent {id} side {side}",
                outcome.side
            )));
        }

        let mut out = EngineOutput::default();
        if status == IntentStatus::CancelRequested
            && outcome.kind == OutcomeKind::Filled
            && self.is_held_leg(id)
        {
            let price = fill_price(outcome)?;
            warn!(%id, ?role, "leg filled before its cancel took effect");
            self.book
                .finalize(id, IntentStatus::Filled, self.current_bar(), "filled during cancel");
            self.settle_leg_fill(id, role, price, &mut out)?;
            return Ok(out);
        }
        if !status.is_live() {
            self.absorb_late_outcome(id, status, outcome.kind);
            return Ok(out);
        }

        match outcome.kind {
            OutcomeKind::Accepted => self.on_accepted(id, role)?,
            OutcomeKind::Filled => {
                let price = fill_price(outcome)?;
                match role {
                    IntentRole::Entry => self.on_entry_filled(id, price, &mut out)?,
                    IntentRole::TakeProfit | IntentRole::StopLoss => {
                        self.on_leg_filled(id, role, price, &mut out)?
                    }
                    IntentRole::ForcedExit => self.on_exit_filled(id, price)?,
                }
            }
            OutcomeKind::Canceled | OutcomeKind::Rejected => {
                self.on_intent_lost(id, role, outcome.kind, &mut out)?
            }
        }
        Ok(out)
    }

    /// Outcome for an intent the engine already retired: a duplicate or the
    /// losing side of a race. Never changes position or sizing.
    fn absorb_late_outcome(&mut self, id: IntentId, status: IntentStatus, kind: OutcomeKind) {
        let bar = self.current_bar();
        match (status, kind) {
            (_, OutcomeKind::Accepted) => {}
            (IntentStatus::Filled, OutcomeKind::Filled) => {
                debug!(%id, "duplicate fill ignored");
            }
            (IntentStatus::Settled, OutcomeKind::Filled) => {
                debug!(%id, "broker confirmed settled leg");
                self.book.finalize(id, IntentStatus::Filled, bar, "fill confirmed");
            }
            (IntentStatus::CancelRequested, OutcomeKind::Filled) => {
                warn!(%id, "intent filled after its position was closed");
                self.book.finalize(id, IntentStatus::Filled, bar, "filled during cancel");
            }
            (IntentStatus::CancelRequested | IntentStatus::Settled, OutcomeKind::Canceled) => {
                self.book.finalize(id, IntentStatus::Canceled, bar, "cancel confirmed");
            }
            (IntentStatus::CancelRequested | IntentStatus::Settled, OutcomeKind::Rejected) => {
                self.book.finalize(id, IntentStatus::Rejected, bar, "rejected after retire");
            }
            (status, kind) => {
                debug!(%id, ?status, ?kind, "late outcome ignored");
            }
        }
    }

    fn on_accepted(&mut self, id: IntentId, role: IntentRole) -> Result<(), EngineError> {
        self.book.acknowledge(id, self.current_bar())?;
        if role.is_bracket_leg() && self.legs_acknowledged() {
            self.position.has_open_bracket = true;
            debug!("bracket acknowledged, position protected");
        }
        Ok(())
    }

    fn on_entry_filled(
        &mut self,
        id: IntentId,
        price: f64,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        let pending = match self.pending_entry {
            Some(p) if p.intent_id == id && self.phase.is_entering() => p,
            _ => {
                return Err(EngineError::inconsistent(format!(
                    "entry fill for {id} with no matching pending entry (phase {:?})",
                    self.phase
                )))
            }
        };
        self.pending_entry = None;
        self.book
            .retire(id, IntentStatus::Filled, self.current_bar(), "filled")?;

        self.position = PositionState {
            direction: pending.direction,
            size: pending.size,
            entry_price: price,
            take_profit_price: pending.levels.take_profit,
            stop_loss_price: pending.levels.stop_loss,
            has_open_bracket: false,
            take_profit_leg: None,
            stop_loss_leg: None,
        };
        self.phase = Phase::holding(pending.direction);
        self.opened_at = self.last_timestamp;

        if let Some(side) = pending.direction.entry_side() {
            info!("{side} EXECUTED, {price:.2}");
        }
        let legs = self.place_bracket()?;
        out.intents.extend(legs);
        Ok(())
    }

    fn on_leg_filled(
        &mut self,
        id: IntentId,
        role: IntentRole,
        price: f64,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        if !self.phase.is_holding() {
            return Err(EngineError::inconsistent(format!(
                "bracket fill for {id} while {:?}",
                self.phase
            )));
        }
        self.book
            .retire(id, IntentStatus::Filled, self.current_bar(), "filled")?;
        self.settle_leg_fill(id, role, price, out)
    }

    /// Close the held position at a leg's fill. Anything else still working
    /// against the position is canceled.
    fn settle_leg_fill(
        &mut self,
        id: IntentId,
        role: IntentRole,
        price: f64,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        if let Some(sibling) = self.book.sibling(id) {
            self.request_cancel(sibling, "OCO sibling filled", out)?;
        }
        if let Some(exit) = self.pending_exit {
            self.request_cancel(exit, "position closed by bracket leg", out)?;
        }
        let reason = if role == IntentRole::TakeProfit {
            ExitReason::TakeProfit
        } else {
            ExitReason::StopLoss
        };
        self.close_position(price, reason);
        Ok(())
    }

    fn on_exit_filled(&mut self, id: IntentId, price: f64) -> Result<(), EngineError> {
        if self.pending_exit != Some(id) || !self.phase.is_holding() {
            return Err(EngineError::inconsistent(format!(
                "forced exit fill for {id} with no pending exit (phase {:?})",
                self.phase
            )));
        }
        self.book
            .retire(id, IntentStatus::Filled, self.current_bar(), "filled")?;
        if let Some(side) = self.position.direction.exit_side() {
            info!("{side} EXECUTED, {price:.2} (forced exit)");
        }
        self.close_position(price, ExitReason::RegimeInvalidation);
        Ok(())
    }

    fn on_intent_lost(
        &mut self,
        id: IntentId,
        role: IntentRole,
        kind: OutcomeKind,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        let status = if kind == OutcomeKind::Rejected {
            IntentStatus::Rejected
        } else {
            IntentStatus::Canceled
        };
        self.book
            .retire(id, status, self.current_bar(), "reported by broker")?;
        warn!(%id, ?role, ?kind, "order canceled/rejected");

        match role {
            IntentRole::Entry => {
                if let Some(pending) = self.pending_entry.take() {
                    self.latch.restore(pending.consumed_bias);
                }
                self.phase = Phase::Flat;
            }
            IntentRole::TakeProfit | IntentRole::StopLoss => {
                if let Some(sibling) = self.book.sibling(id) {
                    self.request_cancel(sibling, "bracket leg lost", out)?;
                }
                // Leg refs stay until the pair is re-placed so a late sibling
                // fill is still recognized.
                self.position.has_open_bracket = false;
                self.bracket_retry = self.phase.is_holding() && self.pending_exit.is_none();
            }
            IntentRole::ForcedExit => {
                if self.pending_exit == Some(id) {
                    self.pending_exit = None;
                }
                if self.phase.is_holding() {
                    warn!(%id, "forced exit not executed, position held unprotected");
                    self.bracket_retry = true;
                }
            }
        }
        Ok(())
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn request_cancel(
        &mut self,
        id: IntentId,
        reason: &str,
        out: &mut EngineOutput,
    ) -> Result<(), EngineError> {
        if !self.book.is_live(id) {
            return Ok(());
        }
        self.book
            .retire(id, IntentStatus::CancelRequested, self.current_bar(), reason)?;
        out.cancels.push(CancelRequest {
            intent_id: id,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// `id` is one of the legs placed for the position currently held.
    fn is_held_leg(&self, id: IntentId) -> bool {
        self.phase.is_holding()
            && (self.position.take_profit_leg == Some(id) || self.position.stop_loss_leg == Some(id))
    }

    fn legs_acknowledged(&self) -> bool {
        let acked = |leg: Option<IntentId>| {
            leg.and_then(|id| self.book.status(id)) == Some(IntentStatus::Acknowledged)
        };
        acked(self.position.take_profit_leg) && acked(self.position.stop_loss_leg)
    }

    fn has_live_legs(&self) -> bool {
        !self.book.live_with_role(IntentRole::TakeProfit).is_empty()
            || !self.book.live_with_role(IntentRole::StopLoss).is_empty()
    }

    fn current_bar(&self) -> usize {
        self.bars_seen.saturating_sub(1)
    }
}

fn fill_price(outcome: &OrderOutcome) -> Result<f64, EngineError> {
    outcome
        .executed_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| {
            EngineError::inconsistent(format!(
                "fill for {} without a valid price",
                outcome.intent_id
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;
    use chrono::{Duration, TimeZone};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap() + Duration::minutes(15 * i)
    }

    fn bar(i: i64, low: f64, high: f64, close: f64) -> BarSnapshot {
        BarSnapshot::new(ts(i), close, high, low, close)
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(StrategyConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = StrategyConfig::default();
        config.sizing.floor = -1.0;
        assert!(DecisionEngine::new(config).is_err());
    }

    #[test]
    fn non_monotonic_timestamp_is_fatal() {
        let mut e = engine();
        let ind = IndicatorSnapshot::new(90.0, 0.0, 95.0);
        e.on_bar(&bar(1, 99.0, 101.0, 100.0), &ind).unwrap();
        let err = e.on_bar(&bar(1, 99.0, 101.0, 100.0), &ind).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSnapshot { .. }));
    }

    #[test]
    fn nan_price_is_fatal() {
        let mut e = engine();
        let ind = IndicatorSnapshot::new(90.0, 0.0, 95.0);
        let err = e
            .on_bar(&bar(0, f64::NAN, 101.0, 100.0), &ind)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSnapshot { .. }));
    }

    #[test]
    fn no_entry_without_cross() {
        let mut e = engine();
        let out = e
            .on_bar(&bar(0, 99.0, 101.0, 100.0), &IndicatorSnapshot::new(90.0, 0.0, 95.0))
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(e.phase(), Phase::Flat);
    }

    #[test]
    fn latched_cross_enters_when_stop_confirms() {
        let mut e = engine();
        // Cross on bar 0, but SAR still above price.
        let out = e
            .on_bar(&bar(0, 99.0, 101.0, 100.0), &IndicatorSnapshot::new(90.0, 1.0, 102.0))
            .unwrap();
        assert!(out.intents.is_empty());
        assert_eq!(e.cross_bias(), Bias::Bullish);

        // No cross on bar 1, SAR flipped below price: latch fires.
        let out = e
            .on_bar(&bar(1, 100.0, 103.0, 102.0), &IndicatorSnapshot::new(90.0, 0.0, 99.0))
            .unwrap();
        assert_eq!(out.intents.len(), 1);
        assert_eq!(out.intents[0].side, OrderSide::Buy);
        assert_eq!(e.phase(), Phase::EnteringLong);
        assert_eq!(e.cross_bias(), Bias::None);
    }

    #[test]
    fn bearish_regime_enters_short_with_mirrored_bracket() {
        let mut e = engine();
        let out = e
            .on_bar(&bar(0, 99.0, 101.0, 100.0), &IndicatorSnapshot::new(110.0, -1.0, 104.0))
            .unwrap();
        let entry = &out.intents[0];
        assert_eq!(entry.side, OrderSide::Sell);
        assert_eq!(e.phase(), Phase::EnteringShort);

        let out = e
            .on_order_outcome(&OrderOutcome::filled(entry.id, OrderSide::Sell, 100.0))
            .unwrap();
        let tp = &out.intents[0];
        let sl = &out.intents[1];
        assert_eq!(tp.kind, OrderKind::Limit { price: 96.0 });
        assert_eq!(sl.kind, OrderKind::Stop { price: 104.0 });
        assert_eq!(tp.side, OrderSide::Buy);
        assert_eq!(e.position().direction, Direction::Short);
    }

    #[test]
    fn fill_for_unknown_intent_is_inconsistent() {
        let mut e = engine();
        let err = e
            .on_order_outcome(&OrderOutcome::filled(IntentId(99), OrderSide::Buy, 100.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InconsistentState { .. }));
    }

    #[test]
    fn fill_side_mismatch_is_inconsistent() {
        let mut e = engine();
        let out = e
            .on_bar(&bar(0, 99.0, 101.0, 100.0), &IndicatorSnapshot::new(90.0, 1.0, 95.0))
            .unwrap();
        let err = e
            .on_order_outcome(&OrderOutcome::filled(out.intents[0].id, OrderSide::Sell, 100.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InconsistentState { .. }));
    }

    #[test]
    fn rejected_entry_restores_latch() {
        let mut e = engine();
        let out = e
            .on_bar(&bar(0, 99.0, 101.0, 100.0), &IndicatorSnapshot::new(90.0, 1.0, 95.0))
            .unwrap();
        let entry = out.intents[0].id;
        let out = e
            .on_order_outcome(&OrderOutcome::rejected(entry, OrderSide::Buy))
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(e.phase(), Phase::Flat);
        assert_eq!(e.cross_bias(), Bias::Bullish);
        assert!(e.trades().is_empty());
        assert_eq!(e.sizing().long_multiplier, 1.0);
    }

    #[test]
    fn regime_resets_opposite_multiplier() {
        let mut config = StrategyConfig::default();
        config.sizing.scale_factor = 0.1;
        let mut e = DecisionEngine::new(config).unwrap();

        // Short trade that wins 10 points.
        let out = e
            .on_bar(&bar(0, 99.0, 101.0, 100.0), &IndicatorSnapshot::new(110.0, -1.0, 105.0))
            .unwrap();
        let entry = out.intents[0].id;
        let legs = e
            .on_order_outcome(&OrderOutcome::filled(entry, OrderSide::Sell, 100.0))
            .unwrap()
            .intents;
        e.on_order_outcome(&OrderOutcome::filled(legs[0].id, OrderSide::Buy, 95.0))
            .unwrap();
        assert!((e.sizing().short_multiplier - 1.5).abs() < 1e-12);

        // A bearish flat bar keeps it; a bullish one resets it.
        e.on_bar(&bar(1, 94.0, 96.0, 95.0), &IndicatorSnapshot::new(110.0, 0.0, 97.0))
            .unwrap();
        assert!((e.sizing().short_multiplier - 1.5).abs() < 1e-12);
        e.on_bar(&bar(2, 111.0, 113.0, 112.0), &IndicatorSnapshot::new(110.0, 0.0, 115.0))
            .unwrap();
        assert_eq!(e.sizing().short_multiplier, 1.0);
    }
}
