//! Performance metrics — pure functions that compute session statistics.
//!
//! Equity curve and/or trade list in, scalar out.

use serde::{Deserialize, Serialize};
use trendgate_core::domain::ClosedTrade;

/// Aggregate performance metrics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub realized_pnl: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[f64], trades: &[ClosedTrade]) -> Self {
        Self {
            total_return: total_return(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            realized_pnl: realized_pnl(trades),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            max_consecutive_wins: max_consecutive_wins(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return: (final / initial) - 1.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Maximum peak-to-trough decline, as a negative fraction.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min(eq / peak - 1.0);
        }
    }
    max_dd
}

/// Sum of settled trade PnL, in price units times size.
pub fn realized_pnl(trades: &[ClosedTrade]) -> f64 {
    trades.iter().map(|t| t.pnl).sum()
}

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn max_consecutive_wins(trades: &[ClosedTrade]) -> usize {
    longest_streak(trades, true)
}

pub fn max_consecutive_losses(trades: &[ClosedTrade]) -> usize {
    longest_streak(trades, false)
}

fn longest_streak(trades: &[ClosedTrade], winners: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for t in trades {
        if t.is_winner() == winners {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
