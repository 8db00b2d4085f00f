//! Session driver — wires bars, indicators, engine and simulated broker.
//!
//! Two entry points:
//! - `run_from_config()`: loads or generates bars, precomputes indicators, runs.
//!   Used by the CLI.
//! - `run_session()`: takes pre-loaded bars and indicator series. No I/O.
//!
//! Per bar, in order:
//! 1. Outcomes queued on the previous bar (acknowledgements, rejections,
//!    cancels) are delivered to the engine
//! 2. The broker matches resting orders against the bar; fills go to the engine
//! 3. The engine evaluates the bar (skipped during indicator warmup)
//!
//! Engine output is routed to the broker as soon as it is produced. Submission
//! and cancel answers are queued for the next bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use trendgate_core::domain::{BarSnapshot, ClosedTrade, OrderOutcome};
use trendgate_core::{
    DecisionEngine, EngineError, EngineOutput, FeedAdapter, IndicatorValues, SizingState,
};

use crate::broker::SimBroker;
use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{dataset_hash, generate_synthetic_bars, load_csv, LoadError, LoadOptions};
use crate::indicators::{precompute, warmup_bars};
use crate::metrics::PerformanceMetrics;

/// Synthetic bars use the CSV's 15-minute spacing.
const SYNTHETIC_INTERVAL_MINUTES: i64 = 15;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from the session driver.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid strategy config: {0}")]
    Strategy(#[from] trendgate_core::ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error at bar {bar}: {source}")]
    Engine {
        bar: usize,
        #[source]
        source: EngineError,
    },
    #[error("no bars to run")]
    NoBars,
}

/// Complete result of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub initial_cash: f64,
    /// Broker cash plus position marked at the last close.
    pub final_value: f64,
    pub fill_count: usize,
    pub metrics: PerformanceMetrics,
    pub final_sizing: SizingState,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<f64>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a session from a `RunConfig`, loading or generating its bars.
pub fn run_from_config(config: &RunConfig) -> Result<SessionReport, SessionError> {
    config.validate()?;
    let bars = match config.data.synthetic {
        Some(count) => {
            let start = config
                .data
                .start
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc();
            info!(count, seed = %config.data.seed, "generating synthetic bars");
            generate_synthetic_bars(&config.data.seed, count, start, SYNTHETIC_INTERVAL_MINUTES)
        }
        None => {
            let opts = LoadOptions {
                start: config.data.start,
                end: config.data.end,
            };
            info!(path = %config.data.path.display(), "loading bars");
            load_csv(&config.data.path, &opts)?
        }
    };
    let warmup = warmup_bars(&config.indicators);
    if bars.len() <= warmup {
        warn!(
            bars = bars.len(),
            warmup, "fewer bars than the indicator warmup, no decisions will be made"
        );
    }
    let indicators = precompute(&bars, &config.indicators, &config.strategy.feed);
    run_session(&bars, &indicators, config)
}

/// Run a session over pre-loaded bars and indicator series.
pub fn run_session(
    bars: &[BarSnapshot],
    indicators: &IndicatorValues,
    config: &RunConfig,
) -> Result<SessionReport, SessionError> {
    if bars.is_empty() {
        return Err(SessionError::NoBars);
    }
    let run_id = config.run_id()?;
    let mut engine = DecisionEngine::new(config.strategy.clone())?;
    let adapter = FeedAdapter::new(config.strategy.feed.clone());
    let mut broker = SimBroker::new(config.initial_cash);

    let mut inbox: Vec<OrderOutcome> = Vec::new();
    let mut warmup_bars = 0;
    let mut equity_curve = Vec::with_capacity(bars.len());

    info!("Starting Portfolio Value: {:.2}", config.initial_cash);

    for (i, bar) in bars.iter().enumerate() {
        let engine_err = |source: EngineError| SessionError::Engine { bar: i, source };

        let mut outcomes = std::mem::take(&mut inbox);
        outcomes.extend(broker.on_bar(bar));
        for outcome in &outcomes {
            let out = engine.on_order_outcome(outcome).map_err(engine_err)?;
            route(&mut broker, out, &mut inbox);
        }

        match adapter.snapshot(indicators, i).map_err(engine_err)? {
            Some(snapshot) => {
                let out = engine.on_bar(bar, &snapshot).map_err(engine_err)?;
                route(&mut broker, out, &mut inbox);
            }
            None => warmup_bars += 1,
        }

        equity_curve.push(broker.value());
    }

    let trades = engine.trades().to_vec();
    let metrics = PerformanceMetrics::compute(&equity_curve, &trades);
    let final_value = broker.value();

    info!(
        trades = metrics.trade_count,
        realized_pnl = metrics.realized_pnl,
        win_rate = metrics.win_rate,
        "Final Portfolio Value: {:.2}",
        final_value
    );

    Ok(SessionReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: dataset_hash(bars),
        has_synthetic: config.data.synthetic.is_some(),
        start_date: bars.first().map(|b| b.timestamp.date_naive()),
        end_date: bars.last().map(|b| b.timestamp.date_naive()),
        bar_count: bars.len(),
        warmup_bars,
        initial_cash: config.initial_cash,
        final_value,
        fill_count: broker.fills().len(),
        metrics,
        final_sizing: engine.sizing(),
        trades,
        equity_curve,
    })
}

/// Hand engine output to the broker, queueing the answers for the next bar.
fn route(broker: &mut SimBroker, out: EngineOutput, inbox: &mut Vec<OrderOutcome>) {
    for cancel in &out.cancels {
        match broker.cancel(cancel) {
            Some(outcome) => inbox.push(outcome),
            None => debug!(id = %cancel.intent_id, "cancel for order no longer resting"),
        }
    }
    for intent in out.intents {
        inbox.push(broker.submit(intent));
    }
}
