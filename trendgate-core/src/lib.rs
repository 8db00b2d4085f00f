//! TrendGate Core — signal-driven position decisions for a single instrument.
//!
//! This crate contains the decision side of the strategy:
//! - Domain types (bar and indicator snapshots, intents, outcomes, positions)
//! - Indicator feed adapter turning named series into per-bar snapshots
//! - Position decision engine: regime filter, cross latch, bracket exits
//! - Adaptive sizing controller with per-direction multipliers
//!
//! Order routing, fills and indicator computation belong to the collaborator
//! (see `trendgate-runner`).

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod sizing;

pub use config::StrategyConfig;
pub use engine::{DecisionEngine, EngineOutput, Phase};
pub use error::{ConfigError, EngineError};
pub use feed::{FeedAdapter, FeedKeys, IndicatorValues};
pub use sizing::{SizingController, SizingPolicy, SizingState};
