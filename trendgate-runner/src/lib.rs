//! TrendGate Runner — session driver around `trendgate-core`.
//!
//! This crate provides:
//! - Data loading from CSV, with a synthetic fallback for offline runs
//! - Indicator precompute (EMA trend filter, MACD cross, Parabolic SAR)
//! - A simulated broker that matches intents against bars
//! - The bar-by-bar session loop and its report
//! - Metrics and JSON/CSV/Markdown export

pub mod broker;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod indicators;
pub mod metrics;
pub mod session;

pub use broker::{Fill, SimBroker};
pub use config::{ConfigError, DataConfig, IndicatorConfig, RunConfig, RunId};
pub use data_loader::{dataset_hash, generate_synthetic_bars, load_csv, LoadError, LoadOptions};
pub use export::{load_artifacts, save_artifacts};
pub use indicators::{precompute, warmup_bars, Indicator};
pub use metrics::PerformanceMetrics;
pub use session::{run_from_config, run_session, SessionError, SessionReport};
