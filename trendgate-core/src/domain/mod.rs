//! Domain types for TrendGate

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::{BarSnapshot, IndicatorSnapshot};
pub use ids::{IdGen, IntentId};
pub use order::{
    CancelRequest, IntentRole, OrderIntent, OrderKind, OrderOutcome, OrderSide, OutcomeKind,
};
pub use position::{Direction, PositionState};
pub use trade::{ClosedTrade, ExitReason};
