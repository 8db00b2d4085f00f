//! Position decision engine — per-bar state machine and supporting types.
//!
//! Per bar the engine does one of three things, depending on its phase:
//!
//! 1. Flat: fold the cross signal into the latch, apply the regime filter
//!    (resetting the opposite direction's multiplier) and maybe emit an entry
//! 2. Entering: wait for the entry outcome
//! 3. Holding: regime-invalidation exit first, then bracket checks, then
//!    bracket re-placement if a leg was lost

pub mod bracket;
pub mod intent_book;
pub mod latch;
pub mod machine;
pub mod state;

pub use bracket::BracketLevels;
pub use intent_book::{IntentAuditEntry, IntentBook, IntentBookError, IntentStatus, TrackedIntent};
pub use latch::{Bias, CrossLatch};
pub use machine::DecisionEngine;
pub use state::{EngineOutput, Phase};
