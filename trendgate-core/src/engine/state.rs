//! Engine phase and per-call output types.

use crate::domain::{CancelRequest, Direction, IntentId, OrderIntent};
use crate::engine::bracket::BracketLevels;
use crate::engine::latch::Bias;
use serde::{Deserialize, Serialize};

/// State of the position state machine.
///
/// `Entering*` exists only while an entry intent is unconfirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Flat,
    EnteringLong,
    EnteringShort,
    HoldingLong,
    HoldingShort,
}

impl Phase {
    pub fn entering(direction: Direction) -> Self {
        match direction {
            Direction::Long => Phase::EnteringLong,
            Direction::Short => Phase::EnteringShort,
            Direction::Flat => Phase::Flat,
        }
    }

    pub fn holding(direction: Direction) -> Self {
        match direction {
            Direction::Long => Phase::HoldingLong,
            Direction::Short => Phase::HoldingShort,
            Direction::Flat => Phase::Flat,
        }
    }

    /// Direction the phase is about (pending or held). Flat for `Flat`.
    pub fn direction(&self) -> Direction {
        match self {
            Phase::Flat => Direction::Flat,
            Phase::EnteringLong | Phase::HoldingLong => Direction::Long,
            Phase::EnteringShort | Phase::HoldingShort => Direction::Short,
        }
    }

    pub fn is_entering(&self) -> bool {
        matches!(self, Phase::EnteringLong | Phase::EnteringShort)
    }

    pub fn is_holding(&self) -> bool {
        matches!(self, Phase::HoldingLong | Phase::HoldingShort)
    }
}

/// Everything the engine asks of the collaborator in response to one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub intents: Vec<OrderIntent>,
    pub cancels: Vec<CancelRequest>,
}

impl EngineOutput {
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty() && self.cancels.is_empty()
    }

    pub fn extend(&mut self, other: EngineOutput) {
        self.intents.extend(other.intents);
        self.cancels.extend(other.cancels);
    }
}

/// An entry intent waiting for its outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingEntry {
    pub intent_id: IntentId,
    pub direction: Direction,
    pub size: f64,
    pub levels: BracketLevels,
    /// Latch bias the entry consumed; restored if the entry never fills.
    pub consumed_bias: Bias,
}
