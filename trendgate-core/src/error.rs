//! Error taxonomy for the decision core.
//!
//! Both engine errors are fatal: the driving loop must stop the run. Broker
//! rejections are not errors; they arrive as ordinary `OrderOutcome`s.

use crate::domain::IntentId;
use thiserror::Error;

/// Fatal errors raised by the decision engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed input: non-monotonic timestamp, NaN or non-positive price.
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// Collaborator and engine disagree about outstanding intents.
    #[error("inconsistent state: {reason}")]
    InconsistentState { reason: String },
}

impl EngineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            reason: reason.into(),
        }
    }

    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentState {
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_intent(id: IntentId) -> Self {
        Self::inconsistent(format!("outcome for unknown intent {id}"))
    }
}

/// Invalid strategy configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be {requirement} (got {value})")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("feed key '{0}' must not be empty")]
    EmptyFeedKey(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = EngineError::invalid("timestamp went backwards");
        assert_eq!(err.to_string(), "invalid snapshot: timestamp went backwards");

        let err = EngineError::unknown_intent(IntentId(9));
        assert_eq!(err.to_string(), "inconsistent state: outcome for unknown intent #9");

        let err = ConfigError::OutOfRange {
            field: "floor",
            requirement: "> 0",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "floor must be > 0 (got 0)");
    }
}
