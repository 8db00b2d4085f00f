//! Intent book — the engine's registry of emitted order intents.
//!
//! The book tracks every intent the engine has emitted and where it stands:
//! - Submitted → Acknowledged (collaborator reported `Accepted`)
//! - Submitted/Acknowledged → CancelRequested (engine asked for a cancel)
//! - Submitted/Acknowledged → Settled (engine closed the position at this
//!   leg's level from bar data, broker confirmation still to come)
//! - any → Filled / Canceled / Rejected (collaborator outcome)
//!
//! Only Submitted and Acknowledged intents are *live*. Outcomes for intents
//! that are no longer live are late echoes of a race and are ignored by the
//! engine. Every transition lands in the audit trail.

use crate::domain::{IntentId, IntentRole, OrderIntent};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from intent book operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntentBookError {
    #[error("intent {0} not found")]
    NotFound(IntentId),

    #[error("intent {0} is not live (status: {1:?})")]
    NotLive(IntentId, IntentStatus),

    #[error("intent {0} already submitted")]
    Duplicate(IntentId),
}

impl From<IntentBookError> for EngineError {
    fn from(err: IntentBookError) -> Self {
        EngineError::inconsistent(err.to_string())
    }
}

/// Engine-side lifecycle of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentStatus {
    Submitted,
    Acknowledged,
    CancelRequested,
    Settled,
    Filled,
    Canceled,
    Rejected,
}

impl IntentStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, IntentStatus::Submitted | IntentStatus::Acknowledged)
    }
}

/// An intent plus its current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedIntent {
    pub intent: OrderIntent,
    pub status: IntentStatus,
    pub submitted_bar: usize,
}

/// Audit trail entry for an intent state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAuditEntry {
    pub intent_id: IntentId,
    pub bar_index: usize,
    pub from_status: Option<IntentStatus>,
    pub to_status: IntentStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct IntentBook {
    intents: HashMap<IntentId, TrackedIntent>,
    audit_trail: Vec<IntentAuditEntry>,
}

impl IntentBook {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Public API ─────────────────────────────────────────────────────

    pub fn submit(&mut self, intent: OrderIntent, bar_index: usize) -> Result<(), IntentBookError> {
        if self.intents.contains_key(&intent.id) {
            return Err(IntentBookError::Duplicate(intent.id));
        }
        let id = intent.id;
        self.intents.insert(
            id,
            TrackedIntent {
                intent,
                status: IntentStatus::Submitted,
                submitted_bar: bar_index,
            },
        );
        self.record_audit(id, None, IntentStatus::Submitted, bar_index, "submitted");
        Ok(())
    }

    pub fn get(&self, id: IntentId) -> Option<&TrackedIntent> {
        self.intents.get(&id)
    }

    pub fn status(&self, id: IntentId) -> Option<IntentStatus> {
        self.intents.get(&id).map(|t| t.status)
    }

    pub fn is_live(&self, id: IntentId) -> bool {
        self.status(id).is_some_and(|s| s.is_live())
    }

    /// Collaborator acknowledged a live intent. Idempotent.
    pub fn acknowledge(&mut self, id: IntentId, bar_index: usize) -> Result<(), IntentBookError> {
        match self.status(id) {
            None => Err(IntentBookError::NotFound(id)),
            Some(IntentStatus::Submitted) => {
                self.transition(id, IntentStatus::Acknowledged, bar_index, "accepted");
                Ok(())
            }
            Some(IntentStatus::Acknowledged) => Ok(()),
            Some(other) => Err(IntentBookError::NotLive(id, other)),
        }
    }

    /// Move a live intent to a non-live status.
    pub fn retire(
        &mut self,
        id: IntentId,
        to: IntentStatus,
        bar_index: usize,
        reason: &str,
    ) -> Result<(), IntentBookError> {
        match self.status(id) {
            None => Err(IntentBookError::NotFound(id)),
            Some(s) if s.is_live() => {
                self.transition(id, to, bar_index, reason);
                Ok(())
            }
            Some(other) => Err(IntentBookError::NotLive(id, other)),
        }
    }

    /// Record the final collaborator outcome of an intent that is no longer
    /// live (e.g. the `Canceled` echo of an engine-requested cancel).
    pub fn finalize(&mut self, id: IntentId, to: IntentStatus, bar_index: usize, reason: &str) {
        if let Some(from) = self.status(id) {
            if from != to {
                self.transition(id, to, bar_index, reason);
            }
        }
    }

    /// OCO sibling of `id`, if it has one.
    pub fn sibling(&self, id: IntentId) -> Option<IntentId> {
        self.intents.get(&id).and_then(|t| t.intent.linked)
    }

    /// All live intents, ordered by id.
    pub fn live(&self) -> Vec<&OrderIntent> {
        let mut live: Vec<&OrderIntent> = self
            .intents
            .values()
            .filter(|t| t.status.is_live())
            .map(|t| &t.intent)
            .collect();
        live.sort_by_key(|i| i.id);
        live
    }

    pub fn live_count(&self) -> usize {
        self.intents.values().filter(|t| t.status.is_live()).count()
    }

    pub fn has_live(&self) -> bool {
        self.intents.values().any(|t| t.status.is_live())
    }

    /// Live intents with the given role.
    pub fn live_with_role(&self, role: IntentRole) -> Vec<IntentId> {
        let mut ids: Vec<IntentId> = self
            .intents
            .values()
            .filter(|t| t.status.is_live() && t.intent.role == role)
            .map(|t| t.intent.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn audit_trail(&self) -> &[IntentAuditEntry] {
        &self.audit_trail
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn transition(&mut self, id: IntentId, to: IntentStatus, bar_index: usize, reason: &str) {
        let Some(tracked) = self.intents.get_mut(&id) else {
            return;
        };
        let from = tracked.status;
        tracked.status = to;
        self.record_audit(id, Some(from), to, bar_index, reason);
    }

    fn record_audit(
        &mut self,
        intent_id: IntentId,
        from_status: Option<IntentStatus>,
        to_status: IntentStatus,
        bar_index: usize,
        reason: &str,
    ) {
        self.audit_trail.push(IntentAuditEntry {
            intent_id,
            bar_index,
            from_status,
            to_status,
            reason: reason.to_string(),
        });
    }
}
