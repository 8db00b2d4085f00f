use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an order intent emitted by the engine.
///
/// The engine does not track broker-side order identity; this id is only the
/// handle the collaborator echoes back in `OrderOutcome` and `CancelRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentId(pub u64);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for IntentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Monotonic intent id generator, scoped to one engine instance.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn next_intent_id(&mut self) -> IntentId {
        self.next += 1;
        IntentId(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut ids = IdGen::default();
        let a = ids.next_intent_id();
        let b = ids.next_intent_id();
        assert!(b > a);
        assert_eq!(a, IntentId(1));
    }

    #[test]
    fn intent_id_display() {
        assert_eq!(IntentId(7).to_string(), "#7");
    }
}
