//! Transfer pipeline states
//!
//! ```text
//! RECEIVED → VALIDATED → AMOUNT_RESOLVED → FEE_QUOTED → SUFFICIENCY_CHECKED → SUBMITTED → CONFIRMED
//!     ↓           ↓             ↓               ↓                 ↓                ↓
//!   FAILED ←──────┴─────────────┴───────────────┴─────────────────┴────────────────┘
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransferState {
    Received,
    Validated,
    AmountResolved,
    FeeQuoted,
    SufficiencyChecked,
    /// Handed to the network; from here a failure is an ambiguous outcome
    Submitted,
    /// Terminal
    Confirmed,
    /// Terminal
    Failed,
}

impl TransferState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Confirmed | TransferState::Failed)
    }

    /// Whether `self → next` is an edge of the pipeline
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        match (self, next) {
            (Confirmed | Failed, _) => false,
            (_, Failed) => true,
            (Received, Validated)
            | (Validated, AmountResolved)
            | (AmountResolved, FeeQuoted)
            | (FeeQuoted, SufficiencyChecked)
            | (SufficiencyChecked, Submitted)
            | (Submitted, Confirmed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Received => "RECEIVED",
            TransferState::Validated => "VALIDATED",
            TransferState::AmountResolved => "AMOUNT_RESOLVED",
            TransferState::FeeQuoted => "FEE_QUOTED",
            TransferState::SufficiencyChecked => "SUFFICIENCY_CHECKED",
            TransferState::Submitted => "SUBMITTED",
            TransferState::Confirmed => "CONFIRMED",
            TransferState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Confirmed.is_terminal());
        assert!(TransferState::Failed.is_terminal());
        assert!(!TransferState::Submitted.is_terminal());
        assert!(!TransferState::Received.is_terminal());
    }

    #[test]
    fn test_forward_edges_only() {
        assert!(TransferState::Received.can_transition_to(TransferState::Validated));
        assert!(TransferState::Submitted.can_transition_to(TransferState::Confirmed));
        assert!(!TransferState::Validated.can_transition_to(TransferState::Submitted));
        assert!(!TransferState::FeeQuoted.can_transition_to(TransferState::Confirmed));
        assert!(!TransferState::Confirmed.can_transition_to(TransferState::Failed));
    }

    #[test]
    fn test_any_live_state_can_fail() {
        for s in [
            TransferState::Received,
            TransferState::Validated,
            TransferState::AmountResolved,
            TransferState::FeeQuoted,
            TransferState::SufficiencyChecked,
            TransferState::Submitted,
        ] {
            assert!(s.can_transition_to(TransferState::Failed), "{s}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TransferState::SufficiencyChecked.to_string(),
            "SUFFICIENCY_CHECKED"
        );
    }
}
