//! Transaction state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a transaction.
///
/// ```text
/// Empty ──► Authorized ──► Voided
///             │  ▲
///             └──┘ capture / refund
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransactionState {
    /// No authorization has been recorded.
    #[default]
    Empty,

    /// Funds are reserved; captures and refunds move the balance.
    Authorized,

    /// The authorization was released (terminal state).
    Voided,
}

impl TransactionState {
    pub fn can_authorize(&self) -> bool {
        matches!(self, TransactionState::Empty)
    }

    /// Returns true if captures and refunds are accepted in this state.
    pub fn can_move_funds(&self) -> bool {
        matches!(self, TransactionState::Authorized)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Voided)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Empty => "Empty",
            TransactionState::Authorized => "Authorized",
            TransactionState::Voided => "Voided",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        assert_eq!(TransactionState::default(), TransactionState::Empty);
    }

    #[test]
    fn test_transitions() {
        assert!(TransactionState::Empty.can_authorize());
        assert!(!TransactionState::Authorized.can_authorize());
        assert!(!TransactionState::Voided.can_authorize());

        assert!(!TransactionState::Empty.can_move_funds());
        assert!(TransactionState::Authorized.can_move_funds());
        assert!(!TransactionState::Voided.can_move_funds());

        assert!(TransactionState::Voided.is_terminal());
        assert!(!TransactionState::Authorized.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransactionState::Empty.to_string(), "Empty");
        assert_eq!(TransactionState::Authorized.to_string(), "Authorized");
        assert_eq!(TransactionState::Voided.to_string(), "Voided");
    }
}
