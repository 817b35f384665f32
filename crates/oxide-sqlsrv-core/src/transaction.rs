//! Transaction control.

use std::fmt;

/// Where a connection is in its transaction sequence.
///
/// `Idle -> Active -> Committed | RolledBack`; a new `begin` starts over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction has been started.
    #[default]
    Idle,
    /// A transaction is open.
    Active,
    /// The last transaction was committed.
    Committed,
    /// The last transaction was rolled back.
    RolledBack,
}

impl TransactionState {
    /// Returns true while a transaction is open.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        };
        f.write_str(s)
    }
}

/// Begin, commit and rollback against one connection.
///
/// Each call passes straight through to the backend and reports
/// success as a boolean. Nested transactions and savepoints are not
/// modeled.
pub trait Transactional {
    /// Starts a transaction.
    fn trans_begin(&mut self) -> bool;

    /// Commits the open transaction.
    fn trans_commit(&mut self) -> bool;

    /// Rolls back the open transaction.
    fn trans_rollback(&mut self) -> bool;

    /// The current state.
    fn transaction_state(&self) -> TransactionState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults_to_idle() {
        assert_eq!(TransactionState::default(), TransactionState::Idle);
        assert!(!TransactionState::Idle.is_active());
        assert!(TransactionState::Active.is_active());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TransactionState::RolledBack.to_string(), "rolled back");
    }
}
