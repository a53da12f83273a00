//! Session state machine

use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Lifecycle of one resolution session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Transient collection exists and is empty
    Created,
    /// Lookup attempted; whatever it returned is in the transient collection
    DescriptionFetched,
    /// Audit entry appended
    Logged,
    /// View composed and handed out (terminal)
    Composed,
}

impl SessionState {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Composed)
    }
}

/// Validates a session state transition.
///
/// `DescriptionFetched -> Composed` covers a failed log write: the response
/// is still composed, carrying a warning.
pub fn validate_transition(from: SessionState, to: SessionState) -> Result<(), SessionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(SessionError::IllegalTransition { from, to })
    }
}

/// States reachable in one step from `from`
pub fn allowed_transitions(from: SessionState) -> Vec<SessionState> {
    use SessionState::*;
    match from {
        Created => vec![DescriptionFetched, Composed],
        DescriptionFetched => vec![Logged, Composed],
        Logged => vec![Composed],
        Composed => vec![],
    }
}

fn allowed(from: SessionState, to: SessionState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
