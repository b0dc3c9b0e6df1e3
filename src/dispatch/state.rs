//! Dispatch state enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stage a single dispatch has reached.
///
/// `Loaded → Compiled → Running → Completed`, with a transition to
/// `Aborted` possible from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DispatchState {
    /// Nothing has happened yet
    #[default]
    Pending,
    /// Script bytes were read
    Loaded,
    /// Bindings were built and the script compiled
    Compiled,
    /// The script is executing
    Running,
    /// The script finished and the reply was extracted
    Completed,
    /// The dispatch failed
    Aborted,
}

impl DispatchState {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true if moving from this state to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Loaded)
            | (Self::Loaded, Self::Compiled)
            | (Self::Compiled, Self::Running)
            | (Self::Running, Self::Completed) => true,
            (state, Self::Aborted) => !state.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Loaded => write!(f, "loaded"),
            Self::Compiled => write!(f, "compiled"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_pending() {
        assert_eq!(DispatchState::default(), DispatchState::Pending);
    }

    #[test]
    fn forward_path_is_allowed() {
        assert!(DispatchState::Pending.can_transition_to(DispatchState::Loaded));
        assert!(DispatchState::Loaded.can_transition_to(DispatchState::Compiled));
        assert!(DispatchState::Compiled.can_transition_to(DispatchState::Running));
        assert!(DispatchState::Running.can_transition_to(DispatchState::Completed));
    }

    #[test]
    fn skipping_states_is_not_allowed() {
        assert!(!DispatchState::Loaded.can_transition_to(DispatchState::Running));
        assert!(!DispatchState::Compiled.can_transition_to(DispatchState::Completed));
        assert!(!DispatchState::Completed.can_transition_to(DispatchState::Running));
    }

    #[test]
    fn abort_from_any_live_state() {
        for state in [
            DispatchState::Pending,
            DispatchState::Loaded,
            DispatchState::Compiled,
            DispatchState::Running,
        ] {
            assert!(state.can_transition_to(DispatchState::Aborted));
        }
        assert!(!DispatchState::Completed.can_transition_to(DispatchState::Aborted));
        assert!(!DispatchState::Aborted.can_transition_to(DispatchState::Aborted));
    }

    #[test]
    fn display_format() {
        assert_eq!(DispatchState::Loaded.to_string(), "loaded");
        assert_eq!(DispatchState::Aborted.to_string(), "aborted");
    }
}
