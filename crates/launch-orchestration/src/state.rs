//! Per-request launch state machine
//!
//! Each launch request walks `Idle → ExclusivityChecked → Cleaned →
//! Prepared → Verified → Launched → Exited`. Any non-terminal state may
//! jump straight to `Failed`. Terminal states never transition again.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// Launch pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchState {
    /// Request accepted, nothing done yet
    Idle,
    /// The game is known not to be running
    ExclusivityChecked,
    /// Stale managed links were removed (or removal was attempted)
    Cleaned,
    /// The canonical install directory points at the requested version
    Prepared,
    /// The executable exists on disk
    Verified,
    /// The process was spawned
    Launched,
    /// The process exited
    Exited,
    /// A step failed
    Failed(ErrorKind),
}

impl LaunchState {
    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Exited | LaunchState::Failed(_))
    }

    /// The next state on the success path, if any
    pub fn successor(&self) -> Option<LaunchState> {
        match self {
            LaunchState::Idle => Some(LaunchState::ExclusivityChecked),
            LaunchState::ExclusivityChecked => Some(LaunchState::Cleaned),
            LaunchState::Cleaned => Some(LaunchState::Prepared),
            LaunchState::Prepared => Some(LaunchState::Verified),
            LaunchState::Verified => Some(LaunchState::Launched),
            LaunchState::Launched => Some(LaunchState::Exited),
            LaunchState::Exited | LaunchState::Failed(_) => None,
        }
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: LaunchState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(next, LaunchState::Failed(_)) || self.successor() == Some(next)
    }
}

/// Tracks the state of one launch request and rejects illegal moves
#[derive(Debug)]
pub struct StateTracker {
    current: LaunchState,
}

impl StateTracker {
    /// Start in `Idle`
    pub fn new() -> Self {
        Self {
            current: LaunchState::Idle,
        }
    }

    /// Current state
    pub fn current(&self) -> LaunchState {
        self.current
    }

    /// Move to `next`, returning false (and staying put) if the move is illegal
    pub fn advance(&mut self, next: LaunchState) -> bool {
        if !self.current.can_transition_to(next) {
            tracing::warn!("Rejected launch state transition {:?} -> {:?}", self.current, next);
            return false;
        }
        tracing::debug!("Launch state {:?} -> {:?}", self.current, next);
        self.current = next;
        true
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
