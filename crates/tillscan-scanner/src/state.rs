//! Capture session state machine.
//!
//! This module holds the session states, the rules for moving between them,
//! and a bounded history of transitions. It does not perform any I/O; the
//! [`SessionController`](crate::session::SessionController) drives it.
//!
//! # Valid Transitions
//!
//! - Idle → Starting → Active / Failed
//! - Starting → Idle (start abandoned before acquiring)
//! - Active → Stopping → Idle
//! - Active → SwitchingDevice → Starting
//! - SwitchingDevice → Idle (switch abandoned)
//! - Failed → Starting (retry or new selection)
//! - any → Idle via [`SessionMachine::reset`] (unmount)
//!
//! # Examples
//!
//! ```
//! use tillscan_scanner::state::{SessionMachine, SessionState};
//!
//! let mut machine = SessionMachine::new();
//! machine.transition_to(SessionState::Starting).unwrap();
//! machine.transition_to(SessionState::Active).unwrap();
//!
//! assert!(machine.transition_to(SessionState::Starting).is_err());
//! assert_eq!(machine.history().len(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tillscan_core::constants::MAX_SESSION_HISTORY;
use tillscan_core::{Error, Result};
use tokio::time::Instant;

use crate::error::AcquireError;

/// Lifecycle state of the single capture session behind a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session and nothing in progress.
    Idle,

    /// Acquiring a session.
    Starting,

    /// Session open and decoding.
    Active,

    /// Tearing the session down after a user stop.
    Stopping,

    /// Tearing the session down to open another device or facing.
    SwitchingDevice,

    /// The last acquire failed; waiting for the user to retry.
    Failed(AcquireError),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Stopping => write!(f, "Stopping"),
            SessionState::SwitchingDevice => write!(f, "SwitchingDevice"),
            SessionState::Failed(_) => write!(f, "Failed"),
        }
    }
}

impl SessionState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use tillscan_scanner::state::SessionState;
    ///
    /// assert!(SessionState::Idle.can_transition_to(&SessionState::Starting));
    /// assert!(!SessionState::Idle.can_transition_to(&SessionState::Active));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Idle, Starting)
                | (Starting, Active | Failed(_) | Idle)
                | (Active, Stopping | SwitchingDevice)
                | (Stopping, Idle)
                | (SwitchingDevice, Starting | Idle)
                | (Failed(_), Starting)
        )
    }

    /// Whether a start, stop or switch is underway in this state.
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Stopping | SessionState::SwitchingDevice
        )
    }

    /// Whether the state is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, SessionState::Failed(_))
    }
}

/// A single recorded state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTransition {
    /// The state transitioned from.
    pub from: SessionState,

    /// The state transitioned to.
    pub to: SessionState,

    /// When the transition occurred.
    pub timestamp: Instant,
}

impl SessionTransition {
    /// Create a new transition record stamped now.
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// State machine for one capture session slot.
///
/// Not thread-safe by itself; the controller keeps it behind its own lock.
#[derive(Debug)]
pub struct SessionMachine {
    current_state: SessionState,
    state_entered_at: Instant,
    history: VecDeque<SessionTransition>,
}

impl SessionMachine {
    /// Create a new machine in the Idle state.
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_SESSION_HISTORY),
        }
    }

    /// Current state.
    pub fn current_state(&self) -> &SessionState {
        &self.current_state
    }

    /// Time spent in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> &VecDeque<SessionTransition> {
        &self.history
    }

    /// Transition to a new state, validating the move.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the move is not allowed
    /// from the current state. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<SessionTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = SessionTransition::new(self.current_state.clone(), new_state.clone());
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to Idle regardless of the current state.
    ///
    /// Used on unmount. Returns `None` if the machine was already idle.
    pub fn reset(&mut self) -> Option<SessionTransition> {
        if self.current_state == SessionState::Idle {
            return None;
        }
        let transition = SessionTransition::new(self.current_state.clone(), SessionState::Idle);
        self.perform_state_change(SessionState::Idle, transition.clone());
        Some(transition)
    }

    fn perform_state_change(&mut self, new_state: SessionState, transition: SessionTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_SESSION_HISTORY {
            self.history.pop_front();
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}
