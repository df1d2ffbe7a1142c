//! Error types used by the errvisor coordinator.
//!
//! A single enum, [`CoordinatorError`], covers every failure the public API
//! can report:
//!
//! - [`CoordinatorError::Halted`] — the policy returned a halting verdict.
//! - [`CoordinatorError::Stopped`] — the monitor has already exited.
//! - [`CoordinatorError::AlreadyStarted`] — second `start()` on the same instance.
//!
//! The type provides [`as_label`](CoordinatorError::as_label) for
//! logging/metrics, following the same labelling convention as the rest of
//! the crate's diagnostics.

use thiserror::Error;

use crate::fault::Fault;

/// # Errors produced by the coordinator.
///
/// `Halted` is the re-raise escalation path of
/// [`Coordinator::report`](crate::Coordinator::report); the other variants
/// are lifecycle violations that fail fast instead of blocking.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The policy returned a halting verdict for this report.
    ///
    /// Carries the fault that was reported, if any (a policy may halt on an
    /// absent fault too).
    #[error("halting verdict{}", halted_suffix(.fault))]
    Halted {
        /// The fault that was reported, if one was present.
        fault: Option<Fault>,
    },

    /// The monitor task has exited; the report or stop request was not
    /// delivered and never will be.
    #[error("coordinator stopped; report not delivered")]
    Stopped,

    /// `start()` was called more than once. A coordinator runs exactly one
    /// monitor per instance and is not restartable after it stops.
    #[error("coordinator already started; instances are not restartable")]
    AlreadyStarted,
}

fn halted_suffix(fault: &Option<Fault>) -> String {
    match fault {
        Some(f) => format!(" for fault: {f}"),
        None => String::new(),
    }
}

impl CoordinatorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use errvisor::CoordinatorError;
    ///
    /// assert_eq!(CoordinatorError::Stopped.as_label(), "coordinator_stopped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CoordinatorError::Halted { .. } => "verdict_halted",
            CoordinatorError::Stopped => "coordinator_stopped",
            CoordinatorError::AlreadyStarted => "coordinator_already_started",
        }
    }

    /// Returns the fault attached to a halting verdict, if any.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            CoordinatorError::Halted { fault } => fault.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let halted = CoordinatorError::Halted { fault: None };
        assert_eq!(halted.as_label(), "verdict_halted");
        assert_eq!(CoordinatorError::Stopped.as_label(), "coordinator_stopped");
        assert_eq!(
            CoordinatorError::AlreadyStarted.as_label(),
            "coordinator_already_started"
        );
    }

    #[test]
    fn test_halted_display_includes_fault() {
        let err = CoordinatorError::Halted {
            fault: Some(Fault::new(3, "boom", "worker")),
        };
        assert_eq!(err.to_string(), "halting verdict for fault: 3: boom: worker");

        let bare = CoordinatorError::Halted { fault: None };
        assert_eq!(bare.to_string(), "halting verdict");
    }
}
