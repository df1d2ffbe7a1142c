//! # Continue/halt policies for reported faults.
//!
//! A [`Policy`] is a caller-supplied predicate deciding, for each report,
//! whether the producing task may continue (`true`) or must halt (`false`).
//! The policy receives the fault by reference (or `None` when the reporter
//! checked in without a fault) and must be pure with respect to the
//! coordinator: it may close over external state, but the coordinator never
//! feeds its own state into it.
//!
//! ## Choosing a policy
//!
//! **Default** (installed at construction):
//! ```text
//! continue  ⇔  no fault was reported
//! ```
//!
//! **Custom** (e.g. tolerate a known-transient cause):
//! ```rust
//! use errvisor::{Config, Coordinator, Fault};
//!
//! let coordinator = Coordinator::new(Config::default());
//! coordinator.set_policy(|fault: Option<&Fault>| match fault {
//!     None => true,
//!     Some(f) => f.cause == "retry",
//! });
//! ```

use std::sync::Arc;

use crate::fault::Fault;

/// Shared predicate mapping a possibly-absent fault to a verdict.
///
/// `true` = continue, `false` = halt. Evaluated by the monitor task only,
/// so the closure runs serialized even under concurrent reporters.
pub type Policy = Arc<dyn Fn(Option<&Fault>) -> bool + Send + Sync>;

/// Builds the default policy: continue iff no fault was reported.
pub(crate) fn default_policy() -> Policy {
    Arc::new(|fault: Option<&Fault>| fault.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_continues_without_fault() {
        let policy = default_policy();
        assert!(policy(None));
    }

    #[test]
    fn test_default_halts_on_any_fault() {
        let policy = default_policy();
        let fault = Fault::message("anything");
        assert!(!policy(Some(&fault)));
    }
}
