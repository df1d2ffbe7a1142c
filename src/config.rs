//! # Coordinator configuration.
//!
//! Provides [`Config`], the knobs for shutdown sequencing. Both fields only
//! matter on the interrupted (signal-driven) teardown path; the normal stop
//! path ignores them.
//!
//! ## Field semantics
//! - `stop_wait`: bounded wait for the monitor to leave its running state
//!   before cleanup proceeds anyway
//! - `grace`: fixed pause after cleanup, giving in-flight side effects
//!   (log flushes, detached tasks) time to settle

use std::time::Duration;

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// All fields are public; construct with struct update syntax over
/// [`Config::default`] to override selectively.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time cleanup waits for the monitor to leave `Running`.
    ///
    /// Cleanup runs on the interrupted path only. By then the monitor has
    /// normally already left `Running`, making this wait a no-op; the bound
    /// exists so that no ordering of events can stall teardown forever.
    pub stop_wait: Duration,

    /// Grace pause at the end of cleanup before the monitor task returns.
    pub grace: Duration,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `stop_wait = 5s` (ample for a monitor mid-iteration)
    /// - `grace = 3s` (settle window for side effects)
    fn default() -> Self {
        Self {
            stop_wait: Duration::from_secs(5),
            grace: Duration::from_secs(3),
        }
    }
}
