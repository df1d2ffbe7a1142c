//! # Optional OS signal adapter (feature `signals`).
//!
//! Wires process termination signals into a [`Coordinator`]: on the first
//! signal the adapter marks the interrupted condition and cancels the
//! coordinator's context, which stops the monitor and makes its finalizer
//! run cleanup. Registration is the owner's choice; nothing in the core
//! coordinator depends on this module.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use errvisor::{signals, Config, Coordinator};
//!
//! # async fn demo() -> Result<(), errvisor::CoordinatorError> {
//! let coordinator = Arc::new(Coordinator::new(Config::default()));
//! coordinator.start().await?;
//! signals::bind(Arc::clone(&coordinator));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::core::Coordinator;

/// Spawns a task that waits for a termination signal and shuts the
/// coordinator down through its interrupted path.
///
/// Each call creates independent signal listeners. The returned handle can
/// be used to abort the adapter if the owner tears down first.
pub fn bind(coordinator: Arc<Coordinator>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if wait_for_shutdown_signal().await.is_ok() {
            coordinator.mark_interrupted();
            coordinator.context().cancel();
        }
    })
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal
/// registration fails.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal
/// registration fails.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
