//! # Monitor task: the coordinator's single-threaded event loop.
//!
//! One monitor task owns all mutable coordinator state. Every other task
//! talks to it through message passing: the report rendezvous, the stop
//! channel, and the cancellation token. The loop is a `tokio::select!`
//! with no fixed branch priority; when several sources are ready at once
//! the choice among them is nondeterministic by design.
//!
//! ## State machine
//! ```text
//! NotRunning ──start()──► Running ──stop/cancel──► ShuttingDown ──► Stopped
//!                            │                                      (terminal)
//!                            └── report ──► policy ──► verdict reply
//! ```
//!
//! ## Loop event sources
//! - **token cancelled** → log, leave the loop (external owners stop the
//!   monitor by cancelling the derived token)
//! - **stop request (`true`)** → log, cancel the token, leave the loop;
//!   `false` is logged and ignored
//! - **report** → record as current fault, evaluate the policy, reply with
//!   the verdict on the request's own channel
//!
//! On exit a finalizer logs the last recorded fault plus the
//! interrupted/stop flags, runs cleanup when an interrupt was recorded, and
//! settles into `Stopped`. Dropping the channel receivers is what makes
//! post-shutdown reporters fail fast instead of blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::fault::Fault;
use crate::logging::Logs;
use crate::policy::Policy;

/// Lifecycle of the monitor task. Transitions are monotonic; `Stopped` is
/// terminal and the instance is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MonitorState {
    NotRunning,
    Running,
    ShuttingDown,
    Stopped,
}

/// One synchronous report: the fault (if any) and the reply channel the
/// verdict must be sent on. Each request carries its own reply channel so
/// verdicts for concurrent reporters can never cross.
pub(crate) struct ReportRequest {
    pub(crate) fault: Option<Fault>,
    pub(crate) reply: oneshot::Sender<bool>,
}

/// The background event loop, spawned by [`Coordinator::start`](crate::Coordinator::start).
pub(crate) struct Monitor {
    pub(crate) cfg: Config,
    pub(crate) token: CancellationToken,
    pub(crate) report_rx: mpsc::Receiver<ReportRequest>,
    pub(crate) stop_rx: mpsc::Receiver<bool>,
    pub(crate) state: watch::Sender<MonitorState>,
    pub(crate) policy: Arc<RwLock<Policy>>,
    pub(crate) interrupted: Arc<AtomicBool>,
    pub(crate) logs: Arc<Logs>,
}

impl Monitor {
    /// Runs the event loop until a stop request, token cancellation, or
    /// the coordinator side dropping its channel handles.
    ///
    /// `ready` fires exactly once, after the state flips to `Running` and
    /// before the first select poll. `start()` awaits it, so no caller
    /// proceeds while the monitor is still being scheduled.
    pub(crate) async fn run(self, ready: oneshot::Sender<()>) {
        let Monitor {
            cfg,
            token,
            mut report_rx,
            mut stop_rx,
            state,
            policy,
            interrupted,
            logs,
        } = self;

        let mut current: Option<Fault> = None;
        let mut stop_seen = false;

        state.send_replace(MonitorState::Running);
        let _ = ready.send(());
        logs.internal("monitor: servicing events").await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    logs.internal("monitor: context cancelled").await;
                    break;
                }
                request = stop_rx.recv() => match request {
                    Some(true) => {
                        logs.internal("monitor: shutdown request received").await;
                        token.cancel();
                        stop_seen = true;
                        break;
                    }
                    Some(false) => {
                        logs.internal("monitor: shutdown request ignored (false)").await;
                    }
                    // Coordinator dropped; nobody can stop us any other way.
                    None => break,
                },
                request = report_rx.recv() => match request {
                    Some(ReportRequest { fault, reply }) => {
                        current = fault;
                        let verdict = evaluate(&policy, current.as_ref());
                        if !verdict {
                            logs.internal("monitor: halting verdict").await;
                        }
                        // Reporter may have given up (task aborted); nothing to do.
                        let _ = reply.send(verdict);
                    }
                    None => break,
                },
            }
        }

        state.send_replace(MonitorState::ShuttingDown);

        let was_interrupted = interrupted.load(Ordering::SeqCst);
        logs.internal(&format!(
            "monitor: final check: interrupted={was_interrupted} stop={stop_seen}"
        ))
        .await;
        match current.as_ref() {
            Some(fault) => logs.verbose(&format!("last fault: {fault}")).await,
            None => logs.verbose("last fault: none").await,
        }
        if was_interrupted {
            cleanup(&cfg, &state, &logs).await;
        }

        state.send_replace(MonitorState::Stopped);
        logs.internal("monitor: stopped").await;
    }
}

/// Evaluates the installed policy against the current fault.
///
/// The policy handle is cloned out of the lock first so a slow policy never
/// blocks `set_policy` callers.
fn evaluate(policy: &Arc<RwLock<Policy>>, fault: Option<&Fault>) -> bool {
    let policy = policy
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    policy(fault)
}

/// Interrupted-path teardown: bounded wait for the state to leave
/// `Running`, then a fixed grace pause.
///
/// On the normal path the state has already left `Running` by the time this
/// runs, so the wait resolves immediately. The timeout bounds the remaining
/// orderings instead of spinning on a flag.
async fn cleanup(cfg: &Config, state: &watch::Sender<MonitorState>, logs: &Logs) {
    let mut state_rx = state.subscribe();
    let settled = timeout(
        cfg.stop_wait,
        state_rx.wait_for(|s| *s != MonitorState::Running),
    )
    .await;
    match settled.map(|_| ()) {
        Ok(_) => logs.verbose("performing cleanup").await,
        Err(_) => {
            logs.verbose("cleanup: wait for shutdown timed out, proceeding")
                .await
        }
    }
    tokio::time::sleep(cfg.grace).await;
}
