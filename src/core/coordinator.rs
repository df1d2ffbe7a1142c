//! # Coordinator: public lifecycle, report, and shutdown API.
//!
//! The [`Coordinator`] owns the derived cancellation token, the channels
//! into the monitor task, the replaceable policy, and the two log streams.
//! It is the only type users construct; everything else in the crate hangs
//! off it.
//!
//! ## Report rendezvous
//! ```text
//! reporter A ──┐ gate  ┌── send ReportRequest{fault, reply} ──► monitor
//! reporter B ──┤ (one  │                                          │ policy(fault)
//! reporter C ──┘ at a  └──◄── verdict over `reply` ───────────────┘
//!                time)
//! ```
//! The gate (an async mutex held from send through verdict receive) keeps
//! at most one report in flight: a second concurrent call observably blocks
//! until the first has received its verdict. The order in which blocked
//! reporters proceed afterwards is unspecified.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::monitor::{Monitor, MonitorState, ReportRequest};
use crate::error::CoordinatorError;
use crate::fault::Fault;
use crate::logging::{Logs, Sink, StreamKind};
use crate::policy::{default_policy, Policy};

/// Pieces consumed by the monitor task; present until `start()` takes them.
struct MonitorParts {
    report_rx: mpsc::Receiver<ReportRequest>,
    stop_rx: mpsc::Receiver<bool>,
    state_tx: watch::Sender<MonitorState>,
}

/// Concurrency-safe error-reporting coordinator.
///
/// One instance runs exactly one monitor task over its lifetime:
/// `NotRunning → Running → ShuttingDown → Stopped`, never back. After the
/// monitor stops, [`report`](Self::report) and [`halt_if`](Self::halt_if)
/// fail fast with [`CoordinatorError::Stopped`] and
/// [`start`](Self::start) with [`CoordinatorError::AlreadyStarted`].
///
/// All methods take `&self`; wrap the coordinator in an [`Arc`] to share it
/// across tasks.
pub struct Coordinator {
    cfg: Config,
    token: CancellationToken,
    report_tx: mpsc::Sender<ReportRequest>,
    stop_tx: mpsc::Sender<bool>,
    state_rx: watch::Receiver<MonitorState>,
    parts: StdMutex<Option<MonitorParts>>,
    /// Serializes the report rendezvous; held from send to verdict receive.
    gate: Mutex<()>,
    policy: Arc<RwLock<Policy>>,
    interrupted: Arc<AtomicBool>,
    logs: Arc<Logs>,
}

impl Coordinator {
    /// Creates a coordinator rooted at its own internal token.
    pub fn new(cfg: Config) -> Self {
        Self::build(cfg, CancellationToken::new())
    }

    /// Creates a coordinator whose token is derived from `parent`.
    ///
    /// Cancelling `parent` cancels the derived token and stops the monitor.
    pub fn with_parent(cfg: Config, parent: &CancellationToken) -> Self {
        Self::build(cfg, parent.child_token())
    }

    fn build(cfg: Config, token: CancellationToken) -> Self {
        // Single-slot channels: the report slot is part of the mutual
        // exclusion contract, the stop slot makes a second concurrent
        // stop() block while one request is pending.
        let (report_tx, report_rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(MonitorState::NotRunning);

        Self {
            cfg,
            token,
            report_tx,
            stop_tx,
            state_rx,
            parts: StdMutex::new(Some(MonitorParts {
                report_rx,
                stop_rx,
                state_tx,
            })),
            gate: Mutex::new(()),
            policy: Arc::new(RwLock::new(default_policy())),
            interrupted: Arc::new(AtomicBool::new(false)),
            logs: Arc::new(Logs::new()),
        }
    }

    /// Spawns the monitor task and waits until it is servicing events.
    ///
    /// Returns once the monitor's readiness signal has fired;
    /// [`is_running`](Self::is_running) reports `true` from that point on.
    ///
    /// # Errors
    /// [`CoordinatorError::AlreadyStarted`] on any second call, including
    /// after the monitor has stopped; instances are not restartable.
    pub async fn start(&self) -> Result<(), CoordinatorError> {
        let parts = self
            .parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CoordinatorError::AlreadyStarted)?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let monitor = Monitor {
            cfg: self.cfg.clone(),
            token: self.token.clone(),
            report_rx: parts.report_rx,
            stop_rx: parts.stop_rx,
            state: parts.state_tx,
            policy: Arc::clone(&self.policy),
            interrupted: Arc::clone(&self.interrupted),
            logs: Arc::clone(&self.logs),
        };
        tokio::spawn(monitor.run(ready_tx));

        // Fires exactly once, on loop entry; an error here means the
        // monitor died before ever becoming ready.
        ready_rx.await.map_err(|_| CoordinatorError::Stopped)?;
        self.logs.internal("coordinator: started").await;
        Ok(())
    }

    /// Reports a possibly-absent fault and waits for the verdict.
    ///
    /// On a continue verdict this returns `Ok(())`. On a halting verdict it
    /// issues a stop request and escalates with
    /// [`CoordinatorError::Halted`]; there is no path past a halting
    /// verdict. Use `?` at call sites to propagate the escalation.
    ///
    /// Blocks while another report is in flight (mutual exclusion), with no
    /// fairness guarantee among blocked reporters.
    ///
    /// # Errors
    /// - [`CoordinatorError::Halted`] — the policy halted this report.
    /// - [`CoordinatorError::Stopped`] — the monitor has already exited.
    pub async fn report(&self, fault: Option<Fault>) -> Result<(), CoordinatorError> {
        if self.exchange(fault.clone()).await? {
            return Ok(());
        }
        self.logs.internal("report: halting verdict, requesting stop").await;
        self.stop().await;
        Err(CoordinatorError::Halted { fault })
    }

    /// Reports a possibly-absent fault; a halting verdict terminates the
    /// process.
    ///
    /// Identical rendezvous to [`report`](Self::report), but escalation is
    /// process-fatal: the fault is written to both log streams and stderr,
    /// then the process exits with status 1. A continue verdict returns
    /// `Ok(())` and never terminates the process.
    ///
    /// # Errors
    /// [`CoordinatorError::Stopped`] — the monitor has already exited.
    pub async fn halt_if(&self, fault: Option<Fault>) -> Result<(), CoordinatorError> {
        if self.exchange(fault.clone()).await? {
            return Ok(());
        }
        let rendered = match &fault {
            Some(f) => f.to_string(),
            None => "(no fault recorded)".to_string(),
        };
        self.logs.internal("halt_if: halting verdict, terminating").await;
        self.logs.verbose(&format!("halting fault: {rendered}")).await;
        eprintln!("halting fault: {rendered}");
        std::process::exit(1);
    }

    /// One synchronous send/receive rendezvous with the monitor.
    async fn exchange(&self, fault: Option<Fault>) -> Result<bool, CoordinatorError> {
        let _gate = self.gate.lock().await;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.report_tx
            .send(ReportRequest {
                fault,
                reply: reply_tx,
            })
            .await
            .map_err(|_| CoordinatorError::Stopped)?;
        reply_rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    /// Requests shutdown.
    ///
    /// Non-blocking unless a stop request is already pending in the
    /// single-slot channel, in which case this waits for the slot to free.
    /// Errors from a monitor that already exited are ignored; stopping a
    /// stopped coordinator is a no-op.
    pub async fn stop(&self) {
        self.logs.internal("stop: sending shutdown request").await;
        let _ = self.stop_tx.send(true).await;
    }

    /// Waits until the monitor has fully stopped (terminal state).
    ///
    /// Returns immediately if it already has. Waits forever on a
    /// coordinator that was never started.
    pub async fn stopped(&self) {
        let mut state = self.state_rx.clone();
        let _ = state.wait_for(|s| *s == MonitorState::Stopped).await;
    }

    /// Liveness probe: `true` while the monitor is servicing events.
    pub fn is_running(&self) -> bool {
        *self.state_rx.borrow() == MonitorState::Running
    }

    /// Replaces the policy deciding continue vs. halt for each report.
    ///
    /// Takes effect for the next report; a report already being evaluated
    /// keeps the policy it started with.
    pub fn set_policy<F>(&self, policy: F)
    where
        F: Fn(Option<&Fault>) -> bool + Send + Sync + 'static,
    {
        *self
            .policy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(policy);
    }

    /// Returns a clone of the derived cancellation token.
    ///
    /// Cancelling it stops the monitor; owners can also use it to observe
    /// shutdown (`context().cancelled().await`).
    pub fn context(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Records that shutdown was caused by an external interrupt.
    ///
    /// Set by shutdown adapters (e.g. the `signals` feature) before they
    /// cancel the context; the monitor's finalizer runs cleanup only when
    /// this was set.
    pub fn mark_interrupted(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Enables the internal diagnostics stream with the given prefix.
    pub fn enable_internal_logging(&self, prefix: impl Into<String>) {
        self.logs.stream(StreamKind::Internal).enable(prefix);
    }

    /// Enables the user-facing stream with the given prefix.
    pub fn enable_verbose_logging(&self, prefix: impl Into<String>) {
        self.logs.stream(StreamKind::Verbose).enable(prefix);
    }

    /// Replaces the prefix of one log stream.
    pub fn set_prefix(&self, stream: StreamKind, prefix: impl Into<String>) {
        self.logs.stream(stream).set_prefix(prefix);
    }

    /// Replaces the sink backing one log stream (stdout by default).
    pub fn set_sink(&self, stream: StreamKind, sink: Arc<dyn Sink>) {
        self.logs.stream(stream).set_sink(sink);
    }
}
