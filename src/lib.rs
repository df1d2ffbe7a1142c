//! # errvisor
//!
//! **Errvisor** is a small concurrency primitive for Rust: a single
//! background monitor that serializes error reports arriving from
//! arbitrary concurrent tasks, applies a pluggable continue/halt policy,
//! and drives a shared cancellation token to propagate shutdown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌────────────┐   ┌────────────┐   ┌────────────┐
//!  │ reporter 1 │   │ reporter 2 │   │ reporter N │
//!  └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!        │ report(fault)  │                │
//!        ▼                ▼                ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Coordinator (public API)                                 │
//! │  - gate: one report in flight at a time                   │
//! │  - report channel (single slot, request + reply oneshot)  │
//! │  - stop channel (single slot)                             │
//! │  - derived CancellationToken                              │
//! └────────────────────────────┬──────────────────────────────┘
//!                              ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Monitor task (tokio::select! loop, no branch priority)   │
//! │  - token cancelled  → shut down                           │
//! │  - stop request     → cancel token, shut down             │
//! │  - report           → policy(fault) → verdict reply       │
//! └──────┬──────────────────────────────────────────┬─────────┘
//!        ▼                                          ▼
//!   Policy (continue/halt predicate)     Logs (internal + verbose
//!   default: continue ⇔ no fault          streams, settable prefix)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Coordinator::new / with_parent
//!   └─► start()          spawns the monitor, waits for its readiness
//!   └─► report(fault)    rendezvous; Ok on continue, Err(Halted) on halt
//!   └─► halt_if(fault)   rendezvous; process exit on halt
//!   └─► stop()           shutdown request; monitor cancels the token
//!   └─► stopped()        wait for the terminal state
//!
//! NotRunning ──► Running ──► ShuttingDown ──► Stopped   (one cycle,
//!                                                        never reused)
//! ```
//!
//! ## Features
//! | Area           | Description                                              | Key types                 |
//! |----------------|----------------------------------------------------------|---------------------------|
//! | **Lifecycle**  | Start once, observe liveness, stop, await full shutdown. | [`Coordinator`]           |
//! | **Reports**    | Synchronous report-and-verdict exchange, serialized.     | [`Fault`]                 |
//! | **Policies**   | Pluggable continue/halt predicate per coordinator.       | [`Policy`]                |
//! | **Errors**     | Typed escalation and lifecycle failures.                 | [`CoordinatorError`]      |
//! | **Logging**    | Two optional prefix-able text streams.                   | [`Sink`], [`StreamKind`]  |
//! | **Config**     | Shutdown/cleanup timing.                                 | [`Config`]                |
//!
//! ## Optional features
//! - `signals`: exports the [`signals`] module, an adapter that turns OS
//!   termination signals into an interrupted shutdown.
//!
//! ## Escalation tiers
//! The entry point, not the fault, selects the tier:
//! - [`Coordinator::report`] re-raises: a halting verdict becomes
//!   [`CoordinatorError::Halted`] after a best-effort stop request, and
//!   `?` carries it up the caller chain.
//! - [`Coordinator::halt_if`] is process-fatal: a halting verdict logs the
//!   fault and exits the process.
//!
//! ## Example
//! ```rust
//! use errvisor::{Config, Coordinator, Fault};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Coordinator::new(Config::default());
//!
//!     // Continue iff the cause is a known-transient one.
//!     coordinator.set_policy(|fault: Option<&Fault>| match fault {
//!         None => true,
//!         Some(f) => f.cause == "retry",
//!     });
//!
//!     coordinator.start().await?;
//!
//!     // No fault, and a tolerated fault: both continue.
//!     coordinator.report(None).await?;
//!     coordinator.report(Some(Fault::message("retry"))).await?;
//!
//!     coordinator.stop().await;
//!     coordinator.stopped().await;
//!     assert!(!coordinator.is_running());
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod fault;
mod logging;
mod policy;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::Coordinator;
pub use error::CoordinatorError;
pub use fault::Fault;
pub use logging::{Sink, StdoutSink, StreamKind};
pub use policy::Policy;

// Optional: OS signal adapter.
// Enable with: `--features signals`
#[cfg(feature = "signals")]
pub mod signals;
