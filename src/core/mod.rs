//! Runtime core: coordinator lifecycle and the monitor event loop.
//!
//! The only public API from this module is [`Coordinator`]. Internal
//! modules:
//! - [`coordinator`]: public surface, report rendezvous, shutdown requests;
//! - [`monitor`]: the background state machine servicing all events.

mod coordinator;
mod monitor;

pub use coordinator::Coordinator;
