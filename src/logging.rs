//! # Optional text log streams for coordinator diagnostics.
//!
//! The coordinator owns two independent streams:
//!
//! - **internal**: the coordinator's own diagnostics (monitor state changes,
//!   shutdown sequencing), for debugging the coordinator itself;
//! - **verbose**: user-facing lines (last recorded fault, cleanup progress).
//!
//! Both start disabled; enabling one sets its prefix and turns it on. Each
//! line is rendered as `"{prefix}{message}"` and handed to the stream's
//! [`Sink`] (stdout by default). Streams are order-insensitive side
//! channels: nothing in the coordinator depends on a write completing.
//!
//! ## Example
//! ```rust
//! use errvisor::{Config, Coordinator};
//!
//! let coordinator = Coordinator::new(Config::default());
//! coordinator.enable_internal_logging("[errvisor] ");
//! coordinator.enable_verbose_logging("app: ");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

/// Destination for rendered log lines.
///
/// Implement this to redirect a stream into a test buffer, a file writer,
/// or a structured logger adapter.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Writes one rendered line (prefix already applied).
    async fn write(&self, line: &str);
}

/// Default sink: prints each line to stdout.
pub struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn write(&self, line: &str) {
        println!("{line}");
    }
}

/// Selects one of the coordinator's two log streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// Coordinator-internal diagnostics.
    Internal,
    /// User-facing output.
    Verbose,
}

/// One optionally-enabled stream: enabled flag, prefix, sink.
pub(crate) struct LogStream {
    enabled: AtomicBool,
    prefix: RwLock<String>,
    sink: RwLock<Arc<dyn Sink>>,
}

impl LogStream {
    fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            prefix: RwLock::new(String::new()),
            sink: RwLock::new(Arc::new(StdoutSink)),
        }
    }

    pub(crate) fn enable(&self, prefix: impl Into<String>) {
        self.set_prefix(prefix);
        self.enabled.store(true, Ordering::Release);
    }

    pub(crate) fn set_prefix(&self, prefix: impl Into<String>) {
        *self
            .prefix
            .write()
            .unwrap_or_else(PoisonError::into_inner) = prefix.into();
    }

    pub(crate) fn set_sink(&self, sink: Arc<dyn Sink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    pub(crate) async fn write(&self, message: &str) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }
        let line = {
            let prefix = self.prefix.read().unwrap_or_else(PoisonError::into_inner);
            format!("{prefix}{message}")
        };
        let sink = self
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sink.write(&line).await;
    }
}

/// The coordinator's pair of streams, shared with the monitor task.
pub(crate) struct Logs {
    internal: LogStream,
    verbose: LogStream,
}

impl Logs {
    pub(crate) fn new() -> Self {
        Self {
            internal: LogStream::new(),
            verbose: LogStream::new(),
        }
    }

    pub(crate) fn stream(&self, kind: StreamKind) -> &LogStream {
        match kind {
            StreamKind::Internal => &self.internal,
            StreamKind::Verbose => &self.verbose,
        }
    }

    pub(crate) async fn internal(&self, message: &str) {
        self.internal.write(message).await;
    }

    pub(crate) async fn verbose(&self, message: &str) {
        self.verbose.write(message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Capture {
        lines: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Sink for Capture {
        async fn write(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    #[tokio::test]
    async fn test_disabled_stream_is_silent() {
        let capture = Arc::new(Capture {
            lines: Mutex::new(Vec::new()),
        });
        let stream = LogStream::new();
        stream.set_sink(capture.clone());

        stream.write("dropped").await;
        assert!(capture.lines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enabled_stream_applies_prefix() {
        let capture = Arc::new(Capture {
            lines: Mutex::new(Vec::new()),
        });
        let stream = LogStream::new();
        stream.set_sink(capture.clone());
        stream.enable("[x] ");

        stream.write("hello").await;
        assert_eq!(capture.lines.lock().unwrap().as_slice(), ["[x] hello"]);
    }

    #[tokio::test]
    async fn test_prefix_is_replaceable() {
        let capture = Arc::new(Capture {
            lines: Mutex::new(Vec::new()),
        });
        let stream = LogStream::new();
        stream.set_sink(capture.clone());
        stream.enable("a: ");
        stream.set_prefix("b: ");

        stream.write("line").await;
        assert_eq!(capture.lines.lock().unwrap().as_slice(), ["b: line"]);
    }
}
