//! End-to-end tests for the coordinator lifecycle, report protocol, and
//! shutdown sequencing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use errvisor::{Config, Coordinator, CoordinatorError, Fault, Sink, StreamKind};

fn quick_config() -> Config {
    Config {
        stop_wait: Duration::from_millis(200),
        grace: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn start_makes_coordinator_immediately_running() {
    let coordinator = Coordinator::new(quick_config());
    assert!(!coordinator.is_running());

    coordinator.start().await.unwrap();
    assert!(coordinator.is_running());
}

#[tokio::test]
async fn second_start_is_rejected() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.start().await.unwrap();

    let err = coordinator.start().await.unwrap_err();
    assert!(matches!(err, CoordinatorError::AlreadyStarted));
}

#[tokio::test]
async fn start_after_stop_is_rejected() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.start().await.unwrap();
    coordinator.stop().await;
    coordinator.stopped().await;

    let err = coordinator.start().await.unwrap_err();
    assert!(matches!(err, CoordinatorError::AlreadyStarted));
}

#[tokio::test]
async fn default_policy_continues_without_fault() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.start().await.unwrap();

    coordinator.report(None).await.unwrap();
    coordinator.report(None).await.unwrap();
    assert!(coordinator.is_running());
}

#[tokio::test]
async fn default_policy_halts_on_fault() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.start().await.unwrap();

    let err = coordinator
        .report(Some(Fault::new(1, "boom", "worker")))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Halted { .. }));
    assert_eq!(err.fault().unwrap().cause, "boom");

    coordinator.stopped().await;
    assert!(!coordinator.is_running());
    assert!(coordinator.context().is_cancelled());
}

#[tokio::test]
async fn custom_policy_tolerates_named_cause() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.set_policy(|fault: Option<&Fault>| match fault {
        None => true,
        Some(f) => f.cause == "retry",
    });
    coordinator.start().await.unwrap();

    coordinator
        .report(Some(Fault::message("retry")))
        .await
        .unwrap();
    assert!(coordinator.is_running());

    let err = coordinator
        .report(Some(Fault::message("fatal")))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Halted { .. }));

    coordinator.stopped().await;
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn halt_if_does_not_terminate_on_continue_verdict() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.set_policy(|_| true);
    coordinator.start().await.unwrap();

    // Process-fatal escalation must not fire for a tolerated fault.
    coordinator
        .halt_if(Some(Fault::message("tolerated")))
        .await
        .unwrap();
    assert!(coordinator.is_running());
}

#[tokio::test]
async fn stop_cancels_context_and_clears_running() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.start().await.unwrap();

    coordinator.stop().await;
    coordinator.stopped().await;

    assert!(!coordinator.is_running());
    assert!(coordinator.context().is_cancelled());
}

#[tokio::test]
async fn stop_requested_before_start_is_honored_at_startup() {
    let coordinator = Coordinator::new(quick_config());

    // Queued in the single-slot stop channel; consumed on loop entry.
    coordinator.stop().await;
    coordinator.start().await.unwrap();

    coordinator.stopped().await;
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn external_parent_cancellation_stops_monitor() {
    let parent = CancellationToken::new();
    let coordinator = Coordinator::with_parent(quick_config(), &parent);
    coordinator.start().await.unwrap();

    parent.cancel();
    coordinator.stopped().await;
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn report_after_shutdown_fails_fast() {
    let coordinator = Coordinator::new(quick_config());
    coordinator.start().await.unwrap();
    coordinator.stop().await;
    coordinator.stopped().await;

    let attempt = tokio::time::timeout(
        Duration::from_secs(1),
        coordinator.report(Some(Fault::message("late"))),
    )
    .await;
    let err = attempt.expect("must not block").unwrap_err();
    assert!(matches!(err, CoordinatorError::Stopped));

    let attempt = tokio::time::timeout(Duration::from_secs(1), coordinator.halt_if(None)).await;
    let err = attempt.expect("must not block").unwrap_err();
    assert!(matches!(err, CoordinatorError::Stopped));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reports_are_mutually_exclusive() {
    let coordinator = Arc::new(Coordinator::new(quick_config()));

    // The policy runs on the monitor; stalling it keeps the first report
    // in flight so the second must wait for the first verdict.
    let in_policy = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicUsize::new(0));
    {
        let in_policy = Arc::clone(&in_policy);
        let overlap = Arc::clone(&overlap);
        coordinator.set_policy(move |_| {
            if in_policy.fetch_add(1, Ordering::SeqCst) > 0 {
                overlap.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(50));
            in_policy.fetch_sub(1, Ordering::SeqCst);
            true
        });
    }
    coordinator.start().await.unwrap();

    let started = Instant::now();
    let a = {
        let c = Arc::clone(&coordinator);
        tokio::spawn(async move { c.report(Some(Fault::message("first"))).await })
    };
    let b = {
        let c = Arc::clone(&coordinator);
        tokio::spawn(async move { c.report(Some(Fault::message("second"))).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // Two 50ms evaluations, strictly one after the other.
    assert!(started.elapsed() >= Duration::from_millis(95));
    assert_eq!(overlap.load(Ordering::SeqCst), 0);
    assert!(coordinator.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reporters_both_receive_verdicts() {
    let coordinator = Arc::new(Coordinator::new(quick_config()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        coordinator.set_policy(move |fault: Option<&Fault>| {
            if let Some(f) = fault {
                seen.lock().unwrap().push(f.cause.clone());
            }
            true
        });
    }
    coordinator.start().await.unwrap();

    let mut handles = Vec::new();
    for cause in ["alpha", "beta"] {
        let c = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            c.report(Some(Fault::message(cause))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, ["alpha", "beta"]);
}

struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

#[async_trait]
impl Sink for CaptureSink {
    async fn write(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

#[tokio::test]
async fn internal_stream_logs_shutdown_with_prefix() {
    let coordinator = Coordinator::new(quick_config());
    let capture = Arc::new(CaptureSink {
        lines: Mutex::new(Vec::new()),
    });
    coordinator.set_sink(StreamKind::Internal, capture.clone());
    coordinator.enable_internal_logging("[diag] ");

    coordinator.start().await.unwrap();
    coordinator.stop().await;
    coordinator.stopped().await;

    let lines = capture.lines.lock().unwrap().clone();
    assert!(lines.iter().all(|l| l.starts_with("[diag] ")));
    assert!(lines.iter().any(|l| l.contains("shutdown request received")));
    assert!(lines.iter().any(|l| l.contains("monitor: stopped")));
}

#[tokio::test]
async fn verbose_stream_reports_last_fault() {
    let coordinator = Coordinator::new(quick_config());
    let capture = Arc::new(CaptureSink {
        lines: Mutex::new(Vec::new()),
    });
    coordinator.set_sink(StreamKind::Verbose, capture.clone());
    coordinator.enable_verbose_logging("");
    coordinator.set_policy(|_| true);

    coordinator.start().await.unwrap();
    coordinator
        .report(Some(Fault::new(9, "flaky", "probe")))
        .await
        .unwrap();
    coordinator.stop().await;
    coordinator.stopped().await;

    let lines = capture.lines.lock().unwrap().clone();
    assert!(lines.iter().any(|l| l.contains("last fault: 9: flaky: probe")));
}

#[tokio::test]
async fn interrupted_shutdown_runs_cleanup() {
    let coordinator = Coordinator::new(quick_config());
    let capture = Arc::new(CaptureSink {
        lines: Mutex::new(Vec::new()),
    });
    coordinator.set_sink(StreamKind::Verbose, capture.clone());
    coordinator.enable_verbose_logging("");

    coordinator.start().await.unwrap();
    coordinator.mark_interrupted();
    coordinator.context().cancel();
    coordinator.stopped().await;

    let lines = capture.lines.lock().unwrap().clone();
    assert!(lines.iter().any(|l| l.contains("performing cleanup")));
}

#[tokio::test]
async fn normal_shutdown_skips_cleanup() {
    let coordinator = Coordinator::new(quick_config());
    let capture = Arc::new(CaptureSink {
        lines: Mutex::new(Vec::new()),
    });
    coordinator.set_sink(StreamKind::Verbose, capture.clone());
    coordinator.enable_verbose_logging("");

    coordinator.start().await.unwrap();
    coordinator.stop().await;
    coordinator.stopped().await;

    let lines = capture.lines.lock().unwrap().clone();
    assert!(!lines.iter().any(|l| l.contains("performing cleanup")));
}
