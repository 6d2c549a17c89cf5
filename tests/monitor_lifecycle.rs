//! Monitor lifecycle integration tests
//!
//! Exercises start/stop/status and event ordering with closure-backed
//! work units. The steady task reports a 600-second window over 100
//! remaining requests, so each run completes one quick iteration and
//! then sits in a pacing delay the tests never wait out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use redmon::error::{RedmonError, Result};
use redmon::monitor::{ApiMonitor, MonitorEvent, MonitorTask, TaskFn};
use redmon::ratelimit::RateFeedback;
use tokio::sync::broadcast;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn steady_task() -> Arc<dyn MonitorTask> {
    Arc::new(TaskFn(|| async {
        Ok(RateFeedback {
            used: 1,
            remaining: 100,
            reset_seconds: 600,
        })
    }))
}

fn failing_task() -> Arc<dyn MonitorTask> {
    Arc::new(TaskFn(|| async {
        Err(RedmonError::WorkUnit("remote call exploded".to_string()))
    }))
}

async fn recv_event(rx: &mut broadcast::Receiver<MonitorEvent>) -> MonitorEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn wait_for_stopped(rx: &mut broadcast::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let mut seen = Vec::new();
    loop {
        let event = recv_event(rx).await;
        let stopped = matches!(event, MonitorEvent::Stopped);
        seen.push(event);
        if stopped {
            return seen;
        }
    }
}

#[tokio::test]
async fn started_event_observed_before_start_returns() {
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    monitor.start(steady_task()).await.unwrap();

    // The event must already be buffered once start has returned.
    let event = events.try_recv().expect("Started should be observable");
    assert!(matches!(event, MonitorEvent::Started));

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn failing_work_unit_stops_run_without_iterations() {
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    monitor.start(failing_task()).await.unwrap();
    let seen = wait_for_stopped(&mut events).await;

    assert!(matches!(seen.first(), Some(MonitorEvent::Started)));
    assert!(
        !seen.iter().any(|e| matches!(e, MonitorEvent::Iterated(_))),
        "no iteration should complete when the work unit fails"
    );
    assert!(!monitor.status().running);
    assert!(monitor.status().started_at.is_none());
}

#[tokio::test]
async fn negative_used_feedback_terminates_run() {
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    let task: Arc<dyn MonitorTask> = Arc::new(TaskFn(|| async {
        Ok(RateFeedback {
            used: -1,
            remaining: 50,
            reset_seconds: 30,
        })
    }));

    monitor.start(task).await.unwrap();
    let seen = wait_for_stopped(&mut events).await;

    assert!(
        !seen.iter().any(|e| matches!(e, MonitorEvent::Iterated(_))),
        "rejected feedback must not produce an Iterated event"
    );
    assert!(!monitor.status().running);
}

#[tokio::test]
async fn start_iterate_stop_round_trip() {
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    monitor.start(steady_task()).await.unwrap();

    assert!(matches!(recv_event(&mut events).await, MonitorEvent::Started));

    let report = loop {
        if let MonitorEvent::Iterated(report) = recv_event(&mut events).await {
            break report;
        }
    };
    assert_eq!(report.iteration, 1);
    assert_eq!(report.remaining, 100);
    assert_eq!(report.reset_seconds, 600);

    timeout(WAIT, monitor.stop())
        .await
        .expect("stop should return promptly")
        .unwrap();
    assert!(!monitor.status().running);
}

#[tokio::test]
async fn no_iterated_event_after_stopped() {
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    monitor.start(steady_task()).await.unwrap();

    // Let one iteration land, then stop.
    loop {
        if let MonitorEvent::Iterated(_) = recv_event(&mut events).await {
            break;
        }
    }
    monitor.stop().await.unwrap();

    let seen = wait_for_stopped(&mut events).await;
    assert!(matches!(seen.last(), Some(MonitorEvent::Stopped)));

    // Nothing may trail the Stopped event for this run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn stop_when_idle_is_a_quiet_no_op() {
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    monitor.stop().await.unwrap();

    assert!(!monitor.status().running);
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn iteration_counter_resets_on_restart() {
    let monitor = ApiMonitor::new();

    let mut events = monitor.subscribe();
    monitor.start(steady_task()).await.unwrap();
    loop {
        if let MonitorEvent::Iterated(_) = recv_event(&mut events).await {
            break;
        }
    }
    monitor.stop().await.unwrap();
    assert_eq!(monitor.status().iterations, 1);

    let mut events = monitor.subscribe();
    monitor.start(steady_task()).await.unwrap();
    let report = loop {
        if let MonitorEvent::Iterated(report) = recv_event(&mut events).await {
            break report;
        }
    };
    assert_eq!(report.iteration, 1, "counter restarts from zero");

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn status_counts_iterations_across_calls() {
    let calls = Arc::new(AtomicU32::new(0));
    let monitor = ApiMonitor::new();
    let mut events = monitor.subscribe();

    let task: Arc<dyn MonitorTask> = {
        let calls = Arc::clone(&calls);
        Arc::new(TaskFn(move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                // Tight window: ~10ms spacing keeps iterations flowing.
                Ok(RateFeedback {
                    used: 1,
                    remaining: 100,
                    reset_seconds: 1,
                })
            }
        }))
    };

    monitor.start(task).await.unwrap();

    // Wait for the third iteration to be published.
    loop {
        if let MonitorEvent::Iterated(report) = recv_event(&mut events).await {
            if report.iteration >= 3 {
                break;
            }
        }
    }

    assert!(monitor.status().iterations >= 3);
    assert!(calls.load(Ordering::SeqCst) >= 3);

    monitor.stop().await.unwrap();
    assert!(!monitor.status().running);
}

#[tokio::test]
async fn concurrent_status_reads_never_block() -> Result<()> {
    let monitor = Arc::new(ApiMonitor::new());
    monitor.start(steady_task()).await?;

    let mut readers = Vec::new();
    for _ in 0..8 {
        let monitor = Arc::clone(&monitor);
        readers.push(tokio::spawn(async move {
            for _ in 0..100 {
                let _ = monitor.status();
            }
        }));
    }
    for reader in readers {
        reader.await.expect("status reader panicked");
    }

    monitor.stop().await?;
    Ok(())
}
