/// End-to-end analysis job tests.
///
/// These exercise the real `jobs::start_analysis` code path — thread
/// spawning, progress reporting over the channel, cancellation — against
/// in-memory snapshots, the same way the SSE handler drives it.
use mountsleuth_server::jobs::{start_analysis, JobHandle, JobProgress, PROGRESS_CHANNEL_CAPACITY};
use mountsleuth_core::model::{Container, Mount, MountMode, Snapshot};
use std::time::Duration;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn snapshot(container_count: usize) -> Snapshot {
    let containers = (0..container_count)
        .map(|i| {
            let mut c = Container::new(format!("id{i:03}"), format!("app{i}"), "img:latest");
            c.mounts = vec![Mount::new(
                format!("/data/app{i}"),
                format!("/vol{i}"),
                MountMode::Rw,
            )];
            c
        })
        .collect();
    Snapshot::from_containers(containers)
}

/// Drain progress messages until a terminal one arrives (or panic after a
/// generous timeout so a stuck job cannot hang the suite).
fn drain_to_terminal(handle: &JobHandle) -> JobProgress {
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    loop {
        assert!(
            std::time::Instant::now() < deadline,
            "job did not finish within 30 seconds"
        );
        match handle.progress_rx.try_recv() {
            Ok(progress @ (JobProgress::Complete { .. } | JobProgress::Cancelled)) => {
                return progress;
            }
            Ok(_) => continue,
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                panic!("job channel disconnected before a terminal message");
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A job over a clean snapshot must complete with a result counting every
/// container.
#[test]
fn job_completes_with_result() {
    let handle = start_analysis(snapshot(5));
    match drain_to_terminal(&handle) {
        JobProgress::Complete { result } => {
            assert_eq!(result.summary.containers_analyzed, 5);
        }
        other => panic!("expected Complete, got {other:?}"),
    }
}

/// The first message must be `Started` with the container total.
#[test]
fn job_reports_started_first() {
    let handle = start_analysis(snapshot(3));
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    loop {
        assert!(std::time::Instant::now() < deadline, "no Started message");
        match handle.progress_rx.try_recv() {
            Ok(JobProgress::Started { containers_total }) => {
                assert_eq!(containers_total, 3);
                break;
            }
            Ok(other) => panic!("expected Started first, got {other:?}"),
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(2));
            }
            Err(err) => panic!("channel error: {err}"),
        }
    }
    drain_to_terminal(&handle);
}

/// Progress counters must be monotonic and end at the total.
#[test]
fn job_progress_is_monotonic() {
    let handle = start_analysis(snapshot(20));
    let mut last = 0usize;
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    loop {
        assert!(std::time::Instant::now() < deadline, "job timed out");
        match handle.progress_rx.try_recv() {
            Ok(JobProgress::Progress { processed, total }) => {
                assert_eq!(total, 20);
                assert!(processed > last, "progress went backwards");
                last = processed;
            }
            Ok(JobProgress::Complete { .. }) => break,
            Ok(_) => continue,
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(2));
            }
            Err(err) => panic!("channel error: {err}"),
        }
    }
    assert_eq!(last, 20, "progress must reach the container total");
}

/// Cancellation must surface a terminal message promptly. The job may
/// already have completed by the time the flag is read, so either
/// terminal message is acceptable.
#[test]
fn job_cancellation_sends_terminal_message() {
    let handle = start_analysis(snapshot(50));
    handle.cancel();
    assert!(handle.is_cancelled());
    match drain_to_terminal(&handle) {
        JobProgress::Cancelled | JobProgress::Complete { .. } => {}
        other => panic!("unexpected terminal message: {other:?}"),
    }
}

/// An empty snapshot completes immediately with a healthy, empty result.
#[test]
fn job_on_empty_snapshot_completes() {
    let handle = start_analysis(snapshot(0));
    match drain_to_terminal(&handle) {
        JobProgress::Complete { result } => {
            assert_eq!(result.summary.containers_analyzed, 0);
            assert!(result.conflicts.is_empty());
        }
        other => panic!("expected Complete, got {other:?}"),
    }
}

/// The channel capacity must stay positive — a zero capacity would make
/// every `send()` block immediately.
const _: () = assert!(
    PROGRESS_CHANNEL_CAPACITY > 0,
    "PROGRESS_CHANNEL_CAPACITY must be > 0"
);
