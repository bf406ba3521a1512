/// Analysis jobs — a cancellable handle wrapping one synchronous engine
/// call, with progress reported over a bounded channel.
///
/// The engine itself is a single pure call and is never re-entered
/// mid-computation. Progress is therefore heuristic: the job walks the
/// snapshot once (validating mount data) to emit per-container progress,
/// then runs the full analysis pass and sends the result.
use crossbeam_channel::{bounded, Receiver};
use mountsleuth_core::analysis;
use mountsleuth_core::model::{AnalysisResult, Snapshot};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Maximum number of progress messages that may queue in the channel.
///
/// The SSE forwarder drains continuously, so this only needs to absorb a
/// burst while a slow client catches up; past it the job thread blocks
/// briefly instead of growing the heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Progress updates sent from the job thread.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobProgress {
    /// The job accepted the snapshot and is starting.
    Started { containers_total: usize },
    /// Periodic update while containers are validated.
    Progress { processed: usize, total: usize },
    /// Analysis finished; the full result is attached.
    Complete { result: Box<AnalysisResult> },
    /// The job observed the cancel flag and stopped early.
    Cancelled,
}

impl JobProgress {
    /// SSE event name for this update.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::Complete { .. } => "complete",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Handle to a running or completed analysis job. Allows cancellation and
/// receiving progress updates.
pub struct JobHandle {
    /// Receiver for progress updates from the job thread.
    pub progress_rx: Receiver<JobProgress>,
    cancel_flag: Arc<AtomicBool>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl JobHandle {
    /// Request the job to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Start an analysis job on a background thread.
///
/// Returns a `JobHandle` immediately; progress, the final result, and
/// cancellation acknowledgements all arrive on `progress_rx`.
pub fn start_analysis(snapshot: Snapshot) -> JobHandle {
    let (progress_tx, progress_rx) = bounded::<JobProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel = cancel_flag.clone();

    let thread = thread::Builder::new()
        .name("mountsleuth-analysis".into())
        .spawn(move || {
            let total = snapshot.containers.len();
            let _ = progress_tx.send(JobProgress::Started {
                containers_total: total,
            });

            let mut invalid_mounts = 0usize;
            for (i, container) in snapshot.containers.iter().enumerate() {
                if cancel.load(Ordering::Relaxed) {
                    let _ = progress_tx.send(JobProgress::Cancelled);
                    return;
                }
                invalid_mounts += container
                    .mounts
                    .iter()
                    .filter(|m| m.validate().is_err())
                    .count();
                let _ = progress_tx.send(JobProgress::Progress {
                    processed: i + 1,
                    total,
                });
            }
            if invalid_mounts > 0 {
                debug!(invalid_mounts, "snapshot contains invalid mounts; they will be skipped");
            }
            if cancel.load(Ordering::Relaxed) {
                let _ = progress_tx.send(JobProgress::Cancelled);
                return;
            }

            let result = analysis::analyze(&snapshot);
            info!(
                conflicts = result.conflicts.len(),
                "analysis job complete"
            );
            let _ = progress_tx.send(JobProgress::Complete {
                result: Box::new(result),
            });
        })
        .expect("failed to spawn analysis thread");

    JobHandle {
        progress_rx,
        cancel_flag,
        _thread: Some(thread),
    }
}
