//! Best-effort background jobs.
//!
//! Request handlers enqueue jobs without waiting for them. A single worker drains the queue
//! and reports failures on an error channel, where they are logged and counted.

use crate::db::{logins, organizations, Database, StoreError};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Append a row to the login audit log
    RecordLogin { user_id: i64 },
    /// Update the last seen timestamp of an organization member
    TouchMemberSeen { member_id: i64 },
}

/// A job that could not be completed
#[derive(Debug)]
pub struct TaskFailure {
    pub task: Task,
    pub error: StoreError,
}

/// Counters of the background queue
#[derive(Debug, Default)]
pub struct TaskStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    dropped: AtomicUsize,
}

impl TaskStats {
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Handle used by request handlers to enqueue jobs
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<Task>,
    stats: Arc<TaskStats>,
}

impl TaskQueue {
    /// Enqueues a job without waiting, a full or closed queue drops it
    pub fn enqueue(&self, task: Task) {
        match self.sender.try_send(task) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(task)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Background queue is full, dropping {:?}", task);
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Background queue is closed, dropping {:?}", task);
            }
        }
    }

    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }
}

/// Starts the worker and the failure reporter.
///
/// Both stop once `shutdown` is cancelled. Jobs still queued at that point are discarded.
pub fn spawn(
    db: Database,
    capacity: usize,
    shutdown: CancellationToken,
) -> (TaskQueue, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let (failures, failure_receiver) = mpsc::unbounded_channel();
    let stats = Arc::new(TaskStats::default());

    tokio::spawn(report_failures(failure_receiver, Arc::clone(&stats)));
    let worker = tokio::spawn(run_worker(
        db,
        receiver,
        failures,
        Arc::clone(&stats),
        shutdown,
    ));

    (TaskQueue { sender, stats }, worker)
}

async fn run_worker(
    db: Database,
    mut receiver: mpsc::Receiver<Task>,
    failures: mpsc::UnboundedSender<TaskFailure>,
    stats: Arc<TaskStats>,
    shutdown: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Background worker shutting down");
                break;
            }
            task = receiver.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        debug!("Running background task {:?}", task);
        match execute(&db, &task).await {
            Ok(()) => {
                stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                if let Err(e) = failures.send(TaskFailure { task, error }) {
                    error!("Failed to report background task failure: {:?}", e.0);
                }
            }
        }
    }
}

async fn execute(db: &Database, task: &Task) -> Result<(), StoreError> {
    match task {
        Task::RecordLogin { user_id } => logins::record(db.pool(), *user_id).await,
        Task::TouchMemberSeen { member_id } => {
            organizations::touch_member_seen(db.pool(), *member_id, Utc::now()).await
        }
    }
}

async fn report_failures(
    mut receiver: mpsc::UnboundedReceiver<TaskFailure>,
    stats: Arc<TaskStats>,
) {
    while let Some(failure) = receiver.recv().await {
        stats.failed.fetch_add(1, Ordering::Relaxed);
        error!(
            "Background task {:?} failed: {}",
            failure.task, failure.error
        );
    }
}
