//! Running status folded from watcher events.
//!
//! [`StatusBoard`] subscribes to the [`super::EventBus`] and keeps a
//! [`StatusSnapshot`] behind a [`tokio::sync::RwLock`]. The `/status`
//! endpoint reads a clone of the snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use super::{RunId, WatchEvent};

/// State of the most recent replication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationState {
    /// Dump/restore in progress.
    Running,
    /// Both tools exited successfully.
    Completed,
    /// Dump or restore failed.
    Failed,
}

/// Most recent replication attempt.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicationStatus {
    /// Attempt id.
    pub run_id: RunId,
    /// Current state.
    pub state: ReplicationState,
    /// Counter value that triggered the attempt.
    pub trigger_changes: i64,
    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
    /// Failure message, if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Most recent completed risk sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepStatus {
    /// Sweep id.
    pub run_id: RunId,
    /// Patients read.
    pub checked: usize,
    /// Patients at or above the threshold.
    pub over_threshold: usize,
    /// Alerts delivered.
    pub sent: usize,
    /// Alerts that failed.
    pub failed: usize,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}

/// Aggregate view served at `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Process start time.
    pub started_at: DateTime<Utc>,
    /// Latest replication attempt.
    pub last_replication: Option<ReplicationStatus>,
    /// Successful replications since start.
    pub replications_succeeded: u64,
    /// Failed replications since start.
    pub replications_failed: u64,
    /// Latest finished sweep.
    pub last_sweep: Option<SweepStatus>,
    /// Alerts delivered since start.
    pub alerts_sent: u64,
    /// Alerts that failed since start.
    pub alerts_failed: u64,
}

impl StatusSnapshot {
    /// Creates an empty snapshot stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            last_replication: None,
            replications_succeeded: 0,
            replications_failed: 0,
            last_sweep: None,
            alerts_sent: 0,
            alerts_failed: 0,
        }
    }

    /// Folds one event into the snapshot.
    pub fn apply(&mut self, event: &WatchEvent) {
        match event {
            WatchEvent::ReplicationStarted {
                run_id,
                current_changes,
                timestamp,
                ..
            } => {
                self.last_replication = Some(ReplicationStatus {
                    run_id: *run_id,
                    state: ReplicationState::Running,
                    trigger_changes: *current_changes,
                    updated_at: *timestamp,
                    error: None,
                });
            }
            WatchEvent::ReplicationCompleted {
                run_id, timestamp, ..
            } => {
                self.replications_succeeded = self.replications_succeeded.saturating_add(1);
                self.finish_replication(*run_id, ReplicationState::Completed, *timestamp, None);
            }
            WatchEvent::ReplicationFailed {
                run_id,
                error,
                timestamp,
            } => {
                self.replications_failed = self.replications_failed.saturating_add(1);
                self.finish_replication(
                    *run_id,
                    ReplicationState::Failed,
                    *timestamp,
                    Some(error.clone()),
                );
            }
            WatchEvent::AlertSent { .. } => {
                self.alerts_sent = self.alerts_sent.saturating_add(1);
            }
            WatchEvent::AlertFailed { .. } => {
                self.alerts_failed = self.alerts_failed.saturating_add(1);
            }
            WatchEvent::SweepCompleted {
                run_id,
                checked,
                over_threshold,
                sent,
                failed,
                timestamp,
            } => {
                self.last_sweep = Some(SweepStatus {
                    run_id: *run_id,
                    checked: *checked,
                    over_threshold: *over_threshold,
                    sent: *sent,
                    failed: *failed,
                    completed_at: *timestamp,
                });
            }
        }
    }

    fn finish_replication(
        &mut self,
        run_id: RunId,
        state: ReplicationState,
        at: DateTime<Utc>,
        error: Option<String>,
    ) {
        if let Some(status) = self
            .last_replication
            .as_mut()
            .filter(|s| s.run_id == run_id)
        {
            status.state = state;
            status.updated_at = at;
            status.error = error;
            return;
        }

        // Started event was dropped by a lagging receiver.
        self.last_replication = Some(ReplicationStatus {
            run_id,
            state,
            trigger_changes: 0,
            updated_at: at,
            error,
        });
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, concurrently readable status snapshot.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusBoard {
    /// Creates a board with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current snapshot.
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.clone()
    }

    /// Applies a single event.
    pub async fn record(&self, event: &WatchEvent) {
        self.inner.write().await.apply(event);
    }

    /// Spawns a task that applies every event received on `rx` until the
    /// bus is closed.
    #[must_use]
    pub fn spawn_listener(&self, mut rx: broadcast::Receiver<WatchEvent>) -> JoinHandle<()> {
        let board = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => board.record(&event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "status board lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("status board listener stopped");
        })
    }
}
