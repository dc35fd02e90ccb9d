//! Change-triggered replication watcher.

use chrono::Utc;

use super::ChangeSource;
use super::replicator::Replicator;
use super::runner::CommandRunner;
use crate::domain::{ChangeTracker, ChangeVerdict, EventBus, RunId, WatchEvent};
use crate::error::SentinelError;
use crate::scheduler::PeriodicTask;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// First reading recorded; nothing replicated.
    Baseline,
    /// No new changes.
    Unchanged,
    /// Counter went backwards; rebaselined without replicating.
    Reset,
    /// Dump and restore succeeded.
    Replicated(RunId),
    /// Dump or restore failed; the baseline still advanced.
    ReplicationFailed(RunId),
}

/// Polls the change counter and replicates when it grows.
#[derive(Debug)]
pub struct ReplicationWatcher<S, R> {
    source: S,
    replicator: Replicator<R>,
    tracker: ChangeTracker,
    event_bus: EventBus,
}

impl<S: ChangeSource, R: CommandRunner> ReplicationWatcher<S, R> {
    /// Creates a watcher with no baseline.
    #[must_use]
    pub fn new(source: S, replicator: Replicator<R>, event_bus: EventBus) -> Self {
        Self {
            source,
            replicator,
            tracker: ChangeTracker::new(),
            event_bus,
        }
    }

    /// Returns the change tracker.
    #[must_use]
    pub const fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Returns the replicator.
    #[must_use]
    pub const fn replicator(&self) -> &Replicator<R> {
        &self.replicator
    }

    /// Reads the counter once and replicates if it increased.
    ///
    /// # Errors
    ///
    /// Returns an error only if the counter cannot be read. Replication
    /// failures are reported through [`TickOutcome::ReplicationFailed`].
    pub async fn poll_once(&mut self) -> Result<TickOutcome, SentinelError> {
        let total = self.source.total_changes().await?;

        match self.tracker.observe(total) {
            ChangeVerdict::Baseline(current) => {
                tracing::info!(total_changes = current, "change counter baseline recorded");
                Ok(TickOutcome::Baseline)
            }
            ChangeVerdict::Unchanged => {
                tracing::trace!(total_changes = total, "no database activity");
                Ok(TickOutcome::Unchanged)
            }
            ChangeVerdict::Reset { previous, current } => {
                tracing::warn!(
                    previous,
                    current,
                    "change counter went backwards, statistics were reset"
                );
                Ok(TickOutcome::Reset)
            }
            ChangeVerdict::Increased { previous, current } => {
                Ok(self.replicate(previous, current).await)
            }
        }
    }

    async fn replicate(&mut self, previous: i64, current: i64) -> TickOutcome {
        let run_id = RunId::new();
        tracing::info!(%run_id, previous, current, "database activity detected, replicating");
        self.event_bus.publish(WatchEvent::ReplicationStarted {
            run_id,
            previous_changes: previous,
            current_changes: current,
            timestamp: Utc::now(),
        });

        let result = self.replicator.replicate().await;
        self.tracker.commit(current);

        match result {
            Ok(report) => {
                tracing::info!(
                    %run_id,
                    dump_ms = report.dump_ms,
                    restore_ms = report.restore_ms,
                    "database replication completed"
                );
                self.event_bus.publish(WatchEvent::ReplicationCompleted {
                    run_id,
                    dump_ms: report.dump_ms,
                    restore_ms: report.restore_ms,
                    timestamp: Utc::now(),
                });
                TickOutcome::Replicated(run_id)
            }
            Err(e) => {
                tracing::error!(%run_id, code = e.error_code(), error = %e, "database replication failed");
                self.event_bus.publish(WatchEvent::ReplicationFailed {
                    run_id,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                TickOutcome::ReplicationFailed(run_id)
            }
        }
    }
}

impl<S, R> PeriodicTask for ReplicationWatcher<S, R>
where
    S: ChangeSource,
    R: CommandRunner,
{
    fn name(&self) -> &'static str {
        "replication"
    }

    async fn tick(&mut self) {
        if let Err(e) = self.poll_once().await {
            tracing::warn!(code = e.error_code(), error = %e, "failed to read change counter");
        }
    }
}
