//! Events emitted by the watchers.
//!
//! Every replication attempt and risk sweep publishes [`WatchEvent`]s
//! through the [`super::EventBus`]. The [`super::StatusBoard`] folds them
//! into the snapshot served at `/status`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RunId;

/// Domain event emitted by a watcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WatchEvent {
    /// The change counter increased and a dump/restore is starting.
    ReplicationStarted {
        /// Replication attempt id.
        run_id: RunId,
        /// Counter value the previous replication was based on.
        previous_changes: i64,
        /// Counter value that triggered this attempt.
        current_changes: i64,
        /// Start timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Dump and restore both exited successfully.
    ReplicationCompleted {
        /// Replication attempt id.
        run_id: RunId,
        /// Milliseconds spent in `pg_dump`.
        dump_ms: u64,
        /// Milliseconds spent in `pg_restore`.
        restore_ms: u64,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Dump or restore failed.
    ReplicationFailed {
        /// Replication attempt id.
        run_id: RunId,
        /// Rendered error.
        error: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An alert was accepted by the notification endpoint.
    AlertSent {
        /// Sweep id.
        run_id: RunId,
        /// Patient the alert is about.
        patient_id: String,
        /// Score that triggered the alert.
        risk_score: f64,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An alert could not be delivered.
    AlertFailed {
        /// Sweep id.
        run_id: RunId,
        /// Patient the alert is about.
        patient_id: String,
        /// Rendered error.
        error: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A risk sweep finished.
    SweepCompleted {
        /// Sweep id.
        run_id: RunId,
        /// Patients read.
        checked: usize,
        /// Patients at or above the threshold.
        over_threshold: usize,
        /// Alerts delivered.
        sent: usize,
        /// Alerts that failed.
        failed: usize,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl WatchEvent {
    /// Returns the run this event belongs to.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        match self {
            Self::ReplicationStarted { run_id, .. }
            | Self::ReplicationCompleted { run_id, .. }
            | Self::ReplicationFailed { run_id, .. }
            | Self::AlertSent { run_id, .. }
            | Self::AlertFailed { run_id, .. }
            | Self::SweepCompleted { run_id, .. } => *run_id,
        }
    }

    /// Returns the event type discriminator string.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ReplicationStarted { .. } => "replication_started",
            Self::ReplicationCompleted { .. } => "replication_completed",
            Self::ReplicationFailed { .. } => "replication_failed",
            Self::AlertSent { .. } => "alert_sent",
            Self::AlertFailed { .. } => "alert_failed",
            Self::SweepCompleted { .. } => "sweep_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_type_tag() {
        let event = WatchEvent::ReplicationStarted {
            run_id: RunId::new(),
            previous_changes: 10,
            current_changes: 12,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["event_type"], "replication_started");
        assert_eq!(json["current_changes"], 12);
        assert_eq!(event.event_type_str(), "replication_started");
    }

    #[test]
    fn run_id_accessor() {
        let id = RunId::new();
        let event = WatchEvent::AlertFailed {
            run_id: id,
            patient_id: "7".to_string(),
            error: "timeout".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.run_id(), id);
    }
}
