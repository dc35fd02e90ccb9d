//! Replication: watch the source's change counter, dump and restore on
//! activity.
//!
//! [`ReplicationWatcher`] reads the counter through a [`ChangeSource`],
//! and when it grows hands over to a [`Replicator`], which launches
//! `pg_dump` then `pg_restore` through a [`CommandRunner`].

pub mod command;
pub mod replicator;
pub mod runner;
pub mod watcher;

use std::future::Future;

use crate::error::SentinelError;

pub use command::{CommandSpec, dump_command, restore_command};
pub use replicator::{ReplicationReport, Replicator};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use watcher::{ReplicationWatcher, TickOutcome};

/// Source of the aggregate row-change counter.
pub trait ChangeSource: Send + Sync {
    /// Returns inserted + updated + deleted tuples over all user tables.
    fn total_changes(&self) -> impl Future<Output = Result<i64, SentinelError>> + Send;
}
