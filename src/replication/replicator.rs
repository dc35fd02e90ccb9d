//! Dump-then-restore replication.

use std::time::Instant;

use super::command::CommandSpec;
use super::runner::CommandRunner;
use crate::error::SentinelError;

/// Timings of a successful replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationReport {
    /// Milliseconds spent dumping the source.
    pub dump_ms: u64,
    /// Milliseconds spent restoring into the target.
    pub restore_ms: u64,
}

/// Runs `pg_dump` against the source, then `pg_restore` into the target.
#[derive(Debug, Clone)]
pub struct Replicator<R> {
    runner: R,
    dump: CommandSpec,
    restore: CommandSpec,
}

impl<R: CommandRunner> Replicator<R> {
    /// Creates a replicator from prepared dump and restore commands.
    #[must_use]
    pub const fn new(runner: R, dump: CommandSpec, restore: CommandSpec) -> Self {
        Self {
            runner,
            dump,
            restore,
        }
    }

    /// Returns the runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Performs one full replication.
    ///
    /// The restore is skipped if the dump fails.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Spawn`] if a tool cannot be launched and
    /// [`SentinelError::CommandFailed`] if one exits unsuccessfully.
    pub async fn replicate(&self) -> Result<ReplicationReport, SentinelError> {
        tracing::info!(tool = %self.dump.tool, "dumping source database");
        let dump_ms = self.run_step(&self.dump).await?;

        tracing::info!(tool = %self.restore.tool, "restoring into target database");
        let restore_ms = self.run_step(&self.restore).await?;

        Ok(ReplicationReport {
            dump_ms,
            restore_ms,
        })
    }

    async fn run_step(&self, spec: &CommandSpec) -> Result<u64, SentinelError> {
        let started = Instant::now();
        let output = self.runner.run(spec).await?.check(&spec.tool)?;
        if !output.stderr.trim().is_empty() {
            tracing::debug!(tool = %spec.tool, stderr = %output.stderr.trim(), "tool warnings");
        }
        Ok(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
    }
}
