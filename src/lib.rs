//! # pg-sentinel
//!
//! Polling watchers around PostgreSQL.
//!
//! - **Replication**: reads the source database's aggregate tuple change
//!   counter and, when it has grown, copies the whole database into a
//!   target with `pg_dump` and `pg_restore`.
//! - **Risk alerts**: reads patient risk scores and posts an alert to a
//!   notification service for every score at or above a threshold.
//!
//! ## Architecture
//!
//! ```text
//! main
//!     │
//!     ├── ReplicationWatcher (replication/)
//!     │     ├── PgChangeSource (persistence/)
//!     │     └── Replicator ── pg_dump, pg_restore
//!     │
//!     ├── RiskWatcher (alerts/)
//!     │     ├── PgRiskSource (persistence/)
//!     │     └── HttpAlertSender ── notification service
//!     │
//!     ├── EventBus ──► StatusBoard (domain/)
//!     │
//!     └── /health, /status (api/)
//! ```

pub mod alerts;
pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod replication;
pub mod scheduler;
