//! Persistence layer: PostgreSQL readers used by the watchers.
//!
//! Provides the `sqlx`-backed implementations of
//! [`crate::replication::ChangeSource`] and [`crate::alerts::RiskSource`].

pub mod postgres;

pub use postgres::{PgChangeSource, PgRiskSource};
