//! Sentinel error types with stable numeric codes.
//!
//! [`SentinelError`] is the central error type. Watchers never propagate
//! it out of their polling loop; each tick logs the error (with its code)
//! and the loop carries on.

/// Crate-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category      |
/// |-----------|---------------|
/// | 1000–1999 | Configuration |
/// | 2000–2999 | Database      |
/// | 3000–3999 | External tool |
/// | 4000–4999 | Notification  |
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    /// A configuration key is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Query or connection failure reported by the database driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Opening a database connection did not finish in time.
    #[error("timed out connecting to {host}:{port}")]
    ConnectTimeout {
        /// Database host.
        host: String,
        /// Database port.
        port: u16,
    },

    /// An external tool could not be started at all.
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        /// Tool name (e.g. `pg_dump`).
        tool: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran but exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr}", exit_label(*code))]
    CommandFailed {
        /// Tool name (e.g. `pg_restore`).
        tool: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Transport-level failure talking to the notification endpoint.
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The notification endpoint answered with a non-200 status.
    #[error("notification rejected with status {status}: {body}")]
    NotificationRejected {
        /// HTTP status code.
        status: u16,
        /// Response body as text.
        body: String,
    },
}

impl SentinelError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Config(_) => 1001,
            Self::Database(_) => 2001,
            Self::ConnectTimeout { .. } => 2002,
            Self::Spawn { .. } => 3001,
            Self::CommandFailed { .. } => 3002,
            Self::Http(_) => 4001,
            Self::NotificationRejected { .. } => 4002,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}
