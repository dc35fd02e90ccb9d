//! Sentinel configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Each watcher can be switched off with
//! its `*_ENABLED` flag, in which case its database keys are not required.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::SentinelError;

/// Default PostgreSQL port when `*_PORT` is not set.
pub const DEFAULT_PG_PORT: u16 = 5432;

/// Default notification endpoint of the email notification service.
pub const DEFAULT_NOTIFICATION_URL: &str =
    "http://localhost:5454/notifications/api/email/send-email";

/// Default alert threshold when `RISK_THRESHOLD` is unset or invalid.
pub const DEFAULT_RISK_THRESHOLD: f64 = 70.0;

/// Connection parameters for one PostgreSQL database.
///
/// The same parameters feed both the `sqlx` driver and the `pg_dump` /
/// `pg_restore` command lines.
#[derive(Clone, PartialEq, Eq)]
pub struct DbParams {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password. Never logged.
    pub password: String,
    /// Database name.
    pub dbname: String,
    /// Optional libpq `sslmode` (e.g. `require`).
    pub ssl_mode: Option<String>,
}

impl DbParams {
    /// Reads `{prefix}_HOST`, `{prefix}_PORT`, `{prefix}_USER`,
    /// `{prefix}_PASSWORD`, `{prefix}_NAME` and `{prefix}_SSLMODE`.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Config`] if a required key is missing or
    /// the port or ssl mode is malformed.
    pub fn from_lookup<F>(prefix: &str, lookup: &F) -> Result<Self, SentinelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{prefix}_{suffix}");

        let port = match lookup(&key("PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                SentinelError::Config(format!("{} = {raw:?}: {e}", key("PORT")))
            })?,
            None => DEFAULT_PG_PORT,
        };

        let ssl_mode = lookup(&key("SSLMODE")).filter(|s| !s.is_empty());
        if let Some(mode) = &ssl_mode {
            mode.parse::<PgSslMode>().map_err(|e| {
                SentinelError::Config(format!("{} = {mode:?}: {e}", key("SSLMODE")))
            })?;
        }

        Ok(Self {
            host: require(lookup, &key("HOST"))?,
            port,
            user: require(lookup, &key("USER"))?,
            password: lookup(&key("PASSWORD")).unwrap_or_default(),
            dbname: require(lookup, &key("NAME"))?,
            ssl_mode,
        })
    }

    /// Builds `sqlx` connect options for these parameters.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname);

        match self.ssl_mode.as_deref().and_then(|m| m.parse::<PgSslMode>().ok()) {
            Some(mode) => options.ssl_mode(mode),
            None => options,
        }
    }
}

impl fmt::Debug for DbParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl fmt::Display for DbParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

/// Settings for the change-triggered dump/restore watcher.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// Time between change-counter polls.
    pub interval: Duration,
    /// Database whose changes are watched and dumped.
    pub source: DbParams,
    /// Database the dump is restored into.
    pub target: DbParams,
    /// Path of the custom-format dump file.
    pub dump_file: PathBuf,
    /// `pg_dump` executable.
    pub pg_dump_bin: String,
    /// `pg_restore` executable.
    pub pg_restore_bin: String,
}

/// Settings for the risk-score alert watcher.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Time between risk sweeps.
    pub interval: Duration,
    /// Database holding the `patients` table.
    pub patient_db: DbParams,
    /// Database holding the `users` table.
    pub user_db: DbParams,
    /// Notification endpoint receiving the alert payload.
    pub notification_url: reqwest::Url,
    /// Per-request timeout for the notification call.
    pub notification_timeout: Duration,
    /// Scores at or above this value trigger an alert.
    pub risk_threshold: f64,
}

/// Top-level sentinel configuration.
///
/// Loaded once at startup via [`SentinelConfig::from_env`].
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Socket address for the status HTTP server (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Whether to serve `/health` and `/status`.
    pub status_enabled: bool,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Timeout for opening each per-tick database connection.
    pub connect_timeout: Duration,

    /// Replication watcher settings; `None` when disabled.
    pub replication: Option<ReplicationConfig>,

    /// Alert watcher settings; `None` when disabled.
    pub alerts: Option<AlertConfig>,
}

impl SentinelConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Config`] when a required key of an enabled
    /// watcher is missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self, SentinelError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`SentinelConfig::from_env`].
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, SentinelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|e| SentinelError::Config(format!("LISTEN_ADDR = {raw_addr:?}: {e}")))?;

        let status_enabled = parse_env_bool(lookup, "STATUS_ENABLED", true);
        let event_bus_capacity = parse_env(lookup, "EVENT_BUS_CAPACITY", 1024_usize).max(1);
        let connect_timeout =
            Duration::from_secs(parse_env(lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5));

        let replication = if parse_env_bool(lookup, "REPLICATION_ENABLED", true) {
            Some(ReplicationConfig {
                interval: interval_secs(lookup, "REPLICATION_INTERVAL_SECS", 1),
                source: DbParams::from_lookup("SOURCE_DB", lookup)?,
                target: DbParams::from_lookup("TARGET_DB", lookup)?,
                dump_file: lookup("DUMP_FILE")
                    .map_or_else(|| PathBuf::from("db_dump.dump"), PathBuf::from),
                pg_dump_bin: lookup("PG_DUMP_BIN").unwrap_or_else(|| "pg_dump".to_string()),
                pg_restore_bin: lookup("PG_RESTORE_BIN")
                    .unwrap_or_else(|| "pg_restore".to_string()),
            })
        } else {
            None
        };

        let alerts = if parse_env_bool(lookup, "ALERTS_ENABLED", true) {
            let raw_url =
                lookup("NOTIFICATION_URL").unwrap_or_else(|| DEFAULT_NOTIFICATION_URL.to_string());
            let notification_url = reqwest::Url::parse(&raw_url).map_err(|e| {
                SentinelError::Config(format!("NOTIFICATION_URL = {raw_url:?}: {e}"))
            })?;

            Some(AlertConfig {
                interval: interval_secs(lookup, "ALERT_INTERVAL_SECS", 5),
                patient_db: DbParams::from_lookup("PATIENT_DB", lookup)?,
                user_db: DbParams::from_lookup("USER_DB", lookup)?,
                notification_url,
                notification_timeout: Duration::from_secs(parse_env(
                    lookup,
                    "NOTIFICATION_TIMEOUT_SECS",
                    5,
                )),
                risk_threshold: risk_threshold(lookup),
            })
        } else {
            None
        };

        Ok(Self {
            listen_addr,
            status_enabled,
            event_bus_capacity,
            connect_timeout,
            replication,
            alerts,
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String, SentinelError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SentinelError::Config(format!("{key} is required")))
}

/// Intervals are at least one second.
fn interval_secs<F>(lookup: &F, key: &str, default: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_secs(parse_env(lookup, key, default).max(1))
}

/// `NaN` and infinities parse as `f64` but are not usable thresholds.
fn risk_threshold<F>(lookup: &F) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    let threshold = parse_env(lookup, "RISK_THRESHOLD", DEFAULT_RISK_THRESHOLD);
    if threshold.is_finite() {
        threshold
    } else {
        tracing::warn!(threshold, "RISK_THRESHOLD is not finite, using default");
        DEFAULT_RISK_THRESHOLD
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_env<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a variable as a boolean. Accepts `"true"`, `"1"`, `"false"`,
/// `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
