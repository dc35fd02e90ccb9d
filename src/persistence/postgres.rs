//! PostgreSQL readers for the change counter and patient risk rows.
//!
//! Connections are opened per tick and closed when the tick is done; no
//! pool is kept between ticks.

use std::time::Duration;

use sqlx::{Connection, PgConnection};

use crate::alerts::RiskSource;
use crate::config::DbParams;
use crate::domain::PatientRisk;
use crate::error::SentinelError;
use crate::replication::ChangeSource;

/// Inserted + updated + deleted tuples across all user tables.
pub const TOTAL_CHANGES_SQL: &str = "SELECT COALESCE(SUM(n_tup_ins + n_tup_upd + n_tup_del), 0)::BIGINT \
     FROM pg_stat_user_tables";

/// Every patient with its current risk score.
pub const PATIENT_RISKS_SQL: &str =
    r#"SELECT id::text, name, "riskScore"::float8 FROM patients"#;

/// The doctor who receives alerts.
pub const DOCTOR_EMAIL_SQL: &str = "SELECT email FROM users LIMIT 1";

/// One row of [`PATIENT_RISKS_SQL`].
type PatientRow = (String, Option<String>, Option<f64>);

/// Maps a patient row; a `NULL` name becomes empty.
fn patient_from_row((id, name, risk_score): PatientRow) -> PatientRisk {
    PatientRisk {
        id,
        name: name.unwrap_or_default(),
        risk_score,
    }
}

/// Picks the alert recipient out of [`DOCTOR_EMAIL_SQL`]'s result.
///
/// The outer `Option` is "no row", the inner one a `NULL` column. Blank
/// addresses count as missing.
fn doctor_email_from_row(row: Option<Option<String>>) -> Option<String> {
    row.flatten()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
}

/// Opens a single connection within `timeout`.
///
/// # Errors
///
/// Returns [`SentinelError::ConnectTimeout`] when the deadline passes and
/// [`SentinelError::Database`] on any driver failure.
pub async fn connect(params: &DbParams, timeout: Duration) -> Result<PgConnection, SentinelError> {
    let options = params.connect_options();
    match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
        Ok(conn) => Ok(conn?),
        Err(_) => Err(SentinelError::ConnectTimeout {
            host: params.host.clone(),
            port: params.port,
        }),
    }
}

/// Closes a connection, logging instead of failing.
async fn close(conn: PgConnection, params: &DbParams) {
    if let Err(e) = conn.close().await {
        tracing::debug!(db = %params, error = %e, "error closing connection");
    }
}

/// Reads the aggregate change counter from the replication source.
#[derive(Debug, Clone)]
pub struct PgChangeSource {
    params: DbParams,
    connect_timeout: Duration,
}

impl PgChangeSource {
    /// Creates a reader for the given source database.
    #[must_use]
    pub fn new(params: DbParams, connect_timeout: Duration) -> Self {
        Self {
            params,
            connect_timeout,
        }
    }
}

impl ChangeSource for PgChangeSource {
    async fn total_changes(&self) -> Result<i64, SentinelError> {
        let mut conn = connect(&self.params, self.connect_timeout).await?;
        let total = sqlx::query_scalar::<_, i64>(TOTAL_CHANGES_SQL)
            .fetch_one(&mut conn)
            .await;
        close(conn, &self.params).await;
        Ok(total?)
    }
}

/// Reads patient risk scores and the alert recipient from two databases.
#[derive(Debug, Clone)]
pub struct PgRiskSource {
    patient_db: DbParams,
    user_db: DbParams,
    connect_timeout: Duration,
}

impl PgRiskSource {
    /// Creates a reader over the patients and users databases.
    #[must_use]
    pub fn new(patient_db: DbParams, user_db: DbParams, connect_timeout: Duration) -> Self {
        Self {
            patient_db,
            user_db,
            connect_timeout,
        }
    }
}

impl RiskSource for PgRiskSource {
    async fn patient_risks(&self) -> Result<Vec<PatientRisk>, SentinelError> {
        let mut conn = connect(&self.patient_db, self.connect_timeout).await?;
        let rows = sqlx::query_as::<_, PatientRow>(PATIENT_RISKS_SQL)
            .fetch_all(&mut conn)
            .await;
        close(conn, &self.patient_db).await;

        Ok(rows?.into_iter().map(patient_from_row).collect())
    }

    async fn doctor_email(&self) -> Result<Option<String>, SentinelError> {
        let mut conn = connect(&self.user_db, self.connect_timeout).await?;
        let email = sqlx::query_scalar::<_, Option<String>>(DOCTOR_EMAIL_SQL)
            .fetch_optional(&mut conn)
            .await;
        close(conn, &self.user_db).await;

        Ok(doctor_email_from_row(email?))
    }
}
