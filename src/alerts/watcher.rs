//! Risk-score sweep and alert dispatch.

use chrono::Utc;
use serde::Serialize;

use super::{AlertSender, RiskSource};
use crate::domain::{AlertPayload, EventBus, RunId, WatchEvent};
use crate::error::SentinelError;
use crate::scheduler::PeriodicTask;

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Patients read.
    pub checked: usize,
    /// Patients at or above the threshold.
    pub over_threshold: usize,
    /// Alerts accepted by the endpoint.
    pub sent: usize,
    /// Alerts that failed.
    pub failed: usize,
}

/// Periodically sweeps patient risk scores and sends alerts.
#[derive(Debug)]
pub struct RiskWatcher<S, A> {
    source: S,
    sender: A,
    threshold: f64,
    event_bus: EventBus,
}

impl<S: RiskSource, A: AlertSender> RiskWatcher<S, A> {
    /// Creates a watcher alerting at or above `threshold`.
    #[must_use]
    pub fn new(source: S, sender: A, threshold: f64, event_bus: EventBus) -> Self {
        Self {
            source,
            sender,
            threshold,
            event_bus,
        }
    }

    /// Performs one sweep over all patients.
    ///
    /// A failed delivery for one patient is logged and the sweep moves on
    /// to the next one.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient or the patient rows cannot be
    /// read.
    pub async fn sweep(&self) -> Result<SweepSummary, SentinelError> {
        let run_id = RunId::new();
        let doctor_email = self.source.doctor_email().await?;
        let patients = self.source.patient_risks().await?;
        tracing::debug!(%run_id, patients = patients.len(), "checking risk scores");

        let mut summary = SweepSummary {
            checked: patients.len(),
            ..SweepSummary::default()
        };

        let flagged: Vec<_> = patients
            .iter()
            .filter_map(|p| p.score_at_or_above(self.threshold).map(|s| (p, s)))
            .collect();
        summary.over_threshold = flagged.len();

        match doctor_email.as_deref() {
            None if !flagged.is_empty() => {
                tracing::warn!(
                    %run_id,
                    over_threshold = flagged.len(),
                    "no doctor email on record, alerts not sent"
                );
            }
            None => {}
            Some(email) => {
                for (patient, score) in flagged {
                    let payload = AlertPayload::new(patient, score, email);
                    match self.sender.send(&payload).await {
                        Ok(body) => {
                            summary.sent += 1;
                            tracing::info!(
                                %run_id,
                                patient_id = %patient.id,
                                patient_name = %patient.name,
                                risk_score = score,
                                response = %body,
                                "risk alert sent"
                            );
                            self.event_bus.publish(WatchEvent::AlertSent {
                                run_id,
                                patient_id: patient.id.clone(),
                                risk_score: score,
                                timestamp: Utc::now(),
                            });
                        }
                        Err(e) => {
                            summary.failed += 1;
                            tracing::warn!(
                                %run_id,
                                patient_id = %patient.id,
                                code = e.error_code(),
                                error = %e,
                                "risk alert failed"
                            );
                            self.event_bus.publish(WatchEvent::AlertFailed {
                                run_id,
                                patient_id: patient.id.clone(),
                                error: e.to_string(),
                                timestamp: Utc::now(),
                            });
                        }
                    }
                }
            }
        }

        self.event_bus.publish(WatchEvent::SweepCompleted {
            run_id,
            checked: summary.checked,
            over_threshold: summary.over_threshold,
            sent: summary.sent,
            failed: summary.failed,
            timestamp: Utc::now(),
        });
        Ok(summary)
    }
}

impl<S, A> PeriodicTask for RiskWatcher<S, A>
where
    S: RiskSource,
    A: AlertSender,
{
    fn name(&self) -> &'static str {
        "risk-alerts"
    }

    async fn tick(&mut self) {
        match self.sweep().await {
            Ok(summary) if summary.over_threshold > 0 => {
                tracing::info!(?summary, "risk sweep finished");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(code = e.error_code(), error = %e, "risk sweep failed");
            }
        }
    }
}
