//! Patient risk rows and the alert payload built from them.

use serde::{Deserialize, Serialize};

/// One row of the `patients` table as seen by the risk watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRisk {
    /// Primary key rendered as text.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current risk score, `None` when not yet computed.
    pub risk_score: Option<f64>,
}

impl PatientRisk {
    /// Returns the score if it is at or above `threshold`.
    #[must_use]
    pub fn score_at_or_above(&self, threshold: f64) -> Option<f64> {
        self.risk_score.filter(|score| *score >= threshold)
    }
}

/// JSON body accepted by the email notification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Patient primary key.
    pub patient_id: String,
    /// Patient display name.
    pub patient_name: String,
    /// Risk score, rendered as a percentage by the receiver.
    pub sepsis_risk: f64,
    /// Recipient address.
    pub doctor_email: String,
}

impl AlertPayload {
    /// Builds the payload for `patient` with the given score and recipient.
    #[must_use]
    pub fn new(patient: &PatientRisk, score: f64, doctor_email: &str) -> Self {
        Self {
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            sepsis_risk: score,
            doctor_email: doctor_email.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(score: Option<f64>) -> PatientRisk {
        PatientRisk {
            id: "17".to_string(),
            name: "Asha Rao".to_string(),
            risk_score: score,
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(patient(Some(70.0)).score_at_or_above(70.0), Some(70.0));
        assert_eq!(patient(Some(69.9)).score_at_or_above(70.0), None);
        assert_eq!(patient(None).score_at_or_above(0.0), None);
        assert_eq!(patient(Some(f64::NAN)).score_at_or_above(70.0), None);
    }

    #[test]
    fn payload_uses_camel_case_field_names() {
        let payload = AlertPayload::new(&patient(Some(88.5)), 88.5, "dr@example.com");
        let json = serde_json::to_value(&payload).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "patientId": "17",
                "patientName": "Asha Rao",
                "sepsisRisk": 88.5,
                "doctorEmail": "dr@example.com",
            })
        );
    }
}
