//! Risk alerts: sweep patient risk scores and notify above a threshold.
//!
//! [`RiskWatcher`] reads rows through a [`RiskSource`] and posts an
//! [`crate::domain::AlertPayload`] through an [`AlertSender`] for every
//! patient whose score reaches the threshold.

pub mod sender;
pub mod watcher;

use std::future::Future;

use crate::domain::{AlertPayload, PatientRisk};
use crate::error::SentinelError;

pub use sender::HttpAlertSender;
pub use watcher::{RiskWatcher, SweepSummary};

/// Source of patient risk rows and the alert recipient.
pub trait RiskSource: Send + Sync {
    /// Returns every patient with its current score.
    fn patient_risks(
        &self,
    ) -> impl Future<Output = Result<Vec<PatientRisk>, SentinelError>> + Send;

    /// Returns the address alerts are sent to, if one exists.
    fn doctor_email(&self) -> impl Future<Output = Result<Option<String>, SentinelError>> + Send;
}

/// Delivers one alert.
pub trait AlertSender: Send + Sync {
    /// Sends the payload and returns the receiver's response body.
    fn send(
        &self,
        payload: &AlertPayload,
    ) -> impl Future<Output = Result<String, SentinelError>> + Send;
}
