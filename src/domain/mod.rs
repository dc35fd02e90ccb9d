//! Domain layer: change detection, alert payloads, and the event system.
//!
//! This module contains the watcher-independent model: the change tracker
//! behind replication triggering, patient risk rows and the alert payload,
//! run identifiers, and the event bus plus the status board it feeds.

pub mod change_tracker;
pub mod event_bus;
pub mod patient_risk;
pub mod run_id;
pub mod status_board;
pub mod watch_event;

pub use change_tracker::{ChangeTracker, ChangeVerdict};
pub use event_bus::EventBus;
pub use patient_risk::{AlertPayload, PatientRisk};
pub use run_id::RunId;
pub use status_board::{StatusBoard, StatusSnapshot};
pub use watch_event::WatchEvent;
