//! Prometheus metrics for the scan loop.
//!
//! # Metrics Exposed
//!
//! ## Session
//! - `campus_gate_scanning` - 1 while a session is scanning
//! - `campus_gate_live_signals` - Signals currently live (0-3)
//! - `campus_gate_keyword_live`, `campus_gate_roll_no_live`, `campus_gate_name_live`
//!
//! ## Sampling
//! - `campus_gate_sessions_total` - Sessions started
//! - `campus_gate_ticks_total` - Ticks that took a frame
//! - `campus_gate_ticks_dropped_total` - Ticks dropped while a sample was in flight
//! - `campus_gate_sample_failures_total` - Samples that produced no text
//! - `campus_gate_results_discarded_total` - Late results ignored after stop or reset
//!
//! ## Attendance
//! - `campus_gate_scans_accepted_total` - Scans accepted by the decision rule
//! - `campus_gate_attendance_out_total` - Departures recorded
//! - `campus_gate_attendance_in_total` - Returns recorded
//! - `campus_gate_attendance_failures_total` - Accepted scans the attendance book rejected
//!
//! # Example
//!
//! ```no_run
//! use campus_gate::metrics::{MetricsRegistry, MetricsSnapshot};
//! use campus_gate::session::ScanSession;
//! use campus_gate::clock::Timestamp;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let session = ScanSession::default();
//!
//! registry.update(&MetricsSnapshot::from_session(&session, Timestamp::ZERO));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
