//! Campus Gate Library
//!
//! Entry/exit tracking for campuses, hostels and similar institutions.
//! Guards scan a student's ID card with a camera; the card is accepted
//! once three independent signals read from it agree, and the student is
//! then toggled between "Out" and "In".
//!
//! # Architecture
//!
//! ```text
//! capture → preprocess → ocr → signals → session → campus
//!                                           ↓
//!                                        metrics
//! ```
//!
//! # Design Principles
//!
//! - **Evidence accumulates, then decays**: a signal seen in one frame stays
//!   live for five seconds, so partial reads combine, but stale reads never do
//! - **One read in flight**: slow OCR drops frames instead of queueing them
//! - **Late results are ignored**: stopping a session discards whatever is
//!   still outstanding
//! - **Messages pass through**: the operator sees exactly what the
//!   attendance book said
//!
//! # Example
//!
//! ```no_run
//! use campus_gate::{
//!     campus::{AttendanceDesk, CampusStore, UserId},
//!     capture::{CaptureConfig, MockVideoSource, VideoSource},
//!     clock::MonotonicClock,
//!     ocr::ScriptedExtractor,
//!     preprocess::Preprocessor,
//!     session::{CancelToken, FrameSampler, ScanSession, Scanner},
//! };
//! use std::time::Duration;
//!
//! let owner = UserId(1);
//! let mut store = CampusStore::new();
//! let org = store.create_organization("North Hostel", "gate-code", owner).unwrap();
//!
//! let mut source = MockVideoSource::new();
//! source.open(&CaptureConfig::default()).unwrap();
//! let ocr = ScriptedExtractor::from_lines(["ID 12345", "Sahil Kumar"]);
//! let sampler = FrameSampler::new(source, ocr, Preprocessor::default());
//!
//! let mut session = ScanSession::default();
//! session.start(store.scan_profile(org).unwrap()).unwrap();
//!
//! let mut scanner = Scanner::new(
//!     sampler,
//!     MonotonicClock::new(),
//!     Duration::from_millis(200),
//!     CancelToken::new(),
//! );
//! let mut desk = AttendanceDesk::new(&mut store, org).unwrap();
//! scanner.run(&mut session, &mut desk, Some(50));
//!
//! if let Some(message) = session.state().message() {
//!     println!("{message}");
//! }
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod campus;
pub mod capture;
pub mod clock;
pub mod config;
pub mod metrics;
pub mod ocr;
pub mod preprocess;
pub mod session;
pub mod signals;

// Re-export commonly used types at crate root
pub use campus::{AttendanceDesk, CampusError, CampusStore, ScanReceipt};
pub use capture::{CaptureConfig, Frame, MockVideoSource, VideoSource};
pub use clock::{Clock, MonotonicClock, Timestamp};
pub use config::{ConfigError, FileConfig};
pub use ocr::{OcrText, TextExtractor};
pub use preprocess::Preprocessor;
pub use session::{AttendanceRecorder, CancelToken, ScanSession, Scanner, SessionState};
pub use signals::{ScanProfile, SignalMemory};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
