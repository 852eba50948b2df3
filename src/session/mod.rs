//! Scan sessions: the sampling loop and its state machine.
//!
//! ```text
//! IDLE → SCANNING → VERIFYING → RESULT_SUCCESS | RESULT_ERROR
//!          ↑                            │
//!          └────────── reset ───────────┘
//! ```
//!
//! A [`ScanSession`] owns all mutable scan state. The [`Scanner`] drives it
//! on a fixed interval, one OCR request in flight at a time, and hands an
//! accepted roll number to an [`AttendanceRecorder`].

mod machine;
mod sampler;
mod scanner;
mod status;

pub use machine::{ScanSession, SessionState, SessionStats, TickOutcome, TickTicket, Verification};
pub use sampler::{FrameSampler, SampleError};
pub use scanner::{ScanRun, Scanner};
pub use status::{ScanStatus, SignalStatus, TEXT_PREVIEW_CHARS};

use crate::campus::ScanReceipt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records an accepted scan against the attendance book.
pub trait AttendanceRecorder {
    /// Failure shown to the operator verbatim.
    type Error: std::fmt::Display;

    /// Opens or closes the student's entry.
    fn record(&mut self, roll_no: &str) -> Result<ScanReceipt, Self::Error>;
}

impl<R: AttendanceRecorder + ?Sized> AttendanceRecorder for &mut R {
    type Error = R::Error;

    fn record(&mut self, roll_no: &str) -> Result<ScanReceipt, Self::Error> {
        (**self).record(roll_no)
    }
}

/// Shared stop flag, checked before each tick and before applying results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
