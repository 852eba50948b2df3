//! Scan session state machine.
//!
//! The session is driven from outside: the caller starts a tick, obtains
//! OCR text however it likes, and hands the result back together with the
//! ticket it was given. Tickets carry the session generation, so a result
//! that arrives after `stop`, `reset` or a restart is recognised and
//! dropped without touching signal memory.

use super::{sampler::SampleError, status::ScanStatus};
use crate::campus::{EntryStatus, ScanReceipt};
use crate::clock::Timestamp;
use crate::ocr::OcrText;
use crate::signals::{
    Decision, LiveSignals, ProfileError, ScanProfile, SignalExtractor, SignalMemory,
    DEFAULT_RECENCY_WINDOW,
};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Where a scan session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not scanning.
    Idle,
    /// Sampling frames; the decision rule runs every tick.
    Scanning,
    /// Accepted; waiting on the attendance book. Sampling is paused.
    Verifying { roll_no: String },
    /// Attendance recorded.
    Succeeded(ScanReceipt),
    /// Attendance failed; carries the recorder's message.
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Scanning => "SCANNING",
            SessionState::Verifying { .. } => "VERIFYING",
            SessionState::Succeeded(_) => "RESULT_SUCCESS",
            SessionState::Failed(_) => "RESULT_ERROR",
        }
    }

    /// True for the two result states, which only `reset` leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Succeeded(_) | SessionState::Failed(_))
    }

    /// Operator-facing message for a result state.
    pub fn message(&self) -> Option<&str> {
        match self {
            SessionState::Succeeded(receipt) => Some(&receipt.message),
            SessionState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Issued by [`ScanSession::begin_tick`]; must be handed back with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct TickTicket {
    generation: u64,
}

/// An accepted roll number awaiting the attendance book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    roll_no: String,
    generation: u64,
}

impl Verification {
    pub fn roll_no(&self) -> &str {
        &self.roll_no
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No sample was taken.
    Skipped,
    /// The result belonged to a stopped or restarted session.
    Discarded,
    /// Still missing a signal.
    Pending(LiveSignals),
    /// All three signals agreed.
    Accepted(Verification),
}

/// Running totals across every session driven by one [`ScanSession`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub sessions_started: u64,
    pub ticks_started: u64,
    /// Ticks that fell due while a sample was in flight.
    pub ticks_dropped: u64,
    /// Samples that produced no text (capture, encode or OCR failure).
    pub sample_failures: u64,
    /// Late results thrown away after stop or reset.
    pub results_discarded: u64,
    pub scans_accepted: u64,
    pub attendance_out: u64,
    pub attendance_in: u64,
    pub attendance_failures: u64,
}

/// One operator's scanning station.
#[derive(Debug)]
pub struct ScanSession {
    window: Duration,
    state: SessionState,
    generation: u64,
    in_flight: bool,
    extractor: Option<SignalExtractor>,
    memory: SignalMemory,
    last_now: Timestamp,
    last_text: String,
    stats: SessionStats,
}

impl ScanSession {
    /// Creates an idle session with the given recency window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: SessionState::Idle,
            generation: 0,
            in_flight: false,
            extractor: None,
            memory: SignalMemory::new(window, true),
            last_now: Timestamp::ZERO,
            last_text: String::new(),
            stats: SessionStats::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[inline]
    pub fn is_scanning(&self) -> bool {
        self.state == SessionState::Scanning
    }

    #[inline]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// True while a tick's result is outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// The profile frozen at `start`, if a session is running.
    pub fn profile(&self) -> Option<&ScanProfile> {
        self.extractor.as_ref().map(SignalExtractor::profile)
    }

    /// Raw text of the most recent read.
    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Starts scanning with a fresh memory and the given profile.
    ///
    /// The profile is read once here; later roster or keyword changes do
    /// not reach this session until the next `start`.
    pub fn start(&mut self, profile: ScanProfile) -> Result<(), ProfileError> {
        let extractor = SignalExtractor::new(profile)?;
        let keyword_required = extractor.profile().keyword_check_enabled();

        self.generation += 1;
        self.in_flight = false;
        self.memory = SignalMemory::new(self.window, keyword_required);
        self.last_text.clear();
        self.state = SessionState::Scanning;
        self.stats.sessions_started += 1;

        info!(
            generation = self.generation,
            roster = extractor.profile().roster().len(),
            keyword_check = keyword_required,
            roll_no_length = extractor.profile().roll_no_length(),
            "Scan session started"
        );
        self.extractor = Some(extractor);
        Ok(())
    }

    /// Stops scanning. Outstanding results will be discarded.
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        self.generation += 1;
        self.in_flight = false;
        self.memory.reset();
        self.extractor = None;
        self.last_text.clear();
        self.state = SessionState::Idle;
        info!("Scan session stopped");
    }

    /// Operator retry: clears memory and resumes scanning.
    ///
    /// Has no effect on an idle session.
    pub fn reset(&mut self) {
        if self.extractor.is_none() {
            return;
        }
        self.generation += 1;
        self.in_flight = false;
        self.memory.reset();
        self.last_text.clear();
        self.state = SessionState::Scanning;
        info!(generation = self.generation, "Scan session reset");
    }

    fn advance_clock(&mut self, now: Timestamp) -> Timestamp {
        self.last_now = self.last_now.max(now);
        self.last_now
    }

    /// Claims the next tick, or `None` if not scanning or a sample is in flight.
    pub fn begin_tick(&mut self, now: Timestamp) -> Option<TickTicket> {
        if !self.is_scanning() {
            return None;
        }
        if self.in_flight {
            self.note_dropped(1);
            return None;
        }
        self.advance_clock(now);
        self.in_flight = true;
        self.stats.ticks_started += 1;
        Some(TickTicket {
            generation: self.generation,
        })
    }

    /// Counts ticks that fell due while a sample was outstanding.
    pub fn note_dropped(&mut self, ticks: u64) {
        if ticks > 0 {
            self.stats.ticks_dropped += ticks;
            trace!(ticks, "Dropped ticks while sample in flight");
        }
    }

    /// Applies a tick's result and runs the decision rule.
    ///
    /// `now` is read when the result arrives and is clamped so it never
    /// moves backwards.
    pub fn complete_tick(
        &mut self,
        ticket: TickTicket,
        result: Result<OcrText, SampleError>,
        now: Timestamp,
    ) -> TickOutcome {
        if ticket.generation != self.generation || !self.is_scanning() {
            self.stats.results_discarded += 1;
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarded stale sample result"
            );
            return TickOutcome::Discarded;
        }
        self.in_flight = false;
        let now = self.advance_clock(now);

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                self.stats.sample_failures += 1;
                debug!(error = %e, "Sample produced no text");
                return TickOutcome::Pending(self.memory.live(now));
            }
        };

        let Some(extractor) = &self.extractor else {
            return TickOutcome::Discarded;
        };
        let observation = extractor.observe(&text.text, self.memory.roll_no_live(now));
        self.memory.record(&observation, now);
        self.last_text = text.text;

        match self.memory.decide(now) {
            Decision::Accept(roll_no) => {
                self.memory.reset();
                self.stats.scans_accepted += 1;
                self.state = SessionState::Verifying {
                    roll_no: roll_no.clone(),
                };
                info!(roll_no = %roll_no, at = %now, "Scan accepted");
                TickOutcome::Accepted(Verification {
                    roll_no,
                    generation: self.generation,
                })
            }
            Decision::Reject(live) => {
                trace!(live = live.count(), "Scan pending");
                TickOutcome::Pending(live)
            }
        }
    }

    /// Applies the attendance book's answer.
    ///
    /// Returns false if the verification is stale and was ignored.
    pub fn finish_verification<E: std::fmt::Display>(
        &mut self,
        verification: Verification,
        result: Result<ScanReceipt, E>,
    ) -> bool {
        let current = matches!(
            &self.state,
            SessionState::Verifying { roll_no } if *roll_no == verification.roll_no
        );
        if verification.generation != self.generation || !current {
            self.stats.results_discarded += 1;
            debug!(roll_no = %verification.roll_no, "Discarded stale verification");
            return false;
        }

        self.state = match result {
            Ok(receipt) => {
                match receipt.kind {
                    EntryStatus::Out => self.stats.attendance_out += 1,
                    EntryStatus::In => self.stats.attendance_in += 1,
                }
                info!(
                    roll_no = %verification.roll_no,
                    kind = %receipt.kind,
                    message = %receipt.message,
                    "Attendance recorded"
                );
                SessionState::Succeeded(receipt)
            }
            Err(e) => {
                self.stats.attendance_failures += 1;
                let message = e.to_string();
                warn!(roll_no = %verification.roll_no, error = %message, "Attendance failed");
                SessionState::Failed(message)
            }
        };
        true
    }

    /// Signals live at `now`.
    pub fn live(&self, now: Timestamp) -> LiveSignals {
        self.memory.live(now.max(self.last_now))
    }

    /// Human-readable snapshot for the operator.
    pub fn status(&self, now: Timestamp) -> ScanStatus {
        let (keyword_check, roster_size) = self
            .profile()
            .map(|p| (p.keyword_check_enabled(), p.roster().len()))
            .unwrap_or((true, 0));
        ScanStatus::new(
            self.state.name(),
            &self.last_text,
            &self.live(now),
            keyword_check,
            roster_size,
        )
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new(DEFAULT_RECENCY_WINDOW)
    }
}
