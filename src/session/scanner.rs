//! The sampling loop.

use super::{
    machine::{ScanSession, TickOutcome},
    sampler::FrameSampler,
    AttendanceRecorder, CancelToken,
};
use crate::capture::VideoSource;
use crate::clock::Clock;
use crate::ocr::TextExtractor;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Summary of one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanRun {
    /// Ticks that fired, including skipped ones.
    pub ticks: u64,
    /// The cancel token ended the run.
    pub cancelled: bool,
}

/// Drives a [`ScanSession`] on a fixed interval.
///
/// At most one sample is outstanding at a time. Ticks that fall due while
/// a sample is in flight are dropped and counted, never queued.
#[derive(Debug)]
pub struct Scanner<S, X, C> {
    sampler: FrameSampler<S, X>,
    clock: C,
    interval: Duration,
    cancel: CancelToken,
}

impl<S, X, C> Scanner<S, X, C>
where
    S: VideoSource,
    X: TextExtractor,
    C: Clock,
{
    pub fn new(sampler: FrameSampler<S, X>, clock: C, interval: Duration, cancel: CancelToken) -> Self {
        Self {
            sampler,
            clock,
            interval,
            cancel,
        }
    }

    pub fn sampler(&self) -> &FrameSampler<S, X> {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut FrameSampler<S, X> {
        &mut self.sampler
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs a single tick, including the attendance hand-off on accept.
    pub fn tick<R: AttendanceRecorder>(
        &mut self,
        session: &mut ScanSession,
        recorder: &mut R,
    ) -> TickOutcome {
        if self.cancel.is_cancelled() {
            session.stop();
            return TickOutcome::Skipped;
        }
        if !self.sampler.is_ready() {
            trace!("Video source not ready, skipping tick");
            return TickOutcome::Skipped;
        }
        let Some(ticket) = session.begin_tick(self.clock.now()) else {
            return TickOutcome::Skipped;
        };

        let result = self.sampler.sample();

        // Stopped while the sample was outstanding.
        if self.cancel.is_cancelled() {
            session.stop();
        }
        let outcome = session.complete_tick(ticket, result, self.clock.now());

        if let TickOutcome::Accepted(verification) = &outcome {
            if self.cancel.is_cancelled() {
                session.stop();
            } else {
                // Once the book has been written, the operator sees the result.
                let recorded = recorder.record(verification.roll_no());
                session.finish_verification(verification.clone(), recorded);
            }
        }
        outcome
    }

    /// Ticks until the session leaves `SCANNING`, the cancel token fires,
    /// or `max_ticks` ticks have run.
    pub fn run<R: AttendanceRecorder>(
        &mut self,
        session: &mut ScanSession,
        recorder: &mut R,
        max_ticks: Option<u64>,
    ) -> ScanRun {
        self.run_with(session, recorder, max_ticks, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_tick` after every tick.
    pub fn run_with<R, F>(
        &mut self,
        session: &mut ScanSession,
        recorder: &mut R,
        max_ticks: Option<u64>,
        mut on_tick: F,
    ) -> ScanRun
    where
        R: AttendanceRecorder,
        F: FnMut(&ScanSession, &TickOutcome),
    {
        let mut run = ScanRun::default();
        let mut next_tick = Instant::now();

        while session.is_scanning() {
            if self.cancel.is_cancelled() {
                session.stop();
                break;
            }
            if max_ticks.is_some_and(|max| run.ticks >= max) {
                debug!(ticks = run.ticks, "Tick limit reached");
                break;
            }

            let outcome = self.tick(session, recorder);
            run.ticks += 1;
            on_tick(session, &outcome);

            if self.interval.is_zero() {
                continue;
            }
            next_tick += self.interval;
            let now = Instant::now();
            if now < next_tick {
                std::thread::sleep(next_tick - now);
            } else {
                let interval_ms = self.interval.as_millis().max(1);
                let missed = ((now - next_tick).as_millis() / interval_ms) as u64 + 1;
                session.note_dropped(missed);
                next_tick += self.interval * missed as u32;
                if let Some(wait) = next_tick.checked_duration_since(now) {
                    std::thread::sleep(wait);
                }
            }
        }

        run.cancelled = self.cancel.is_cancelled();
        info!(
            ticks = run.ticks,
            cancelled = run.cancelled,
            state = %session.state(),
            "Scan run finished"
        );
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campus::{
        AttendanceDesk, CampusError, CampusStore, EntryStatus, NewStudent, OrgId, ScanReceipt, UserId,
    };
    use crate::capture::{CaptureConfig, MockVideoSource};
    use crate::clock::ManualClock;
    use crate::ocr::{OcrError, OcrText, ScriptedExtractor};
    use crate::preprocess::{EncodedImage, Preprocessor};
    use crate::session::SessionState;
    use crate::signals::{RosterEntry, ScanProfile};

    fn source() -> MockVideoSource {
        let mut source = MockVideoSource::new();
        source.open(&CaptureConfig::with_dimensions(16, 8)).unwrap();
        source
    }

    fn scanner<X: TextExtractor>(
        extractor: X,
        clock: &ManualClock,
        cancel: CancelToken,
    ) -> Scanner<MockVideoSource, X, &ManualClock> {
        let sampler = FrameSampler::new(source(), extractor, Preprocessor::default());
        Scanner::new(sampler, clock, Duration::ZERO, cancel)
    }

    fn campus() -> (CampusStore, OrgId) {
        let owner = UserId(1);
        let mut store = CampusStore::new();
        let org = store.create_organization("Gate", "code", owner).unwrap();
        let keywords = ["College", "Valid", "Student", "Identity", "Card", "Campus"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        store.configure_organization(org, owner, keywords, 5).unwrap();
        store
            .add_student(
                org,
                Some(owner),
                NewStudent {
                    roll_no: "12345".into(),
                    name: "Sahil Kumar".into(),
                    email: "s@example.com".into(),
                    ..NewStudent::default()
                },
            )
            .unwrap();
        (store, org)
    }

    #[test]
    fn test_run_records_attendance() {
        let (mut store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let ocr = ScriptedExtractor::from_lines(["", "COLLEGE ID 12345", "Sahil Kumar card valid"]);
        let mut scanner = scanner(ocr, &clock, CancelToken::new());
        let mut desk = AttendanceDesk::new(&mut store, org).unwrap();

        let run = scanner.run(&mut session, &mut desk, Some(10));
        assert_eq!(run.ticks, 3);
        assert!(!run.cancelled);
        match session.state() {
            SessionState::Succeeded(receipt) => {
                assert_eq!(receipt.kind, EntryStatus::Out);
                assert_eq!(receipt.message, "Goodbye, Sahil Kumar!");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_run_stops_at_tick_limit() {
        let (store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let mut scanner = scanner(ScriptedExtractor::new(), &clock, CancelToken::new());
        let run = scanner.run(&mut session, &mut Rejecting, Some(4));
        assert_eq!(run.ticks, 4);
        assert!(session.is_scanning());
        assert_eq!(scanner.sampler().extractor().calls(), 4);
    }

    #[test]
    fn test_roster_race_surfaces_as_error() {
        // Roster snapshot knows the student; the attendance book does not.
        let mut store = CampusStore::new();
        let org = store.create_organization("Gate", "code", UserId(1)).unwrap();
        let roster = [RosterEntry::new("12345", "Sahil Kumar")].into_iter().collect();
        let mut session = ScanSession::default();
        session.start(ScanProfile::new(Vec::<String>::new(), 5, roster)).unwrap();

        let clock = ManualClock::new();
        let ocr = ScriptedExtractor::from_lines(["12345 Sahil"]);
        let mut scanner = scanner(ocr, &clock, CancelToken::new());
        let mut desk = AttendanceDesk::new(&mut store, org).unwrap();

        scanner.tick(&mut session, &mut desk);
        assert_eq!(
            session.state(),
            &SessionState::Failed("Student not found in this organization".into())
        );
    }

    #[test]
    fn test_not_ready_source_skips_tick() {
        let (store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let mut scanner = scanner(ScriptedExtractor::from_lines(["x"]), &clock, CancelToken::new());
        scanner.sampler_mut().source_mut().set_ready(false);

        let outcome = scanner.tick(&mut session, &mut Rejecting);
        assert_eq!(outcome, TickOutcome::Skipped);
        assert_eq!(scanner.sampler().extractor().calls(), 0);
        assert_eq!(session.stats().ticks_started, 0);
    }

    /// Cancels the scan while its read is outstanding.
    struct CancellingExtractor {
        cancel: CancelToken,
    }

    impl TextExtractor for CancellingExtractor {
        fn extract(&mut self, _image: &EncodedImage) -> Result<OcrText, OcrError> {
            self.cancel.cancel();
            Ok(OcrText::new("COLLEGE ID 12345 Sahil Kumar"))
        }
    }

    #[test]
    fn test_cancel_during_read_discards_result() {
        let (mut store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let cancel = CancelToken::new();
        let ocr = CancellingExtractor {
            cancel: cancel.clone(),
        };
        let mut scanner = scanner(ocr, &clock, cancel);
        let mut desk = AttendanceDesk::new(&mut store, org).unwrap();

        let run = scanner.run(&mut session, &mut desk, None);
        assert!(run.cancelled);
        assert_eq!(run.ticks, 1);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.stats().results_discarded, 1);
        assert_eq!(session.stats().scans_accepted, 0);
        assert!(store.entries(org, &Default::default()).unwrap().is_empty());
    }

    #[test]
    fn test_ocr_failures_do_not_stop_scanning() {
        let (mut store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let mut ocr = ScriptedExtractor::new();
        ocr.push_text("COLLEGE ID 12345")
            .push_failure("timeout")
            .push_failure("timeout")
            .push_text("Sahil Kumar");
        let mut scanner = scanner(ocr, &clock, CancelToken::new());
        let mut desk = AttendanceDesk::new(&mut store, org).unwrap();

        let mut seen = Vec::new();
        scanner.run_with(&mut session, &mut desk, Some(10), |_, outcome| {
            seen.push(matches!(outcome, TickOutcome::Accepted(_)));
            clock.advance(Duration::from_millis(200));
        });
        assert_eq!(seen, [false, false, false, true]);
        assert_eq!(session.stats().sample_failures, 2);
        assert_eq!(session.state().name(), "RESULT_SUCCESS");
    }

    #[test]
    fn test_slow_reads_let_signals_decay() {
        let (store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let ocr = ScriptedExtractor::from_lines(["COLLEGE ID 12345", "Sahil Kumar"]);
        let mut scanner = scanner(ocr, &clock, CancelToken::new());

        scanner.tick(&mut session, &mut Rejecting);
        clock.advance(Duration::from_millis(6000));
        let outcome = scanner.tick(&mut session, &mut Rejecting);
        assert!(matches!(outcome, TickOutcome::Pending(_)));
    }

    /// Attendance desk whose operator hits Ctrl-C while the entry is written.
    struct CancelWhileRecording<'a> {
        desk: AttendanceDesk<'a>,
        cancel: CancelToken,
    }

    impl AttendanceRecorder for CancelWhileRecording<'_> {
        type Error = CampusError;

        fn record(&mut self, roll_no: &str) -> Result<ScanReceipt, CampusError> {
            self.cancel.cancel();
            self.desk.record(roll_no)
        }
    }

    #[test]
    fn test_cancel_during_recording_keeps_receipt() {
        let (mut store, org) = campus();
        let mut session = ScanSession::default();
        session.start(store.scan_profile(org).unwrap()).unwrap();

        let clock = ManualClock::new();
        let cancel = CancelToken::new();
        let ocr = ScriptedExtractor::from_lines(["COLLEGE ID 12345 Sahil Kumar"]);
        let mut scanner = scanner(ocr, &clock, cancel.clone());
        let mut recorder = CancelWhileRecording {
            desk: AttendanceDesk::new(&mut store, org).unwrap(),
            cancel,
        };

        let run = scanner.run(&mut session, &mut recorder, None);
        assert!(run.cancelled);
        match session.state() {
            SessionState::Succeeded(receipt) => assert_eq!(receipt.kind, EntryStatus::Out),
            other => panic!("expected the recorded receipt, got {other:?}"),
        }
        assert_eq!(session.stats().results_discarded, 0);
        drop(recorder);
        assert_eq!(store.entries(org, &Default::default()).unwrap().len(), 1);
    }

    /// Attendance book that knows nobody.
    struct Rejecting;

    impl AttendanceRecorder for Rejecting {
        type Error = CampusError;

        fn record(&mut self, _roll_no: &str) -> Result<ScanReceipt, CampusError> {
            Err(CampusError::StudentNotFound)
        }
    }
}
