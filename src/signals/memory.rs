//! Temporal fusion of independently-arriving signals.
//!
//! A card is rarely fully legible in a single frame. Each signal is
//! remembered with the time it last fired and counts as live for a fixed
//! window, so partial reads from consecutive frames can combine into one
//! decision. The window also bounds how stale a contributing read may be.

use super::extractor::Observation;
use crate::clock::Timestamp;
use std::time::Duration;

/// Default recency window.
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_millis(5000);

/// Signals live at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSignals {
    pub keyword: bool,
    pub roll_no: Option<String>,
    pub name: bool,
}

impl LiveSignals {
    /// Number of live signals out of three.
    pub fn count(&self) -> usize {
        usize::from(self.keyword) + usize::from(self.roll_no.is_some()) + usize::from(self.name)
    }
}

/// Outcome of the decision rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// All three signals live; carries the roll number to record.
    Accept(String),
    /// Still missing at least one signal.
    Reject(LiveSignals),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept(_))
    }
}

/// Three timestamped slots plus the decision rule.
#[derive(Debug, Clone)]
pub struct SignalMemory {
    window_ms: u64,
    keyword_required: bool,
    keyword_at: Option<Timestamp>,
    roll_no: Option<(String, Timestamp)>,
    name_at: Option<Timestamp>,
}

impl SignalMemory {
    /// Creates empty memory.
    ///
    /// With `keyword_required == false` the keyword signal is treated as
    /// permanently live.
    pub fn new(window: Duration, keyword_required: bool) -> Self {
        Self {
            window_ms: window.as_millis() as u64,
            keyword_required,
            keyword_at: None,
            roll_no: None,
            name_at: None,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn keyword_required(&self) -> bool {
        self.keyword_required
    }

    #[inline]
    fn is_live(&self, observed_at: Option<Timestamp>, now: Timestamp) -> bool {
        observed_at.is_some_and(|t| now.saturating_since(t) < self.window_ms)
    }

    /// Records whatever fired. Slots that did not fire keep their old
    /// timestamp and decay on their own.
    pub fn record(&mut self, observation: &Observation, now: Timestamp) {
        if observation.keyword {
            self.keyword_at = Some(now);
        }
        if let Some(roll_no) = &observation.roll_no {
            self.roll_no = Some((roll_no.clone(), now));
        }
        if observation.name {
            self.name_at = Some(now);
        }
    }

    pub fn keyword_live(&self, now: Timestamp) -> bool {
        !self.keyword_required || self.is_live(self.keyword_at, now)
    }

    /// The remembered roll number, if still live.
    pub fn roll_no_live(&self, now: Timestamp) -> Option<&str> {
        self.roll_no
            .as_ref()
            .filter(|(_, at)| self.is_live(Some(*at), now))
            .map(|(roll, _)| roll.as_str())
    }

    pub fn name_live(&self, now: Timestamp) -> bool {
        self.is_live(self.name_at, now)
    }

    /// Snapshot of which signals are live.
    pub fn live(&self, now: Timestamp) -> LiveSignals {
        LiveSignals {
            keyword: self.keyword_live(now),
            roll_no: self.roll_no_live(now).map(str::to_owned),
            name: self.name_live(now),
        }
    }

    /// Accepts iff all three signals are live at `now`.
    pub fn decide(&self, now: Timestamp) -> Decision {
        let live = self.live(now);
        match live {
            LiveSignals {
                keyword: true,
                roll_no: Some(roll_no),
                name: true,
            } => Decision::Accept(roll_no),
            other => Decision::Reject(other),
        }
    }

    /// Forgets every observation.
    pub fn reset(&mut self) {
        self.keyword_at = None;
        self.roll_no = None;
        self.name_at = None;
    }
}

impl Default for SignalMemory {
    fn default() -> Self {
        Self::new(DEFAULT_RECENCY_WINDOW, true)
    }
}
