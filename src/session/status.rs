//! Operator-facing scan status.

use crate::signals::LiveSignals;
use std::fmt;

/// How much raw OCR text the status shows.
pub const TEXT_PREVIEW_CHARS: usize = 100;

/// Display state of one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalStatus {
    Seeking,
    /// Keyword validation is switched off for this organization.
    NotRequired,
    Matched,
    Found(String),
    Verified,
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Seeking => f.write_str("Seeking..."),
            SignalStatus::NotRequired => f.write_str("NOT REQUIRED"),
            SignalStatus::Matched => f.write_str("MATCHED"),
            SignalStatus::Found(roll_no) => write!(f, "FOUND ({roll_no})"),
            SignalStatus::Verified => f.write_str("VERIFIED"),
        }
    }
}

/// Snapshot of a session for the operator's debug panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStatus {
    pub state: &'static str,
    /// Start of the most recent OCR read.
    pub text_preview: String,
    pub keyword: SignalStatus,
    pub roll_no: SignalStatus,
    pub name: SignalStatus,
    pub roster_size: usize,
}

impl ScanStatus {
    pub(crate) fn new(
        state: &'static str,
        text: &str,
        live: &LiveSignals,
        keyword_check: bool,
        roster_size: usize,
    ) -> Self {
        let keyword = match (keyword_check, live.keyword) {
            (false, _) => SignalStatus::NotRequired,
            (true, true) => SignalStatus::Matched,
            (true, false) => SignalStatus::Seeking,
        };
        let roll_no = live
            .roll_no
            .clone()
            .map_or(SignalStatus::Seeking, SignalStatus::Found);
        let name = if live.name {
            SignalStatus::Verified
        } else {
            SignalStatus::Seeking
        };

        Self {
            state,
            text_preview: text.chars().take(TEXT_PREVIEW_CHARS).collect(),
            keyword,
            roll_no,
            name,
            roster_size,
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "State:   {}", self.state)?;
        writeln!(f, "Text:    {:?}", self.text_preview)?;
        writeln!(f, "Keyword: {}", self.keyword)?;
        writeln!(f, "Roll No: {}", self.roll_no)?;
        writeln!(f, "Name:    {}", self.name)?;
        write!(f, "Roster:  {} students", self.roster_size)
    }
}
