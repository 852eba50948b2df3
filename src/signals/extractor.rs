//! Turns one OCR read into the signals it supports.

use super::roster::{name_grams, Roster};
use regex::Regex;
use thiserror::Error;

/// Errors building a scan profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("roll number length must be positive")]
    InvalidRollNoLength,
    #[error("invalid roll number pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Per-organization inputs to signal extraction, frozen for a session.
#[derive(Debug, Clone)]
pub struct ScanProfile {
    keywords: Vec<String>,
    roll_no_length: usize,
    roster: Roster,
}

impl ScanProfile {
    /// Keywords are matched case-insensitively; blank entries are dropped.
    pub fn new<I, S>(keywords: I, roll_no_length: usize, roster: Roster) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keywords,
            roll_no_length,
            roster,
        }
    }

    /// Lowercased validation keywords.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// False when the organization opted out of keyword validation.
    pub fn keyword_check_enabled(&self) -> bool {
        !self.keywords.is_empty()
    }

    pub fn roll_no_length(&self) -> usize {
        self.roll_no_length
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
}

/// Signals that fired on one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// A configured keyword appeared.
    pub keyword: bool,
    /// A standalone digit run of the configured length that is on the roster.
    pub roll_no: Option<String>,
    /// A name window of the candidate student appeared.
    pub name: bool,
}

impl Observation {
    /// True if nothing fired.
    pub fn is_empty(&self) -> bool {
        !self.keyword && self.roll_no.is_none() && !self.name
    }
}

/// Extracts keyword, roll-number and name signals from OCR text.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    profile: ScanProfile,
    roll_pattern: Regex,
}

impl SignalExtractor {
    pub fn new(profile: ScanProfile) -> Result<Self, ProfileError> {
        if profile.roll_no_length == 0 {
            return Err(ProfileError::InvalidRollNoLength);
        }
        let roll_pattern = Regex::new(&format!(r"\b[0-9]{{{}}}\b", profile.roll_no_length))?;

        Ok(Self {
            profile,
            roll_pattern,
        })
    }

    pub fn profile(&self) -> &ScanProfile {
        &self.profile
    }

    /// Evaluates one read.
    ///
    /// `candidate` is the roll number currently held in signal memory. The
    /// name check runs against this read's roster match if there is one,
    /// otherwise against the candidate, and is skipped when neither exists.
    pub fn observe(&self, text: &str, candidate: Option<&str>) -> Observation {
        if text.trim().is_empty() {
            return Observation::default();
        }
        let lower = text.to_lowercase();

        let keyword = self
            .profile
            .keywords
            .iter()
            .any(|k| lower.contains(k.as_str()));

        // Unknown digit runs are skipped, not remembered.
        let roll_no = self
            .roll_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|run| self.profile.roster.contains(run))
            .map(str::to_owned);

        let name = roll_no
            .as_deref()
            .or(candidate)
            .and_then(|roll| self.profile.roster.name_of(roll))
            .map(|name| {
                name_grams(name)
                    .iter()
                    .any(|gram| lower.contains(gram.as_str()))
            })
            .unwrap_or(false);

        Observation {
            keyword,
            roll_no,
            name,
        }
    }
}
