//! Known-student roster for one organization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length of the name windows matched against OCR text.
pub const NAME_GRAM_LEN: usize = 4;

/// One `{rollNumber, name}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub roll_number: String,
    pub name: String,
}

impl RosterEntry {
    pub fn new(roll_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            name: name.into(),
        }
    }
}

/// Roll numbers a scan may trust, with the cardholder name for each.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    names: HashMap<String, String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, entry: RosterEntry) {
        self.names.insert(entry.roll_number, entry.name);
    }

    /// Returns the cardholder name for a roll number.
    pub fn name_of(&self, roll_no: &str) -> Option<&str> {
        self.names.get(roll_no).map(String::as_str)
    }

    pub fn contains(&self, roll_no: &str) -> bool {
        self.names.contains_key(roll_no)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<RosterEntry> for Roster {
    fn from_iter<I: IntoIterator<Item = RosterEntry>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for entry in iter {
            roster.insert(entry);
        }
        roster
    }
}

/// Every contiguous 4-character window of a name, lowercased with all
/// whitespace removed.
///
/// Names shorter than four characters yield no windows and can never be
/// verified.
pub fn name_grams(name: &str) -> Vec<String> {
    let cleaned: Vec<char> = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    cleaned
        .windows(NAME_GRAM_LEN)
        .map(|w| w.iter().collect())
        .collect()
}
