//! Attendance entries.

use super::{student::Student, EntryId, OrgId, StudentId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Destination recorded when none is given.
pub const DEFAULT_DESTINATION: &str = "Una market";

/// Default and maximum page size for entry listings.
pub const DEFAULT_ENTRY_LIMIT: usize = 100;

/// Whether the student is currently outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Out,
    In,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Out => f.write_str("Out"),
            EntryStatus::In => f.write_str("In"),
        }
    }
}

/// One leave/return cycle for a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub student: StudentId,
    pub organization: OrgId,
    pub status: EntryStatus,
    pub leaving_time: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub destination: String,
}

impl Entry {
    pub(crate) fn open(
        id: EntryId,
        student: StudentId,
        organization: OrgId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student,
            organization,
            status: EntryStatus::Out,
            leaving_time: now,
            arrival_time: None,
            destination: DEFAULT_DESTINATION.to_string(),
        }
    }

    /// Marks the student as returned.
    pub(crate) fn close(&mut self, now: DateTime<Utc>) {
        self.status = EntryStatus::In;
        self.arrival_time = Some(now);
    }

    pub fn is_open(&self) -> bool {
        self.status == EntryStatus::Out
    }
}

/// What a successful scan did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReceipt {
    /// `Out` for a new departure, `In` for a return.
    pub kind: EntryStatus,
    /// Operator-facing text.
    pub message: String,
    pub student: Student,
    pub entry: Entry,
}

impl ScanReceipt {
    pub(crate) fn new(kind: EntryStatus, student: Student, entry: Entry) -> Self {
        let message = match kind {
            EntryStatus::Out => format!("Goodbye, {}!", student.name),
            EntryStatus::In => format!("Welcome back, {}!", student.name),
        };
        Self {
            kind,
            message,
            student,
            entry,
        }
    }
}

/// Filters for entry listings.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    /// Only entries that left on this day. Takes precedence over the range.
    pub on: Option<NaiveDate>,
    /// Inclusive range start.
    pub from: Option<NaiveDate>,
    /// Inclusive range end.
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of the student's name or roll number.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl EntryQuery {
    pub fn on(day: NaiveDate) -> Self {
        Self {
            on: Some(day),
            ..Self::default()
        }
    }

    pub(crate) fn matches_day(&self, leaving: DateTime<Utc>) -> bool {
        let day = leaving.date_naive();
        if let Some(on) = self.on {
            return day == on;
        }
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }

    pub(crate) fn matches_student(&self, student: &Student) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                student.name.to_lowercase().contains(&needle)
                    || student.roll_no.to_lowercase().contains(&needle)
            }
        }
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit.filter(|&l| l > 0).unwrap_or(DEFAULT_ENTRY_LIMIT)
    }
}

/// An entry joined with its student.
#[derive(Debug, Clone, Copy)]
pub struct EntryRecord<'a> {
    pub entry: &'a Entry,
    pub student: &'a Student,
}
