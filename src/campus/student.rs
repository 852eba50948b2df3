//! Students and roster import.

use super::{CampusError, OrgId, StudentId};
use serde::{Deserialize, Serialize};

/// Required mobile number length.
pub const MOBILE_NO_DIGITS: usize = 10;

/// A registered student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: StudentId,
    pub organization: OrgId,
    pub roll_no: String,
    pub name: String,
    pub mobile_no: Option<String>,
    pub hostel: Option<String>,
    pub room: Option<String>,
    pub email: String,
}

/// Fields for registering a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub roll_no: String,
    pub name: String,
    pub mobile_no: Option<String>,
    pub hostel: Option<String>,
    pub room: Option<String>,
    pub email: String,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl NewStudent {
    /// Trims fields and checks them.
    pub fn validate(self) -> Result<Self, CampusError> {
        let roll_no = self.roll_no.trim().to_string();
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let mobile_no = blank_to_none(self.mobile_no);

        if !is_digits(&roll_no) {
            return Err(CampusError::InvalidStudent(
                "roll number must contain only digits".into(),
            ));
        }
        if name.is_empty() {
            return Err(CampusError::InvalidStudent("name is required".into()));
        }
        if email.is_empty() {
            return Err(CampusError::InvalidStudent("email is required".into()));
        }
        if let Some(mobile) = &mobile_no {
            if mobile.len() != MOBILE_NO_DIGITS || !is_digits(mobile) {
                return Err(CampusError::InvalidStudent(format!(
                    "mobile number must be exactly {MOBILE_NO_DIGITS} digits"
                )));
            }
        }

        Ok(Self {
            roll_no,
            name,
            mobile_no,
            hostel: blank_to_none(self.hostel),
            room: blank_to_none(self.room),
            email,
        })
    }

    pub(crate) fn into_student(self, id: StudentId, organization: OrgId) -> Student {
        Student {
            id,
            organization,
            roll_no: self.roll_no,
            name: self.name,
            mobile_no: self.mobile_no,
            hostel: self.hostel,
            room: self.room,
            email: self.email,
        }
    }
}

/// One row of a roster import; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentRow {
    pub roll_no: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub hostel: Option<String>,
    pub room: Option<String>,
}

impl StudentRow {
    pub fn new(roll_no: &str, name: &str, email: &str) -> Self {
        Self {
            roll_no: Some(roll_no.into()),
            name: Some(name.into()),
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

/// Why one import row was not added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    /// Spreadsheet-style row number (header is row 1).
    pub row: usize,
    pub name: String,
    pub error: String,
}

/// Outcome of a roster import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewStudent {
        NewStudent {
            roll_no: " 12345 ".into(),
            name: "Sahil Kumar".into(),
            mobile_no: Some("9876543210".into()),
            hostel: Some("".into()),
            room: Some("B-12".into()),
            email: "sahil@example.com".into(),
        }
    }

    #[test]
    fn test_valid_student_trimmed() {
        let student = valid().validate().unwrap();
        assert_eq!(student.roll_no, "12345");
        assert_eq!(student.hostel, None);
        assert_eq!(student.room.as_deref(), Some("B-12"));
    }

    #[test]
    fn test_non_digit_roll_rejected() {
        let mut student = valid();
        student.roll_no = "12A45".into();
        assert!(matches!(student.validate(), Err(CampusError::InvalidStudent(_))));
    }

    #[test]
    fn test_mobile_must_be_ten_digits() {
        for bad in ["98765", "98765432101", "98765abcde"] {
            let mut student = valid();
            student.mobile_no = Some(bad.into());
            assert!(student.validate().is_err(), "{bad}");
        }

        let mut student = valid();
        student.mobile_no = None;
        assert!(student.validate().is_ok());
    }

    #[test]
    fn test_missing_email_rejected() {
        let mut student = valid();
        student.email = "  ".into();
        assert!(student.validate().is_err());
    }
}
