//! Multi-tenant campus records.
//!
//! Organizations own students; each accepted scan toggles a student
//! between "Out" and "In". Guards reach an organization through a portal
//! opened with its access code.

mod access;
mod desk;
mod entry;
mod organization;
mod portal;
mod store;
mod student;
mod token;

pub use access::{AccessCodeHash, HashAlgorithm};
pub use desk::AttendanceDesk;
pub use entry::{
    Entry, EntryQuery, EntryRecord, EntryStatus, ScanReceipt, DEFAULT_DESTINATION,
    DEFAULT_ENTRY_LIMIT,
};
pub use organization::{
    Membership, Organization, Role, DEFAULT_ROLL_NO_LENGTH, MIN_VALIDATION_KEYWORDS,
};
pub use portal::{portal_session_ttl, PortalSession};
pub use store::CampusStore;
pub use student::{ImportReport, ImportRowError, NewStudent, Student, StudentRow, MOBILE_NO_DIGITS};
pub use token::{PortalToken, TokenGenerator};

use serde::Serialize;
use thiserror::Error;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Organization identifier.
    OrgId,
    "org"
);
id_type!(
    /// Identifier of a signed-in user.
    UserId,
    "user"
);
id_type!(StudentId, "student");
id_type!(EntryId, "entry");

/// Errors from campus operations.
#[derive(Debug, Error)]
pub enum CampusError {
    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Student not found in this organization")]
    StudentNotFound,

    #[error("Student with roll number {0} already exists in this organization")]
    DuplicateRollNo(String),

    #[error("At least {required} validation keywords are required. You provided {provided}.")]
    TooFewKeywords { provided: usize, required: usize },

    #[error("Roll number length must be positive")]
    InvalidRollNoLength,

    #[error("Invalid organization: {0}")]
    InvalidOrganization(String),

    #[error("Invalid student: {0}")]
    InvalidStudent(String),

    #[error("Invalid access code")]
    InvalidAccessCode,

    #[error("Only the organization owner can do this")]
    NotOwner,

    #[error("Already exist as member")]
    AlreadyMember,

    #[error("Member not found in this organization")]
    MemberNotFound,

    #[error("Cannot remove yourself. Delete organization instead.")]
    CannotRemoveOwner,

    #[error("The {0:?} role cannot be granted")]
    InvalidRole(Role),

    #[error("Portal session not found")]
    PortalSessionNotFound,

    #[error("Portal session expired")]
    PortalSessionExpired,
}
