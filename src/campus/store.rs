//! In-memory campus store.
//!
//! Holds organizations, members, students, entries and portal sessions,
//! and enforces the attendance invariant: a student has at most one open
//! ("Out") entry at a time.

use super::{
    access::{AccessCodeHash, HashAlgorithm},
    entry::{Entry, EntryQuery, EntryRecord, EntryStatus, ScanReceipt},
    organization::{Membership, Organization, Role},
    portal::PortalSession,
    student::{ImportReport, ImportRowError, NewStudent, Student, StudentRow},
    token::{PortalToken, TokenGenerator},
    CampusError, EntryId, OrgId, StudentId, UserId,
};
use crate::signals::{Roster, RosterEntry, ScanProfile};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Organizations, students and attendance for every tenant.
#[derive(Debug)]
pub struct CampusStore {
    organizations: HashMap<OrgId, Organization>,
    memberships: Vec<Membership>,
    students: HashMap<StudentId, Student>,
    roll_index: HashMap<(OrgId, String), StudentId>,
    entries: Vec<Entry>,
    /// Index into `entries` of each student's open entry.
    open_entries: HashMap<StudentId, usize>,
    portals: HashMap<PortalToken, PortalSession>,
    tokens: TokenGenerator,
    algorithm: HashAlgorithm,
    next_id: u64,
}

impl CampusStore {
    pub fn new() -> Self {
        Self::with_hash_algorithm(HashAlgorithm::default())
    }

    /// Creates a store that hashes access codes with `algorithm`.
    pub fn with_hash_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            organizations: HashMap::new(),
            memberships: Vec::new(),
            students: HashMap::new(),
            roll_index: HashMap::new(),
            entries: Vec::new(),
            open_entries: HashMap::new(),
            portals: HashMap::new(),
            tokens: TokenGenerator::from_os_entropy(),
            algorithm,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ---------------------------------------------------------------
    // Organizations
    // ---------------------------------------------------------------

    /// Creates an organization owned by `owner`.
    pub fn create_organization(
        &mut self,
        name: &str,
        access_code: &str,
        owner: UserId,
    ) -> Result<OrgId, CampusError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CampusError::InvalidOrganization("name is required".into()));
        }
        if access_code.is_empty() {
            return Err(CampusError::InvalidOrganization(
                "access code is required".into(),
            ));
        }

        let id = OrgId(self.next_id());
        let hash = AccessCodeHash::new(access_code, self.algorithm)
            .map_err(|e| CampusError::InvalidOrganization(e.to_string()))?;
        self.organizations
            .insert(id, Organization::new(id, name.to_string(), hash, owner));
        self.memberships.push(Membership {
            user: owner,
            organization: id,
            role: Role::Owner,
        });

        info!(org = %id, owner = %owner, name, "Organization created");
        Ok(id)
    }

    pub fn organization(&self, id: OrgId) -> Result<&Organization, CampusError> {
        self.organizations
            .get(&id)
            .ok_or(CampusError::OrganizationNotFound)
    }

    fn ensure_owner(&self, org: OrgId, actor: Option<UserId>) -> Result<(), CampusError> {
        let owner = self.organization(org)?.owner;
        if actor != Some(owner) {
            return Err(CampusError::NotOwner);
        }
        Ok(())
    }

    /// Updates ID-card validation settings. Owner only.
    pub fn configure_organization(
        &mut self,
        org: OrgId,
        actor: UserId,
        keywords: Vec<String>,
        roll_no_length: usize,
    ) -> Result<&Organization, CampusError> {
        self.ensure_owner(org, Some(actor))?;
        let organization = self
            .organizations
            .get_mut(&org)
            .ok_or(CampusError::OrganizationNotFound)?;
        organization.configure(keywords, roll_no_length)?;

        info!(
            org = %org,
            keywords = organization.validation_keywords().len(),
            roll_no_length,
            "Organization configured"
        );
        Ok(&*organization)
    }

    /// Changes the roll-number length without touching keywords. Owner only.
    pub fn set_roll_no_length(
        &mut self,
        org: OrgId,
        actor: UserId,
        roll_no_length: usize,
    ) -> Result<&Organization, CampusError> {
        self.ensure_owner(org, Some(actor))?;
        let organization = self
            .organizations
            .get_mut(&org)
            .ok_or(CampusError::OrganizationNotFound)?;
        organization.set_roll_no_length(roll_no_length)?;

        info!(org = %org, roll_no_length, "Roll number length updated");
        Ok(&*organization)
    }

    /// Organizations a user owns or has joined, with their role.
    pub fn organizations_for(&self, user: UserId) -> Vec<(&Organization, Role)> {
        let mut out: Vec<(&Organization, Role)> = Vec::new();
        for membership in self.memberships.iter().filter(|m| m.user == user) {
            let Some(org) = self.organizations.get(&membership.organization) else {
                continue;
            };
            if out.iter().any(|(o, _)| o.id == org.id) {
                continue;
            }
            let role = if org.owner == user {
                Role::Owner
            } else {
                membership.role
            };
            out.push((org, role));
        }
        out.sort_by_key(|(o, _)| o.id);
        out
    }

    /// Members of an organization.
    pub fn members(&self, org: OrgId) -> Result<Vec<&Membership>, CampusError> {
        self.organization(org)?;
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.organization == org)
            .collect())
    }

    /// Adds `user` to the organization with `role`. Owner only.
    ///
    /// Re-adding the owner restores a lost owner membership.
    pub fn add_member(
        &mut self,
        org: OrgId,
        actor: UserId,
        user: UserId,
        role: Role,
    ) -> Result<&Membership, CampusError> {
        self.ensure_owner(org, Some(actor))?;
        let is_owner = user == actor;
        if role == Role::Owner && !is_owner {
            return Err(CampusError::InvalidRole(role));
        }
        let role = if is_owner { Role::Owner } else { role };

        let index = match self
            .memberships
            .iter()
            .position(|m| m.organization == org && m.user == user)
        {
            Some(i) if is_owner && self.memberships[i].role != Role::Owner => {
                self.memberships[i].role = Role::Owner;
                info!(org = %org, user = %user, "Owner role restored");
                i
            }
            Some(_) => return Err(CampusError::AlreadyMember),
            None => {
                self.memberships.push(Membership {
                    user,
                    organization: org,
                    role,
                });
                info!(org = %org, user = %user, ?role, "Member added");
                self.memberships.len() - 1
            }
        };
        Ok(&self.memberships[index])
    }

    /// Removes a member. Owner only; the owner cannot remove themselves.
    pub fn remove_member(
        &mut self,
        org: OrgId,
        actor: UserId,
        user: UserId,
    ) -> Result<Membership, CampusError> {
        self.ensure_owner(org, Some(actor))?;
        if user == actor {
            return Err(CampusError::CannotRemoveOwner);
        }
        let index = self
            .memberships
            .iter()
            .position(|m| m.organization == org && m.user == user)
            .ok_or(CampusError::MemberNotFound)?;

        info!(org = %org, user = %user, "Member removed");
        Ok(self.memberships.remove(index))
    }

    // ---------------------------------------------------------------
    // Portal sessions
    // ---------------------------------------------------------------

    /// Opens a portal with the organization's access code.
    ///
    /// A signed-in user who is not yet a member joins as staff.
    pub fn open_portal(
        &mut self,
        org: OrgId,
        access_code: &str,
        user: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<PortalSession, CampusError> {
        if !self.organization(org)?.access_code.verify(access_code) {
            warn!(org = %org, "Rejected portal access code");
            return Err(CampusError::InvalidAccessCode);
        }

        if let Some(user) = user {
            let already_member = self
                .memberships
                .iter()
                .any(|m| m.organization == org && m.user == user);
            if !already_member {
                self.memberships.push(Membership {
                    user,
                    organization: org,
                    role: Role::Staff,
                });
                info!(org = %org, user = %user, "Member joined");
            }
        }

        let token = self.tokens.next_token();
        let session = PortalSession::open(token.clone(), org, user, now);
        self.portals.insert(token, session.clone());
        info!(org = %org, expires_at = %session.expires_at, "Portal opened");
        Ok(session)
    }

    /// Looks up a live portal session.
    pub fn resolve_portal(
        &self,
        token: &PortalToken,
        now: DateTime<Utc>,
    ) -> Result<&PortalSession, CampusError> {
        let session = self
            .portals
            .get(token)
            .ok_or(CampusError::PortalSessionNotFound)?;
        if session.is_expired(now) {
            return Err(CampusError::PortalSessionExpired);
        }
        Ok(session)
    }

    /// Drops expired portal sessions, returning how many were removed.
    pub fn purge_expired_portals(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.portals.len();
        self.portals.retain(|_, s| !s.is_expired(now));
        before - self.portals.len()
    }

    // ---------------------------------------------------------------
    // Students
    // ---------------------------------------------------------------

    /// Registers a student. Owner only.
    pub fn add_student(
        &mut self,
        org: OrgId,
        actor: Option<UserId>,
        student: NewStudent,
    ) -> Result<StudentId, CampusError> {
        self.ensure_owner(org, actor)?;
        self.insert_student(org, student)
    }

    fn insert_student(&mut self, org: OrgId, student: NewStudent) -> Result<StudentId, CampusError> {
        let student = student.validate()?;
        let key = (org, student.roll_no.clone());
        if self.roll_index.contains_key(&key) {
            return Err(CampusError::DuplicateRollNo(student.roll_no));
        }

        let id = StudentId(self.next_id());
        self.roll_index.insert(key, id);
        self.students.insert(id, student.into_student(id, org));
        Ok(id)
    }

    /// Imports parsed roster rows. Owner only.
    ///
    /// Rows missing a name or roll number fail; roll numbers already on
    /// file or repeated within the batch are skipped.
    pub fn import_students(
        &mut self,
        org: OrgId,
        actor: Option<UserId>,
        rows: &[StudentRow],
    ) -> Result<ImportReport, CampusError> {
        self.ensure_owner(org, actor)?;

        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let mut report = ImportReport::default();
        let mut batch = HashSet::new();

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 2;
            let (name, roll_no) = match (present(&row.name), present(&row.roll_no)) {
                (Some(name), Some(roll_no)) => (name, roll_no),
                (name, _) => {
                    report.failed += 1;
                    report.errors.push(ImportRowError {
                        row: row_no,
                        name: name.unwrap_or("Unknown").to_string(),
                        error: "Missing Name or Roll No".into(),
                    });
                    continue;
                }
            };

            if self.roll_index.contains_key(&(org, roll_no.to_string()))
                || !batch.insert(roll_no.to_string())
            {
                report.skipped += 1;
                continue;
            }

            let student = NewStudent {
                roll_no: roll_no.to_string(),
                name: name.to_string(),
                mobile_no: row.mobile_no.clone(),
                hostel: row.hostel.clone(),
                room: row.room.clone(),
                email: row.email.clone().unwrap_or_default(),
            };
            match self.insert_student(org, student) {
                Ok(_) => report.added += 1,
                Err(e) => {
                    report.failed += 1;
                    report.errors.push(ImportRowError {
                        row: row_no,
                        name: name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            org = %org,
            added = report.added,
            skipped = report.skipped,
            failed = report.failed,
            "Roster import complete"
        );
        Ok(report)
    }

    /// Removes a student. Owner only.
    pub fn remove_student(
        &mut self,
        org: OrgId,
        actor: Option<UserId>,
        roll_no: &str,
    ) -> Result<Student, CampusError> {
        self.ensure_owner(org, actor)?;
        let id = self
            .roll_index
            .remove(&(org, roll_no.trim().to_string()))
            .ok_or(CampusError::StudentNotFound)?;
        self.open_entries.remove(&id);
        self.students.remove(&id).ok_or(CampusError::StudentNotFound)
    }

    /// Replaces a student's details. Owner only.
    ///
    /// A new roll number must not belong to another student of the same
    /// organization. The student keeps their id, so an open entry follows
    /// them across a roll-number change.
    pub fn update_student(
        &mut self,
        org: OrgId,
        actor: Option<UserId>,
        roll_no: &str,
        update: NewStudent,
    ) -> Result<&Student, CampusError> {
        self.ensure_owner(org, actor)?;
        let old_key = (org, roll_no.trim().to_string());
        let id = *self
            .roll_index
            .get(&old_key)
            .ok_or(CampusError::StudentNotFound)?;

        let update = update.validate()?;
        let new_key = (org, update.roll_no.clone());
        if new_key != old_key {
            if self.roll_index.contains_key(&new_key) {
                return Err(CampusError::DuplicateRollNo(update.roll_no));
            }
            self.roll_index.remove(&old_key);
            self.roll_index.insert(new_key, id);
        }

        let student = update.into_student(id, org);
        info!(org = %org, roll_no = %student.roll_no, "Student updated");
        self.students.insert(id, student);
        self.students.get(&id).ok_or(CampusError::StudentNotFound)
    }

    pub fn student_by_roll(&self, org: OrgId, roll_no: &str) -> Option<&Student> {
        self.roll_index
            .get(&(org, roll_no.trim().to_string()))
            .and_then(|id| self.students.get(id))
    }

    /// All students of an organization, ordered by roll number.
    pub fn students(&self, org: OrgId) -> Result<Vec<&Student>, CampusError> {
        self.organization(org)?;
        let mut students: Vec<_> = self
            .students
            .values()
            .filter(|s| s.organization == org)
            .collect();
        students.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
        Ok(students)
    }

    /// `{rollNumber, name}` pairs for one organization.
    pub fn roster_entries(&self, org: OrgId) -> Result<Vec<RosterEntry>, CampusError> {
        Ok(self
            .students(org)?
            .into_iter()
            .map(|s| RosterEntry::new(s.roll_no.clone(), s.name.clone()))
            .collect())
    }

    /// Snapshot of everything a scan session needs, read once at start.
    pub fn scan_profile(&self, org: OrgId) -> Result<ScanProfile, CampusError> {
        let organization = self.organization(org)?;
        let roster: Roster = self.roster_entries(org)?.into_iter().collect();
        Ok(ScanProfile::new(
            organization.validation_keywords(),
            organization.roll_no_length(),
            roster,
        ))
    }

    // ---------------------------------------------------------------
    // Attendance
    // ---------------------------------------------------------------

    /// Records a scan: opens an Out entry, or closes the open one as In.
    pub fn record_scan(
        &mut self,
        org: OrgId,
        roll_no: &str,
        now: DateTime<Utc>,
    ) -> Result<ScanReceipt, CampusError> {
        self.organization(org)?;
        let student = self
            .student_by_roll(org, roll_no)
            .cloned()
            .ok_or(CampusError::StudentNotFound)?;

        if let Some(index) = self.open_entries.remove(&student.id) {
            let entry = &mut self.entries[index];
            entry.close(now);
            info!(org = %org, roll_no = %student.roll_no, entry = %entry.id, "Student returned");
            return Ok(ScanReceipt::new(EntryStatus::In, student, entry.clone()));
        }

        let entry = Entry::open(EntryId(self.next_id()), student.id, org, now);
        self.open_entries.insert(student.id, self.entries.len());
        self.entries.push(entry.clone());
        info!(org = %org, roll_no = %student.roll_no, entry = %entry.id, "Student left");
        Ok(ScanReceipt::new(EntryStatus::Out, student, entry))
    }

    /// The student's open entry, if they are currently out.
    pub fn open_entry(&self, student: StudentId) -> Option<&Entry> {
        self.open_entries.get(&student).map(|&i| &self.entries[i])
    }

    /// Entries matching `query`, newest first.
    pub fn entries(
        &self,
        org: OrgId,
        query: &EntryQuery,
    ) -> Result<Vec<EntryRecord<'_>>, CampusError> {
        self.organization(org)?;
        let mut records: Vec<EntryRecord<'_>> = self
            .entries
            .iter()
            .filter(|e| e.organization == org && query.matches_day(e.leaving_time))
            .filter_map(|entry| {
                self.students
                    .get(&entry.student)
                    .map(|student| EntryRecord { entry, student })
            })
            .filter(|r| query.matches_student(r.student))
            .collect();

        records.sort_by(|a, b| {
            b.entry
                .leaving_time
                .cmp(&a.entry.leaving_time)
                .then(b.entry.id.cmp(&a.entry.id))
        });
        records.truncate(query.limit());
        Ok(records)
    }

    /// Students who left on `day` and have not come back.
    pub fn unreturned_on(
        &self,
        org: OrgId,
        day: NaiveDate,
    ) -> Result<Vec<EntryRecord<'_>>, CampusError> {
        let query = EntryQuery {
            limit: Some(usize::MAX),
            ..EntryQuery::on(day)
        };
        Ok(self
            .entries(org, &query)?
            .into_iter()
            .filter(|r| r.entry.is_open())
            .collect())
    }
}

impl Default for CampusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const OWNER: UserId = UserId(100);

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn student(roll: &str, name: &str) -> NewStudent {
        NewStudent {
            roll_no: roll.into(),
            name: name.into(),
            email: format!("{roll}@example.com"),
            ..NewStudent::default()
        }
    }

    fn store_with_students() -> (CampusStore, OrgId) {
        let mut store = CampusStore::new();
        let org = store.create_organization("North Hostel", "gate-1", OWNER).unwrap();
        store.add_student(org, Some(OWNER), student("12345", "Sahil Kumar")).unwrap();
        store.add_student(org, Some(OWNER), student("67890", "Asha Rani")).unwrap();
        (store, org)
    }

    #[test]
    fn test_scan_out_then_in_reuses_entry() {
        let (mut store, org) = store_with_students();

        let out = store.record_scan(org, "12345", t(9, 0)).unwrap();
        assert_eq!(out.kind, EntryStatus::Out);
        assert_eq!(out.message, "Goodbye, Sahil Kumar!");
        assert!(store.open_entry(out.student.id).is_some());

        let back = store.record_scan(org, "12345", t(12, 0)).unwrap();
        assert_eq!(back.kind, EntryStatus::In);
        assert_eq!(back.message, "Welcome back, Sahil Kumar!");
        assert_eq!(back.entry.id, out.entry.id);
        assert_eq!(back.entry.arrival_time, Some(t(12, 0)));
        assert!(store.open_entry(out.student.id).is_none());
    }

    #[test]
    fn test_at_most_one_open_entry() {
        let (mut store, org) = store_with_students();
        for i in 0..5 {
            store.record_scan(org, "12345", t(9, i)).unwrap();
        }
        let open = store
            .entries(org, &EntryQuery::default())
            .unwrap()
            .into_iter()
            .filter(|r| r.entry.is_open())
            .count();
        assert_eq!(open, 1);
    }

    #[test]
    fn test_unknown_roll_not_found() {
        let (mut store, org) = store_with_students();
        let err = store.record_scan(org, "99999", t(9, 0)).unwrap_err();
        assert!(matches!(err, CampusError::StudentNotFound));
        assert_eq!(err.to_string(), "Student not found in this organization");
    }

    #[test]
    fn test_roll_scoped_to_organization() {
        let (mut store, org) = store_with_students();
        let other = store.create_organization("South Hostel", "gate-2", OWNER).unwrap();
        assert!(matches!(
            store.record_scan(other, "12345", t(9, 0)),
            Err(CampusError::StudentNotFound)
        ));
        store.add_student(other, Some(OWNER), student("12345", "Someone Else")).unwrap();
        let receipt = store.record_scan(other, "12345", t(9, 0)).unwrap();
        assert_eq!(receipt.student.name, "Someone Else");
        assert!(store.student_by_roll(org, "12345").is_some());
    }

    #[test]
    fn test_duplicate_roll_rejected() {
        let (mut store, org) = store_with_students();
        assert!(matches!(
            store.add_student(org, Some(OWNER), student("12345", "Dup")),
            Err(CampusError::DuplicateRollNo(_))
        ));
    }

    #[test]
    fn test_only_owner_adds_students() {
        let (mut store, org) = store_with_students();
        assert!(matches!(
            store.add_student(org, Some(UserId(5)), student("11111", "X")),
            Err(CampusError::NotOwner)
        ));
        assert!(matches!(
            store.add_student(org, None, student("11111", "X")),
            Err(CampusError::NotOwner)
        ));
    }

    #[test]
    fn test_configure_requires_six_keywords() {
        let (mut store, org) = store_with_students();
        let few = vec!["College".to_string(), "Valid".to_string()];
        assert!(matches!(
            store.configure_organization(org, OWNER, few, 5),
            Err(CampusError::TooFewKeywords { provided: 2, .. })
        ));

        let six: Vec<String> = ["Roorkee", "IIT", "Deptt", "Welfare", "Enr", "Valid"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let org_ref = store.configure_organization(org, OWNER, six, 5).unwrap();
        assert!(org_ref.is_setup());
    }

    #[test]
    fn test_scan_profile_snapshot() {
        let (store, org) = store_with_students();
        let profile = store.scan_profile(org).unwrap();
        assert!(!profile.keyword_check_enabled());
        assert_eq!(profile.roll_no_length(), 5);
        assert_eq!(profile.roster().name_of("67890"), Some("Asha Rani"));
    }

    #[test]
    fn test_portal_access() {
        let (mut store, org) = store_with_students();
        assert!(matches!(
            store.open_portal(org, "wrong", None, t(8, 0)),
            Err(CampusError::InvalidAccessCode)
        ));

        let guard = UserId(7);
        let session = store.open_portal(org, "gate-1", Some(guard), t(8, 0)).unwrap();
        assert_eq!(
            store.resolve_portal(&session.token, t(9, 0)).unwrap().organization,
            org
        );
        assert!(matches!(
            store.resolve_portal(&session.token, t(8, 0) + Duration::hours(25)),
            Err(CampusError::PortalSessionExpired)
        ));
        assert!(matches!(
            store.resolve_portal(&PortalToken::from("nope"), t(9, 0)),
            Err(CampusError::PortalSessionNotFound)
        ));

        // Joining twice keeps one membership.
        store.open_portal(org, "gate-1", Some(guard), t(8, 5)).unwrap();
        let orgs = store.organizations_for(guard);
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].1, Role::Staff);
        assert_eq!(store.members(org).unwrap().len(), 2);

        assert_eq!(store.purge_expired_portals(t(8, 0) + Duration::hours(30)), 2);
    }

    #[test]
    fn test_import_report() {
        let (mut store, org) = store_with_students();
        let rows = vec![
            StudentRow::new("22222", "Ravi Das", "ravi@example.com"),
            StudentRow::new("12345", "Sahil Kumar", "sahil@example.com"),
            StudentRow::new("22222", "Ravi Again", "ravi2@example.com"),
            StudentRow {
                name: Some("No Roll".into()),
                ..StudentRow::default()
            },
            StudentRow {
                mobile_no: Some("123".into()),
                ..StudentRow::new("33333", "Bad Mobile", "bad@example.com")
            },
        ];

        let report = store.import_students(org, Some(OWNER), &rows).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0].row, 5);
        assert_eq!(report.errors[0].name, "No Roll");
        assert_eq!(report.errors[1].row, 6);
        assert!(store.student_by_roll(org, "22222").is_some());
    }

    #[test]
    fn test_entry_listing_and_unreturned() {
        let (mut store, org) = store_with_students();
        store.record_scan(org, "12345", t(9, 0)).unwrap();
        store.record_scan(org, "67890", t(10, 0)).unwrap();
        store.record_scan(org, "12345", t(11, 0)).unwrap();
        store
            .record_scan(org, "67890", t(10, 0) + Duration::days(1))
            .unwrap();

        let all = store.entries(org, &EntryQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].student.roll_no, "67890");

        let search = EntryQuery {
            search: Some("sahil".into()),
            ..EntryQuery::default()
        };
        assert_eq!(store.entries(org, &search).unwrap().len(), 1);

        let day = t(0, 0).date_naive();
        assert!(store.unreturned_on(org, day).unwrap().is_empty());

        store.record_scan(org, "12345", t(20, 0)).unwrap();
        let out = store.unreturned_on(org, day).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].student.name, "Sahil Kumar");
    }

    #[test]
    fn test_removed_student_cannot_scan() {
        let (mut store, org) = store_with_students();
        store.record_scan(org, "12345", t(9, 0)).unwrap();
        let removed = store.remove_student(org, Some(OWNER), "12345").unwrap();
        assert_eq!(removed.name, "Sahil Kumar");
        assert!(matches!(
            store.record_scan(org, "12345", t(10, 0)),
            Err(CampusError::StudentNotFound)
        ));
    }

    #[test]
    fn test_roll_length_settable_without_keywords() {
        let mut store = CampusStore::new();
        let org = store.create_organization("Tech Park", "gate", OWNER).unwrap();
        store.add_student(org, Some(OWNER), student("20231234", "Priya Singh")).unwrap();

        assert!(matches!(
            store.set_roll_no_length(org, UserId(7), 8),
            Err(CampusError::NotOwner)
        ));
        store.set_roll_no_length(org, OWNER, 8).unwrap();

        let profile = store.scan_profile(org).unwrap();
        assert_eq!(profile.roll_no_length(), 8);
        assert!(profile.keywords().is_empty());
    }

    #[test]
    fn test_partial_keywords_still_rejected_after_roll_length() {
        let (mut store, org) = store_with_students();
        store.set_roll_no_length(org, OWNER, 8).unwrap();
        let three = vec!["A".to_string(), "B".into(), "C".into()];
        assert!(matches!(
            store.configure_organization(org, OWNER, three, 8),
            Err(CampusError::TooFewKeywords { provided: 3, .. })
        ));
    }

    #[test]
    fn test_update_student_changes_roll() {
        let (mut store, org) = store_with_students();
        let out = store.record_scan(org, "12345", t(9, 0)).unwrap();

        let updated = store
            .update_student(org, Some(OWNER), "12345", student("12346", "Sahil K"))
            .unwrap();
        assert_eq!(updated.id, out.student.id);
        assert_eq!(updated.name, "Sahil K");

        assert!(store.student_by_roll(org, "12345").is_none());
        let back = store.record_scan(org, "12346", t(10, 0)).unwrap();
        assert_eq!(back.kind, EntryStatus::In);
        assert_eq!(back.entry.id, out.entry.id);
    }

    #[test]
    fn test_update_student_roll_collision() {
        let (mut store, org) = store_with_students();
        assert!(matches!(
            store.update_student(org, Some(OWNER), "12345", student("67890", "Sahil")),
            Err(CampusError::DuplicateRollNo(roll)) if roll == "67890"
        ));
        assert_eq!(store.student_by_roll(org, "12345").unwrap().name, "Sahil Kumar");
        assert_eq!(store.student_by_roll(org, "67890").unwrap().name, "Asha Rani");
    }

    #[test]
    fn test_update_student_owner_only() {
        let (mut store, org) = store_with_students();
        assert!(matches!(
            store.update_student(org, Some(UserId(7)), "12345", student("12345", "X")),
            Err(CampusError::NotOwner)
        ));
        assert!(matches!(
            store.update_student(org, Some(OWNER), "11111", student("11111", "X")),
            Err(CampusError::StudentNotFound)
        ));
    }

    #[test]
    fn test_owner_manages_members() {
        let (mut store, org) = store_with_students();
        let guard = UserId(7);

        assert!(matches!(
            store.add_member(org, guard, UserId(8), Role::Staff),
            Err(CampusError::NotOwner)
        ));
        assert!(matches!(
            store.add_member(org, OWNER, guard, Role::Owner),
            Err(CampusError::InvalidRole(Role::Owner))
        ));

        assert_eq!(store.add_member(org, OWNER, guard, Role::Guard).unwrap().role, Role::Guard);
        assert!(matches!(
            store.add_member(org, OWNER, guard, Role::Admin),
            Err(CampusError::AlreadyMember)
        ));
        assert_eq!(store.organizations_for(guard)[0].1, Role::Guard);

        assert!(matches!(
            store.remove_member(org, OWNER, OWNER),
            Err(CampusError::CannotRemoveOwner)
        ));
        assert_eq!(store.remove_member(org, OWNER, guard).unwrap().user, guard);
        assert!(store.organizations_for(guard).is_empty());
        assert!(matches!(
            store.remove_member(org, OWNER, guard),
            Err(CampusError::MemberNotFound)
        ));
    }

    #[test]
    fn test_owner_membership_restored() {
        let (mut store, org) = store_with_students();
        store.memberships.clear();
        let membership = store.add_member(org, OWNER, OWNER, Role::Staff).unwrap();
        assert_eq!(membership.role, Role::Owner);
        assert_eq!(store.members(org).unwrap().len(), 1);
    }
}
