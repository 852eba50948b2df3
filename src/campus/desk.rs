//! Binds a scan session to one organization's attendance book.

use super::{entry::ScanReceipt, store::CampusStore, CampusError, OrgId};
use crate::session::AttendanceRecorder;
use chrono::Utc;

/// Records accepted scans against one organization, stamped with wall time.
#[derive(Debug)]
pub struct AttendanceDesk<'a> {
    store: &'a mut CampusStore,
    organization: OrgId,
}

impl<'a> AttendanceDesk<'a> {
    pub fn new(store: &'a mut CampusStore, organization: OrgId) -> Result<Self, CampusError> {
        store.organization(organization)?;
        Ok(Self {
            store,
            organization,
        })
    }

    pub fn organization(&self) -> OrgId {
        self.organization
    }

    pub fn store(&self) -> &CampusStore {
        self.store
    }
}

impl AttendanceRecorder for AttendanceDesk<'_> {
    type Error = CampusError;

    fn record(&mut self, roll_no: &str) -> Result<ScanReceipt, CampusError> {
        self.store.record_scan(self.organization, roll_no, Utc::now())
    }
}
