//! Portal sessions: a device's authenticated link to one organization.

use super::{token::PortalToken, OrgId, UserId};
use chrono::{DateTime, Duration, Utc};

/// How long a portal session stays valid.
pub fn portal_session_ttl() -> Duration {
    Duration::hours(24)
}

/// An open portal.
#[derive(Debug, Clone)]
pub struct PortalSession {
    pub token: PortalToken,
    pub organization: OrgId,
    /// Signed-in user, if the portal was opened by one.
    pub user: Option<UserId>,
    pub expires_at: DateTime<Utc>,
}

impl PortalSession {
    pub(crate) fn open(
        token: PortalToken,
        organization: OrgId,
        user: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            organization,
            user,
            expires_at: now + portal_session_ttl(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
