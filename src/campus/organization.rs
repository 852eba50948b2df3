//! Organizations and their members.

use super::{access::AccessCodeHash, CampusError, OrgId, UserId};
use serde::{Deserialize, Serialize};

/// Minimum number of validation keywords once configured.
pub const MIN_VALIDATION_KEYWORDS: usize = 6;

/// Roll-number length used until an organization configures one.
pub const DEFAULT_ROLL_NO_LENGTH: usize = 5;

/// A tenant: one campus, hostel or institution.
#[derive(Debug, Clone)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub access_code: AccessCodeHash,
    pub owner: UserId,
    validation_keywords: Vec<String>,
    roll_no_length: usize,
}

impl Organization {
    pub(crate) fn new(id: OrgId, name: String, access_code: AccessCodeHash, owner: UserId) -> Self {
        Self {
            id,
            name,
            access_code,
            owner,
            validation_keywords: Vec::new(),
            roll_no_length: DEFAULT_ROLL_NO_LENGTH,
        }
    }

    /// Keywords printed on genuine ID cards. Empty means keyword checks
    /// are disabled.
    pub fn validation_keywords(&self) -> &[String] {
        &self.validation_keywords
    }

    pub fn roll_no_length(&self) -> usize {
        self.roll_no_length
    }

    /// True once enough validation keywords are configured.
    pub fn is_setup(&self) -> bool {
        self.validation_keywords.len() >= MIN_VALIDATION_KEYWORDS
    }

    /// Replaces the ID-card validation settings.
    ///
    /// Partial configurations are rejected outright; the organization is
    /// left untouched on error.
    pub fn configure(
        &mut self,
        keywords: Vec<String>,
        roll_no_length: usize,
    ) -> Result<(), CampusError> {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.len() < MIN_VALIDATION_KEYWORDS {
            return Err(CampusError::TooFewKeywords {
                provided: keywords.len(),
                required: MIN_VALIDATION_KEYWORDS,
            });
        }
        if roll_no_length == 0 {
            return Err(CampusError::InvalidRollNoLength);
        }

        self.validation_keywords = keywords;
        self.roll_no_length = roll_no_length;
        Ok(())
    }

    /// Changes the roll-number length alone, keeping the keywords as they
    /// are. Organizations without keywords scan on roll number and name.
    pub fn set_roll_no_length(&mut self, roll_no_length: usize) -> Result<(), CampusError> {
        if roll_no_length == 0 {
            return Err(CampusError::InvalidRollNoLength);
        }
        self.roll_no_length = roll_no_length;
        Ok(())
    }
}

/// Member roles within an organization.
///
/// Only the creator holds `Owner`. Users joining through the portal
/// become `Staff`; the owner may grant `Admin` or `Guard` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Guard,
    Staff,
}

/// Links a user to an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user: UserId,
    pub organization: OrgId,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campus::access::HashAlgorithm;

    fn org() -> Organization {
        Organization::new(
            OrgId(1),
            "North Hostel".into(),
            AccessCodeHash::new("code", HashAlgorithm::Blake3).unwrap(),
            UserId(9),
        )
    }

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("word{i}")).collect()
    }

    #[test]
    fn test_new_org_unconfigured() {
        let org = org();
        assert!(!org.is_setup());
        assert!(org.validation_keywords().is_empty());
        assert_eq!(org.roll_no_length(), DEFAULT_ROLL_NO_LENGTH);
    }

    #[test]
    fn test_partial_keywords_rejected() {
        let mut org = org();
        for n in 0..MIN_VALIDATION_KEYWORDS {
            assert!(matches!(
                org.configure(words(n), 5),
                Err(CampusError::TooFewKeywords { provided, .. }) if provided == n
            ));
        }
        assert!(!org.is_setup());
    }

    #[test]
    fn test_blank_keywords_do_not_count() {
        let mut org = org();
        let mut keywords = words(5);
        keywords.push("   ".into());
        assert!(org.configure(keywords, 5).is_err());
    }

    #[test]
    fn test_configure_sets_up() {
        let mut org = org();
        org.configure(words(6), 8).unwrap();
        assert!(org.is_setup());
        assert_eq!(org.roll_no_length(), 8);
    }

    #[test]
    fn test_zero_roll_length_rejected() {
        let mut org = org();
        assert!(matches!(
            org.configure(words(6), 0),
            Err(CampusError::InvalidRollNoLength)
        ));
        assert!(!org.is_setup());
    }

    #[test]
    fn test_roll_length_without_keywords() {
        let mut org = org();
        org.set_roll_no_length(8).unwrap();
        assert_eq!(org.roll_no_length(), 8);
        assert!(org.validation_keywords().is_empty());
        assert!(matches!(
            org.set_roll_no_length(0),
            Err(CampusError::InvalidRollNoLength)
        ));
        assert_eq!(org.roll_no_length(), 8);
    }

    #[test]
    fn test_roll_length_keeps_keywords() {
        let mut org = org();
        org.configure(words(6), 5).unwrap();
        org.set_roll_no_length(7).unwrap();
        assert!(org.is_setup());
        assert_eq!(org.roll_no_length(), 7);
    }
}
