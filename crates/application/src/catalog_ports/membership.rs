use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use turnstile_core::AppError;
use turnstile_domain::{PermissionId, RoleId};

/// How a store treats already-present ids in an add batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MembershipWriteMode {
    /// Skip ids that are already members and report them as skipped.
    #[default]
    Lenient,
    /// Reject the whole batch with a conflict.
    Strict,
}

impl MembershipWriteMode {
    /// Returns the configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for MembershipWriteMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(AppError::Validation(format!(
                "membership write mode must be 'lenient' or 'strict', got '{value}'"
            ))),
        }
    }
}

/// Store confirmation of one membership batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    /// Ids whose membership actually changed.
    pub applied: BTreeSet<PermissionId>,
    /// Ids left untouched because they already had the requested state.
    pub skipped: BTreeSet<PermissionId>,
    /// Authoritative membership after the batch.
    pub membership: BTreeSet<PermissionId>,
}

/// Full role set currently assigned to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleAssignment {
    /// User subject.
    pub user_id: String,
    /// Assigned roles.
    pub role_ids: BTreeSet<RoleId>,
    /// Last replacement time, absent when the user never had roles.
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::MembershipWriteMode;

    #[test]
    fn write_mode_parses_configuration_values() {
        assert_eq!(
            MembershipWriteMode::from_str("Strict"),
            Ok(MembershipWriteMode::Strict)
        );
        assert_eq!(
            MembershipWriteMode::from_str("lenient"),
            Ok(MembershipWriteMode::Lenient)
        );
        assert!(MembershipWriteMode::from_str("eventual").is_err());
    }
}
