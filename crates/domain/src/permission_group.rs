use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use turnstile_core::AppResult;

use crate::validation::validate_group_name;
use crate::{PermissionGroupId, PermissionId};

/// Validated permission group name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupName(String);

impl GroupName {
    /// Creates a group name after trimming and pattern validation.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let value = value.as_ref().trim();
        validate_group_name(value)?;
        Ok(Self(value.to_owned()))
    }

    /// Returns the validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Named, reusable set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    id: PermissionGroupId,
    name: GroupName,
    is_active: bool,
    members: BTreeSet<PermissionId>,
}

impl PermissionGroup {
    /// Creates an active group with empty membership.
    #[must_use]
    pub fn new(id: PermissionGroupId, name: GroupName) -> Self {
        Self {
            id,
            name,
            is_active: true,
            members: BTreeSet::new(),
        }
    }

    /// Rebuilds a group from persisted parts.
    #[must_use]
    pub fn from_parts(
        id: PermissionGroupId,
        name: GroupName,
        is_active: bool,
        members: BTreeSet<PermissionId>,
    ) -> Self {
        Self {
            id,
            name,
            is_active,
            members,
        }
    }

    /// Returns the group identifier.
    #[must_use]
    pub fn id(&self) -> PermissionGroupId {
        self.id
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &GroupName {
        &self.name
    }

    /// Returns whether the group is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns current permission membership.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<PermissionId> {
        &self.members
    }

    /// Renames the group.
    pub fn rename(&mut self, name: GroupName) {
        self.name = name;
    }

    /// Activates or deactivates the group.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    /// Inserts permissions and returns the ids that were newly added.
    pub fn add_members(
        &mut self,
        permissions: impl IntoIterator<Item = PermissionId>,
    ) -> Vec<PermissionId> {
        permissions
            .into_iter()
            .filter(|permission| self.members.insert(*permission))
            .collect()
    }

    /// Removes permissions and returns the ids that were members.
    pub fn remove_members(
        &mut self,
        permissions: impl IntoIterator<Item = PermissionId>,
    ) -> Vec<PermissionId> {
        permissions
            .into_iter()
            .filter(|permission| self.members.remove(permission))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupName, PermissionGroup};
    use crate::{PermissionGroupId, PermissionId};

    fn finance() -> PermissionGroup {
        let name = GroupName::new("Finance").unwrap_or_else(|error| panic!("{error}"));
        PermissionGroup::new(PermissionGroupId::new(), name)
    }

    #[test]
    fn new_group_is_active_and_empty() {
        let group = finance();
        assert!(group.is_active());
        assert!(group.members().is_empty());
    }

    #[test]
    fn group_name_is_trimmed() {
        let name = GroupName::new("  Finance Ops ").map(|name| name.as_str().to_owned());
        assert_eq!(name, Ok("Finance Ops".to_owned()));
    }

    #[test]
    fn adding_existing_member_reports_nothing_new() {
        let mut group = finance();
        let permission = PermissionId::new();

        assert_eq!(group.add_members([permission, permission]), vec![permission]);
        assert!(group.add_members([permission]).is_empty());
        assert_eq!(group.members().len(), 1);
    }

    #[test]
    fn removing_non_member_is_ignored() {
        let mut group = finance();
        let member = PermissionId::new();
        group.add_members([member]);

        assert!(group.remove_members([PermissionId::new()]).is_empty());
        assert_eq!(group.remove_members([member]), vec![member]);
        assert!(group.members().is_empty());
    }
}
