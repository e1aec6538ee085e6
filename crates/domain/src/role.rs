use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use turnstile_core::{AppError, AppResult, NonEmptyString};

use crate::validation::NAME_MAX_LENGTH;
use crate::{PermissionGroupId, PermissionId, RoleId};

/// One grant carried by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RoleGrant {
    /// Grants a single permission.
    Permission(PermissionId),
    /// Grants every permission of a group.
    Group(PermissionGroupId),
}

/// Named bundle of permissions or groups assignable to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    grants: BTreeSet<RoleGrant>,
}

impl Role {
    /// Creates a role after validating its name.
    pub fn new(
        id: RoleId,
        name: impl AsRef<str>,
        grants: impl IntoIterator<Item = RoleGrant>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: validate_role_name(name.as_ref())?,
            grants: grants.into_iter().collect(),
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role grants.
    #[must_use]
    pub fn grants(&self) -> &BTreeSet<RoleGrant> {
        &self.grants
    }

    /// Renames the role.
    pub fn rename(&mut self, name: impl AsRef<str>) -> AppResult<()> {
        self.name = validate_role_name(name.as_ref())?;
        Ok(())
    }

    /// Replaces every grant of the role.
    pub fn replace_grants(&mut self, grants: impl IntoIterator<Item = RoleGrant>) {
        self.grants = grants.into_iter().collect();
    }

    /// Drops grants matching the predicate and returns whether any were removed.
    pub fn drop_grants(&mut self, predicate: impl Fn(&RoleGrant) -> bool) -> bool {
        let before = self.grants.len();
        self.grants.retain(|grant| !predicate(grant));
        before != self.grants.len()
    }
}

fn validate_role_name(value: &str) -> AppResult<NonEmptyString> {
    let name = NonEmptyString::trimmed(value)
        .map_err(|_| AppError::Validation("role name must not be empty".to_owned()))?;

    if name.as_str().chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "role name must not exceed {NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(name)
}

/// Local working copy of a user's roles, edited by toggling.
///
/// Committing sends the full desired set; the working set never produces a
/// diff on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWorkingSet {
    assigned: BTreeSet<RoleId>,
    selected: BTreeSet<RoleId>,
}

impl RoleWorkingSet {
    /// Starts a working set from the user's assigned roles.
    #[must_use]
    pub fn new(assigned: BTreeSet<RoleId>) -> Self {
        Self {
            selected: assigned.clone(),
            assigned,
        }
    }

    /// Flips membership of a role and returns whether it is now selected.
    pub fn toggle(&mut self, role_id: RoleId) -> bool {
        if self.selected.remove(&role_id) {
            false
        } else {
            self.selected.insert(role_id);
            true
        }
    }

    /// Returns whether the role is currently selected.
    #[must_use]
    pub fn contains(&self, role_id: RoleId) -> bool {
        self.selected.contains(&role_id)
    }

    /// Returns the full desired set.
    #[must_use]
    pub fn selected(&self) -> &BTreeSet<RoleId> {
        &self.selected
    }

    /// Returns whether the selection differs from the assigned roles.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.assigned != self.selected
    }

    /// Adopts a confirmed assignment as the new baseline.
    pub fn reset(&mut self, assigned: BTreeSet<RoleId>) {
        self.selected = assigned.clone();
        self.assigned = assigned;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{Role, RoleGrant, RoleWorkingSet};
    use crate::{PermissionGroupId, PermissionId, RoleId};

    #[test]
    fn role_grants_deduplicate() {
        let permission = PermissionId::new();
        let role = Role::new(
            RoleId::new(),
            "Auditor",
            [RoleGrant::Permission(permission), RoleGrant::Permission(permission)],
        )
        .unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(role.grants().len(), 1);
    }

    #[test]
    fn drop_grants_removes_only_matching_group() {
        let group = PermissionGroupId::new();
        let permission = PermissionId::new();
        let mut role = Role::new(
            RoleId::new(),
            "Auditor",
            [RoleGrant::Group(group), RoleGrant::Permission(permission)],
        )
        .unwrap_or_else(|error| panic!("{error}"));

        assert!(role.drop_grants(|grant| *grant == RoleGrant::Group(group)));
        assert!(!role.drop_grants(|grant| *grant == RoleGrant::Group(group)));
        assert_eq!(role.grants().len(), 1);
    }

    #[test]
    fn toggle_flips_selection_and_dirty_state() {
        let admin = RoleId::new();
        let viewer = RoleId::new();
        let mut working_set = RoleWorkingSet::new(BTreeSet::from([admin]));

        assert!(!working_set.is_dirty());
        assert!(working_set.toggle(viewer));
        assert!(!working_set.toggle(admin));
        assert_eq!(working_set.selected(), &BTreeSet::from([viewer]));
        assert!(working_set.is_dirty());

        working_set.toggle(viewer);
        working_set.toggle(admin);
        assert!(!working_set.is_dirty());
    }

    #[test]
    fn blank_role_name_is_rejected() {
        assert!(Role::new(RoleId::new(), " ", []).is_err());
    }
}
