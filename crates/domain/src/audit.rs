use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by catalog use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission description changes.
    PermissionUpdated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted when an access point is created.
    AccessPointCreated,
    /// Emitted when an access point is updated.
    AccessPointUpdated,
    /// Emitted when an access point is deleted.
    AccessPointDeleted,
    /// Emitted when a permission is mapped onto an access point.
    AccessPointMapped,
    /// Emitted when an access point mapping is cleared.
    AccessPointUnmapped,
    /// Emitted when a permission group is created.
    GroupCreated,
    /// Emitted when a permission group is renamed or (de)activated.
    GroupUpdated,
    /// Emitted when a permission group is deleted.
    GroupDeleted,
    /// Emitted when permissions are added to a group.
    GroupPermissionsAdded,
    /// Emitted when permissions are removed from a group.
    GroupPermissionsRemoved,
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is updated.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a user's role set is replaced.
    UserRolesReplaced,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionCreated => "catalog.permission.created",
            Self::PermissionUpdated => "catalog.permission.updated",
            Self::PermissionDeleted => "catalog.permission.deleted",
            Self::AccessPointCreated => "catalog.access_point.created",
            Self::AccessPointUpdated => "catalog.access_point.updated",
            Self::AccessPointDeleted => "catalog.access_point.deleted",
            Self::AccessPointMapped => "catalog.access_point.mapped",
            Self::AccessPointUnmapped => "catalog.access_point.unmapped",
            Self::GroupCreated => "catalog.group.created",
            Self::GroupUpdated => "catalog.group.updated",
            Self::GroupDeleted => "catalog.group.deleted",
            Self::GroupPermissionsAdded => "catalog.group.permissions_added",
            Self::GroupPermissionsRemoved => "catalog.group.permissions_removed",
            Self::RoleCreated => "catalog.role.created",
            Self::RoleUpdated => "catalog.role.updated",
            Self::RoleDeleted => "catalog.role.deleted",
            Self::UserRolesReplaced => "catalog.user.roles_replaced",
        }
    }
}
