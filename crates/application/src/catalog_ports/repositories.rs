use std::collections::BTreeSet;

use async_trait::async_trait;

use turnstile_core::{AppResult, TenantId};
use turnstile_domain::{
    AccessPoint, AccessPointId, GroupName, Permission, PermissionGroup, PermissionGroupId,
    PermissionId, Role, RoleId,
};

use super::membership::{MembershipChange, UserRoleAssignment};

/// Repository port for the permission catalog.
///
/// Mutations return the canonical persisted row or fail with `Conflict`,
/// `NotFound` or `Validation`. Reads never mutate.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Lists tenant permissions ordered by code.
    async fn list_permissions(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>>;

    /// Finds one permission.
    async fn find_permission(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>>;

    /// Persists a new permission; duplicate codes conflict.
    async fn create_permission(
        &self,
        tenant_id: TenantId,
        permission: Permission,
    ) -> AppResult<Permission>;

    /// Replaces the description of a permission.
    async fn update_permission_description(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission>;

    /// Deletes a permission, removing it from every group and role and
    /// unmapping it from every access point.
    async fn delete_permission(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<()>;
}

/// Repository port for protected access points and their mapping.
#[async_trait]
pub trait AccessPointRepository: Send + Sync {
    /// Lists tenant access points ordered by module, path and method.
    async fn list_access_points(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPoint>>;

    /// Lists access points without a mapped permission, in natural order.
    async fn list_unmapped_access_points(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<AccessPoint>>;

    /// Finds one access point.
    async fn find_access_point(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<Option<AccessPoint>>;

    /// Persists a new access point; a duplicate path and method conflicts.
    async fn create_access_point(
        &self,
        tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint>;

    /// Updates path, method, module and visibility of an access point.
    ///
    /// The stored permission mapping is kept; the mapping carried by
    /// `access_point` is ignored.
    async fn update_access_point(
        &self,
        tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint>;

    /// Maps a permission, overwriting any existing mapping.
    async fn assign_permission(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
        permission_id: PermissionId,
    ) -> AppResult<AccessPoint>;

    /// Clears the permission mapping.
    async fn clear_permission(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<AccessPoint>;

    /// Deletes an access point row.
    async fn delete_access_point(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<()>;
}

/// Repository port for permission groups and their membership.
#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    /// Lists tenant groups ordered by name.
    async fn list_groups(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionGroup>>;

    /// Finds one group.
    async fn find_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<Option<PermissionGroup>>;

    /// Persists a new group; duplicate names conflict.
    async fn create_group(
        &self,
        tenant_id: TenantId,
        group: PermissionGroup,
    ) -> AppResult<PermissionGroup>;

    /// Renames and/or (de)activates a group.
    async fn update_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        name: Option<GroupName>,
        is_active: Option<bool>,
    ) -> AppResult<PermissionGroup>;

    /// Deletes a group together with its membership rows.
    async fn delete_group(&self, tenant_id: TenantId, group_id: PermissionGroupId)
    -> AppResult<()>;

    /// Returns the authoritative membership of a group.
    async fn list_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<BTreeSet<PermissionId>>;

    /// Adds permissions to a group in one atomic batch.
    ///
    /// Unknown permission ids fail the whole batch with `NotFound`. Ids that
    /// are already members are skipped or rejected depending on the store's
    /// membership write mode.
    async fn add_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange>;

    /// Removes permissions from a group in one atomic batch.
    ///
    /// Any id that is not a current member fails the whole batch with
    /// `NotFound`.
    async fn remove_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange>;
}

/// Repository port for roles and user role assignments.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists tenant roles ordered by name.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Finds one role.
    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Persists a new role; duplicate names conflict and unknown grants are
    /// not found.
    async fn create_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role>;

    /// Replaces name and grants of an existing role.
    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role>;

    /// Deletes a role and removes it from every user assignment.
    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()>;

    /// Returns the roles assigned to a user; empty when none.
    async fn user_roles(&self, tenant_id: TenantId, user_id: &str)
    -> AppResult<UserRoleAssignment>;

    /// Replaces the full role set of a user.
    async fn replace_user_roles(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        role_ids: &BTreeSet<RoleId>,
    ) -> AppResult<UserRoleAssignment>;
}
