use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use turnstile_core::{AppError, AppResult, TenantId, UserIdentity};
use turnstile_domain::{
    AccessPoint, AccessPointId, GroupName, Permission, PermissionGroup, PermissionGroupId,
    PermissionId, Role, RoleId,
};

use crate::{
    AccessPointRepository, AuditEvent, AuditRepository, MembershipChange,
    PermissionGroupRepository, PermissionRepository, RoleRepository, UserRoleAssignment,
};

pub(crate) fn actor() -> UserIdentity {
    UserIdentity::new("alice", "Alice", TenantId::new())
}

#[derive(Default)]
struct CatalogState {
    permissions: Vec<Permission>,
    access_points: Vec<AccessPoint>,
    groups: Vec<PermissionGroup>,
    roles: Vec<Role>,
    user_roles: HashMap<String, BTreeSet<RoleId>>,
}

/// Lenient single-tenant catalog used by service tests.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    state: Mutex<CatalogState>,
    write_failure: Mutex<Option<AppError>>,
    transient_reads: Mutex<u32>,
    writes: Mutex<u32>,
}

impl FakeCatalog {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fails the next write with `error` without touching state.
    pub(crate) async fn fail_next_write(&self, error: AppError) {
        *self.write_failure.lock().await = Some(error);
    }

    /// Fails the next `count` permission listings with a transient error.
    pub(crate) async fn fail_reads(&self, count: u32) {
        *self.transient_reads.lock().await = count;
    }

    pub(crate) async fn write_count(&self) -> u32 {
        *self.writes.lock().await
    }

    pub(crate) async fn seed_permission(&self, code: &str) -> Permission {
        let permission = Permission::new(PermissionId::new(), code, format!("{code} access"))
            .unwrap_or_else(|error| panic!("{error}"));
        self.state.lock().await.permissions.push(permission.clone());
        permission
    }

    pub(crate) async fn seed_group(&self, name: &str, members: &[PermissionId]) -> PermissionGroup {
        let name = GroupName::new(name).unwrap_or_else(|error| panic!("{error}"));
        let group = PermissionGroup::from_parts(
            PermissionGroupId::new(),
            name,
            true,
            members.iter().copied().collect(),
        );
        self.state.lock().await.groups.push(group.clone());
        group
    }

    pub(crate) async fn seed_access_point(&self, access_point: AccessPoint) -> AccessPoint {
        self.state
            .lock()
            .await
            .access_points
            .push(access_point.clone());
        access_point
    }

    pub(crate) async fn seed_role(&self, name: &str) -> Role {
        let role = Role::new(RoleId::new(), name, []).unwrap_or_else(|error| panic!("{error}"));
        self.state.lock().await.roles.push(role.clone());
        role
    }

    async fn begin_write(&self) -> AppResult<()> {
        if let Some(error) = self.write_failure.lock().await.take() {
            return Err(error);
        }
        *self.writes.lock().await += 1;
        Ok(())
    }
}

fn missing(kind: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{kind} '{id}' does not exist"))
}

#[async_trait]
impl PermissionRepository for FakeCatalog {
    async fn list_permissions(&self, _tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        let mut transient_reads = self.transient_reads.lock().await;
        if *transient_reads > 0 {
            *transient_reads -= 1;
            return Err(AppError::Transient("connection reset".to_owned()));
        }

        let mut permissions = self.state.lock().await.permissions.clone();
        permissions.sort_by(|left, right| left.code().cmp(right.code()));
        Ok(permissions)
    }

    async fn find_permission(
        &self,
        _tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .lock()
            .await
            .permissions
            .iter()
            .find(|permission| permission.id() == permission_id)
            .cloned())
    }

    async fn create_permission(
        &self,
        _tenant_id: TenantId,
        permission: Permission,
    ) -> AppResult<Permission> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        if state
            .permissions
            .iter()
            .any(|existing| existing.code() == permission.code())
        {
            return Err(AppError::Conflict(format!(
                "permission code '{}' already exists",
                permission.code()
            )));
        }
        state.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn update_permission_description(
        &self,
        _tenant_id: TenantId,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let permission = state
            .permissions
            .iter_mut()
            .find(|permission| permission.id() == permission_id)
            .ok_or_else(|| missing("permission", permission_id))?;
        permission.set_description(description);
        Ok(permission.clone())
    }

    async fn delete_permission(
        &self,
        _tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let before = state.permissions.len();
        state
            .permissions
            .retain(|permission| permission.id() != permission_id);
        if before == state.permissions.len() {
            return Err(missing("permission", permission_id));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessPointRepository for FakeCatalog {
    async fn list_access_points(&self, _tenant_id: TenantId) -> AppResult<Vec<AccessPoint>> {
        Ok(self.state.lock().await.access_points.clone())
    }

    async fn list_unmapped_access_points(
        &self,
        _tenant_id: TenantId,
    ) -> AppResult<Vec<AccessPoint>> {
        Ok(self
            .state
            .lock()
            .await
            .access_points
            .iter()
            .filter(|access_point| access_point.is_unmapped())
            .cloned()
            .collect())
    }

    async fn find_access_point(
        &self,
        _tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<Option<AccessPoint>> {
        Ok(self
            .state
            .lock()
            .await
            .access_points
            .iter()
            .find(|access_point| access_point.id() == access_point_id)
            .cloned())
    }

    async fn create_access_point(
        &self,
        _tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        if state
            .access_points
            .iter()
            .any(|existing| existing.endpoint_key() == access_point.endpoint_key())
        {
            return Err(AppError::Conflict("access point already exists".to_owned()));
        }
        state.access_points.push(access_point.clone());
        Ok(access_point)
    }

    async fn update_access_point(
        &self,
        _tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let stored = state
            .access_points
            .iter_mut()
            .find(|existing| existing.id() == access_point.id())
            .ok_or_else(|| missing("access point", access_point.id()))?;
        *stored = access_point.with_permission(stored.permission());
        Ok(stored.clone())
    }

    async fn assign_permission(
        &self,
        _tenant_id: TenantId,
        access_point_id: AccessPointId,
        permission_id: PermissionId,
    ) -> AppResult<AccessPoint> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        if !state
            .permissions
            .iter()
            .any(|permission| permission.id() == permission_id)
        {
            return Err(missing("permission", permission_id));
        }
        let stored = state
            .access_points
            .iter_mut()
            .find(|existing| existing.id() == access_point_id)
            .ok_or_else(|| missing("access point", access_point_id))?;
        stored.assign_permission(permission_id);
        Ok(stored.clone())
    }

    async fn clear_permission(
        &self,
        _tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<AccessPoint> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let stored = state
            .access_points
            .iter_mut()
            .find(|existing| existing.id() == access_point_id)
            .ok_or_else(|| missing("access point", access_point_id))?;
        stored.clear_permission();
        Ok(stored.clone())
    }

    async fn delete_access_point(
        &self,
        _tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<()> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let before = state.access_points.len();
        state
            .access_points
            .retain(|access_point| access_point.id() != access_point_id);
        if before == state.access_points.len() {
            return Err(missing("access point", access_point_id));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionGroupRepository for FakeCatalog {
    async fn list_groups(&self, _tenant_id: TenantId) -> AppResult<Vec<PermissionGroup>> {
        Ok(self.state.lock().await.groups.clone())
    }

    async fn find_group(
        &self,
        _tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<Option<PermissionGroup>> {
        Ok(self
            .state
            .lock()
            .await
            .groups
            .iter()
            .find(|group| group.id() == group_id)
            .cloned())
    }

    async fn create_group(
        &self,
        _tenant_id: TenantId,
        group: PermissionGroup,
    ) -> AppResult<PermissionGroup> {
        self.begin_write().await?;
        self.state.lock().await.groups.push(group.clone());
        Ok(group)
    }

    async fn update_group(
        &self,
        _tenant_id: TenantId,
        group_id: PermissionGroupId,
        name: Option<GroupName>,
        is_active: Option<bool>,
    ) -> AppResult<PermissionGroup> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id() == group_id)
            .ok_or_else(|| missing("permission group", group_id))?;
        if let Some(name) = name {
            group.rename(name);
        }
        if let Some(is_active) = is_active {
            group.set_active(is_active);
        }
        Ok(group.clone())
    }

    async fn delete_group(
        &self,
        _tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<()> {
        self.begin_write().await?;
        self.state
            .lock()
            .await
            .groups
            .retain(|group| group.id() != group_id);
        Ok(())
    }

    async fn list_group_permissions(
        &self,
        _tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<BTreeSet<PermissionId>> {
        self.state
            .lock()
            .await
            .groups
            .iter()
            .find(|group| group.id() == group_id)
            .map(|group| group.members().clone())
            .ok_or_else(|| missing("permission group", group_id))
    }

    async fn add_group_permissions(
        &self,
        _tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        if let Some(unknown) = permissions.iter().find(|permission_id| {
            !state
                .permissions
                .iter()
                .any(|permission| permission.id() == **permission_id)
        }) {
            return Err(missing("permission", unknown));
        }
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id() == group_id)
            .ok_or_else(|| missing("permission group", group_id))?;

        let applied: BTreeSet<_> = group
            .add_members(permissions.iter().copied())
            .into_iter()
            .collect();
        Ok(MembershipChange {
            skipped: permissions.difference(&applied).copied().collect(),
            applied,
            membership: group.members().clone(),
        })
    }

    async fn remove_group_permissions(
        &self,
        _tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id() == group_id)
            .ok_or_else(|| missing("permission group", group_id))?;
        if let Some(non_member) = permissions.difference(group.members()).next() {
            return Err(AppError::NotFound(format!(
                "permission '{non_member}' is not a member of the group"
            )));
        }

        let applied = group.remove_members(permissions.iter().copied());
        Ok(MembershipChange {
            applied: applied.into_iter().collect(),
            skipped: BTreeSet::new(),
            membership: group.members().clone(),
        })
    }
}

#[async_trait]
impl RoleRepository for FakeCatalog {
    async fn list_roles(&self, _tenant_id: TenantId) -> AppResult<Vec<Role>> {
        Ok(self.state.lock().await.roles.clone())
    }

    async fn find_role(&self, _tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn create_role(&self, _tenant_id: TenantId, role: Role) -> AppResult<Role> {
        self.begin_write().await?;
        self.state.lock().await.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(&self, _tenant_id: TenantId, role: Role) -> AppResult<Role> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let stored = state
            .roles
            .iter_mut()
            .find(|existing| existing.id() == role.id())
            .ok_or_else(|| missing("role", role.id()))?;
        *stored = role.clone();
        Ok(role)
    }

    async fn delete_role(&self, _tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        self.begin_write().await?;
        self.state
            .lock()
            .await
            .roles
            .retain(|role| role.id() != role_id);
        Ok(())
    }

    async fn user_roles(
        &self,
        _tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        Ok(UserRoleAssignment {
            user_id: user_id.to_owned(),
            role_ids: self
                .state
                .lock()
                .await
                .user_roles
                .get(user_id)
                .cloned()
                .unwrap_or_default(),
            updated_at: None,
        })
    }

    async fn replace_user_roles(
        &self,
        _tenant_id: TenantId,
        user_id: &str,
        role_ids: &BTreeSet<RoleId>,
    ) -> AppResult<UserRoleAssignment> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        if let Some(unknown) = role_ids
            .iter()
            .find(|role_id| !state.roles.iter().any(|role| role.id() == **role_id))
        {
            return Err(missing("role", unknown));
        }
        state.user_roles.insert(user_id.to_owned(), role_ids.clone());
        Ok(UserRoleAssignment {
            user_id: user_id.to_owned(),
            role_ids: role_ids.clone(),
            updated_at: Some(chrono::Utc::now()),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditRepository {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditRepository for RecordingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) struct FailingAuditRepository;

#[async_trait]
impl AuditRepository for FailingAuditRepository {
    async fn append_event(&self, _event: AuditEvent) -> AppResult<()> {
        Err(AppError::Transient("audit log unavailable".to_owned()))
    }
}
