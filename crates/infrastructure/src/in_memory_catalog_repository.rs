use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use turnstile_application::MembershipWriteMode;
use turnstile_core::{AppError, AppResult, TenantId};
use turnstile_domain::{
    AccessPoint, AccessPointId, Permission, PermissionGroup, PermissionGroupId, PermissionId,
    Role, RoleGrant, RoleId,
};

mod access_points;
mod groups;
mod permissions;
mod roles;

#[cfg(test)]
mod tests;

#[derive(Debug, Default)]
struct TenantCatalog {
    permissions: HashMap<PermissionId, Permission>,
    access_points: HashMap<AccessPointId, AccessPoint>,
    groups: HashMap<PermissionGroupId, PermissionGroup>,
    roles: HashMap<RoleId, Role>,
    user_roles: HashMap<String, (BTreeSet<RoleId>, DateTime<Utc>)>,
}

impl TenantCatalog {
    fn permission(&self, permission_id: PermissionId) -> AppResult<&Permission> {
        self.permissions
            .get(&permission_id)
            .ok_or_else(|| missing("permission", permission_id))
    }

    fn group_mut(&mut self, group_id: PermissionGroupId) -> AppResult<&mut PermissionGroup> {
        self.groups
            .get_mut(&group_id)
            .ok_or_else(|| missing("permission group", group_id))
    }

    fn access_point_mut(
        &mut self,
        access_point_id: AccessPointId,
    ) -> AppResult<&mut AccessPoint> {
        self.access_points
            .get_mut(&access_point_id)
            .ok_or_else(|| missing("access point", access_point_id))
    }

    fn unknown_permissions<'a>(
        &self,
        permissions: impl IntoIterator<Item = &'a PermissionId>,
    ) -> BTreeSet<PermissionId> {
        permissions
            .into_iter()
            .filter(|permission_id| !self.permissions.contains_key(permission_id))
            .copied()
            .collect()
    }

    fn ensure_grants_exist(&self, grants: &BTreeSet<RoleGrant>) -> AppResult<()> {
        for grant in grants {
            match grant {
                RoleGrant::Permission(permission_id) => {
                    self.permission(*permission_id)?;
                }
                RoleGrant::Group(group_id) if !self.groups.contains_key(group_id) => {
                    return Err(missing("permission group", group_id));
                }
                RoleGrant::Group(_) => {}
            }
        }
        Ok(())
    }
}

/// In-memory catalog store.
///
/// All tenants share one lock, so every mutation (cascades included) is
/// applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryCatalogRepository {
    catalogs: RwLock<HashMap<TenantId, TenantCatalog>>,
    membership_write_mode: MembershipWriteMode,
}

impl InMemoryCatalogRepository {
    /// Creates an empty repository in lenient membership mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how already-present ids in an add batch are treated.
    #[must_use]
    pub fn with_membership_write_mode(mut self, mode: MembershipWriteMode) -> Self {
        self.membership_write_mode = mode;
        self
    }

    /// Returns the configured membership write mode.
    #[must_use]
    pub fn membership_write_mode(&self) -> MembershipWriteMode {
        self.membership_write_mode
    }

    async fn read<T>(&self, tenant_id: TenantId, view: impl FnOnce(&TenantCatalog) -> T) -> T {
        let catalogs = self.catalogs.read().await;
        match catalogs.get(&tenant_id) {
            Some(catalog) => view(catalog),
            None => view(&TenantCatalog::default()),
        }
    }

    async fn write<T>(
        &self,
        tenant_id: TenantId,
        mutate: impl FnOnce(&mut TenantCatalog) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut catalogs = self.catalogs.write().await;
        mutate(catalogs.entry(tenant_id).or_default())
    }
}

fn missing(kind: &str, id: impl Display) -> AppError {
    AppError::NotFound(format!("{kind} '{id}' does not exist"))
}

fn join_ids<T: Display>(ids: impl IntoIterator<Item = T>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
