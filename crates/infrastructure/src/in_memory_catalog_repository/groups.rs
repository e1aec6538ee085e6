use async_trait::async_trait;

use turnstile_application::{MembershipChange, PermissionGroupRepository};
use turnstile_domain::GroupName;

use super::*;

fn ensure_name_free(
    catalog: &TenantCatalog,
    group_id: PermissionGroupId,
    name: &GroupName,
) -> AppResult<()> {
    if catalog
        .groups
        .values()
        .any(|existing| existing.id() != group_id && existing.name() == name)
    {
        return Err(AppError::Conflict(format!(
            "permission group '{}' already exists",
            name.as_str()
        )));
    }
    Ok(())
}

#[async_trait]
impl PermissionGroupRepository for InMemoryCatalogRepository {
    async fn list_groups(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionGroup>> {
        Ok(self
            .read(tenant_id, |catalog| {
                let mut groups: Vec<PermissionGroup> = catalog.groups.values().cloned().collect();
                groups.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
                groups
            })
            .await)
    }

    async fn find_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<Option<PermissionGroup>> {
        Ok(self
            .read(tenant_id, |catalog| catalog.groups.get(&group_id).cloned())
            .await)
    }

    async fn create_group(
        &self,
        tenant_id: TenantId,
        group: PermissionGroup,
    ) -> AppResult<PermissionGroup> {
        self.write(tenant_id, |catalog| {
            ensure_name_free(catalog, group.id(), group.name())?;
            let unknown = catalog.unknown_permissions(group.members());
            if !unknown.is_empty() {
                return Err(AppError::NotFound(format!(
                    "unknown permissions: {}",
                    join_ids(unknown)
                )));
            }

            catalog.groups.insert(group.id(), group.clone());
            Ok(group)
        })
        .await
    }

    async fn update_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        name: Option<GroupName>,
        is_active: Option<bool>,
    ) -> AppResult<PermissionGroup> {
        self.write(tenant_id, |catalog| {
            if let Some(name) = &name {
                ensure_name_free(catalog, group_id, name)?;
            }

            let group = catalog.group_mut(group_id)?;
            if let Some(name) = name {
                group.rename(name);
            }
            if let Some(is_active) = is_active {
                group.set_active(is_active);
            }
            Ok(group.clone())
        })
        .await
    }

    async fn delete_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<()> {
        self.write(tenant_id, |catalog| {
            catalog
                .groups
                .remove(&group_id)
                .ok_or_else(|| missing("permission group", group_id))?;

            for role in catalog.roles.values_mut() {
                role.drop_grants(|grant| *grant == RoleGrant::Group(group_id));
            }
            Ok(())
        })
        .await
    }

    async fn list_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<BTreeSet<PermissionId>> {
        self.read(tenant_id, |catalog| {
            catalog
                .groups
                .get(&group_id)
                .map(|group| group.members().clone())
                .ok_or_else(|| missing("permission group", group_id))
        })
        .await
    }

    async fn add_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        let mode = self.membership_write_mode;
        self.write(tenant_id, |catalog| {
            let unknown = catalog.unknown_permissions(permissions);
            let group = catalog.group_mut(group_id)?;
            if !unknown.is_empty() {
                return Err(AppError::NotFound(format!(
                    "unknown permissions: {}",
                    join_ids(unknown)
                )));
            }

            let present: BTreeSet<PermissionId> = permissions
                .intersection(group.members())
                .copied()
                .collect();
            if mode == MembershipWriteMode::Strict && !present.is_empty() {
                return Err(AppError::Conflict(format!(
                    "permissions already in group '{}': {}",
                    group.name().as_str(),
                    join_ids(present)
                )));
            }

            let applied = group.add_members(permissions.iter().copied());
            Ok(MembershipChange {
                applied: applied.into_iter().collect(),
                skipped: present,
                membership: group.members().clone(),
            })
        })
        .await
    }

    async fn remove_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        self.write(tenant_id, |catalog| {
            let group = catalog.group_mut(group_id)?;
            let absent: Vec<PermissionId> =
                permissions.difference(group.members()).copied().collect();
            if !absent.is_empty() {
                return Err(AppError::NotFound(format!(
                    "permissions not in group '{}': {}",
                    group.name().as_str(),
                    join_ids(absent)
                )));
            }

            let applied = group.remove_members(permissions.iter().copied());
            Ok(MembershipChange {
                applied: applied.into_iter().collect(),
                skipped: BTreeSet::new(),
                membership: group.members().clone(),
            })
        })
        .await
    }
}
