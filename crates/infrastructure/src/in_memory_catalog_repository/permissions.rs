use async_trait::async_trait;

use turnstile_application::PermissionRepository;

use super::*;

#[async_trait]
impl PermissionRepository for InMemoryCatalogRepository {
    async fn list_permissions(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        Ok(self
            .read(tenant_id, |catalog| {
                let mut permissions: Vec<Permission> =
                    catalog.permissions.values().cloned().collect();
                permissions.sort_by(|left, right| left.code().cmp(right.code()));
                permissions
            })
            .await)
    }

    async fn find_permission(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .read(tenant_id, |catalog| {
                catalog.permissions.get(&permission_id).cloned()
            })
            .await)
    }

    async fn create_permission(
        &self,
        tenant_id: TenantId,
        permission: Permission,
    ) -> AppResult<Permission> {
        self.write(tenant_id, |catalog| {
            if catalog
                .permissions
                .values()
                .any(|existing| existing.code() == permission.code())
            {
                return Err(AppError::Conflict(format!(
                    "permission code '{}' already exists for tenant '{tenant_id}'",
                    permission.code()
                )));
            }

            catalog
                .permissions
                .insert(permission.id(), permission.clone());
            Ok(permission)
        })
        .await
    }

    async fn update_permission_description(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission> {
        self.write(tenant_id, |catalog| {
            let permission = catalog
                .permissions
                .get_mut(&permission_id)
                .ok_or_else(|| missing("permission", permission_id))?;
            permission.set_description(description);
            Ok(permission.clone())
        })
        .await
    }

    async fn delete_permission(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.write(tenant_id, |catalog| {
            catalog
                .permissions
                .remove(&permission_id)
                .ok_or_else(|| missing("permission", permission_id))?;

            for group in catalog.groups.values_mut() {
                group.remove_members([permission_id]);
            }
            for access_point in catalog.access_points.values_mut() {
                if access_point.permission() == Some(permission_id) {
                    access_point.clear_permission();
                }
            }
            for role in catalog.roles.values_mut() {
                role.drop_grants(|grant| *grant == RoleGrant::Permission(permission_id));
            }
            Ok(())
        })
        .await
    }
}
