use async_trait::async_trait;

use turnstile_application::{RoleRepository, UserRoleAssignment};

use super::*;

fn ensure_role_name_free(catalog: &TenantCatalog, role: &Role) -> AppResult<()> {
    if catalog
        .roles
        .values()
        .any(|existing| existing.id() != role.id() && existing.name() == role.name())
    {
        return Err(AppError::Conflict(format!(
            "role '{}' already exists",
            role.name()
        )));
    }
    Ok(())
}

#[async_trait]
impl RoleRepository for InMemoryCatalogRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        Ok(self
            .read(tenant_id, |catalog| {
                let mut roles: Vec<Role> = catalog.roles.values().cloned().collect();
                roles.sort_by(|left, right| left.name().cmp(right.name()));
                roles
            })
            .await)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .read(tenant_id, |catalog| catalog.roles.get(&role_id).cloned())
            .await)
    }

    async fn create_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role> {
        self.write(tenant_id, |catalog| {
            ensure_role_name_free(catalog, &role)?;
            catalog.ensure_grants_exist(role.grants())?;
            catalog.roles.insert(role.id(), role.clone());
            Ok(role)
        })
        .await
    }

    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role> {
        self.write(tenant_id, |catalog| {
            if !catalog.roles.contains_key(&role.id()) {
                return Err(missing("role", role.id()));
            }
            ensure_role_name_free(catalog, &role)?;
            catalog.ensure_grants_exist(role.grants())?;
            catalog.roles.insert(role.id(), role.clone());
            Ok(role)
        })
        .await
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        self.write(tenant_id, |catalog| {
            catalog
                .roles
                .remove(&role_id)
                .ok_or_else(|| missing("role", role_id))?;

            for (role_ids, _) in catalog.user_roles.values_mut() {
                role_ids.remove(&role_id);
            }
            Ok(())
        })
        .await
    }

    async fn user_roles(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        Ok(self
            .read(tenant_id, |catalog| {
                let stored = catalog.user_roles.get(user_id);
                UserRoleAssignment {
                    user_id: user_id.to_owned(),
                    role_ids: stored.map(|(role_ids, _)| role_ids.clone()).unwrap_or_default(),
                    updated_at: stored.map(|(_, updated_at)| *updated_at),
                }
            })
            .await)
    }

    async fn replace_user_roles(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        role_ids: &BTreeSet<RoleId>,
    ) -> AppResult<UserRoleAssignment> {
        self.write(tenant_id, |catalog| {
            let unknown: Vec<RoleId> = role_ids
                .iter()
                .filter(|role_id| !catalog.roles.contains_key(role_id))
                .copied()
                .collect();
            if !unknown.is_empty() {
                return Err(AppError::NotFound(format!(
                    "unknown roles: {}",
                    join_ids(unknown)
                )));
            }

            let updated_at = Utc::now();
            catalog
                .user_roles
                .insert(user_id.to_owned(), (role_ids.clone(), updated_at));
            Ok(UserRoleAssignment {
                user_id: user_id.to_owned(),
                role_ids: role_ids.clone(),
                updated_at: Some(updated_at),
            })
        })
        .await
    }
}
