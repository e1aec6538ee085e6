use tracing::{debug, info};

use turnstile_core::{AppResult, UserIdentity};
use turnstile_domain::{AuditAction, CatalogQuery, Page, Permission, PermissionId};

use super::{CatalogService, not_found};
use crate::{AuditEvent, CreatePermissionInput, PERMISSION_SEARCH_FIELDS, UpdatePermissionInput};

impl CatalogService {
    /// Returns one page of permissions matching the query, ordered by code.
    pub async fn list_permissions(
        &self,
        actor: &UserIdentity,
        query: &CatalogQuery,
    ) -> AppResult<Page<Permission>> {
        let permissions = self.all_permissions(actor).await?;
        debug!(
            search = query.search(),
            page = query.page(),
            "listing permissions"
        );
        Ok(query.apply(permissions, PERMISSION_SEARCH_FIELDS))
    }

    /// Returns every permission of the tenant in natural order.
    pub async fn all_permissions(&self, actor: &UserIdentity) -> AppResult<Vec<Permission>> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("list_permissions", move || {
                self.permissions.list_permissions(tenant_id)
            })
            .await
    }

    /// Returns one permission.
    pub async fn get_permission(
        &self,
        actor: &UserIdentity,
        permission_id: PermissionId,
    ) -> AppResult<Permission> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("find_permission", move || {
                self.permissions.find_permission(tenant_id, permission_id)
            })
            .await?
            .ok_or_else(|| not_found("permission", permission_id, actor))
    }

    /// Creates a permission and emits an audit event.
    pub async fn create_permission(
        &self,
        actor: &UserIdentity,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        let permission = Permission::new(PermissionId::new(), input.code, input.description)?;
        let permission = self
            .permissions
            .create_permission(actor.tenant_id(), permission)
            .await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::PermissionCreated,
            "permission",
            permission.id(),
            format!("created permission '{}'", permission.code()),
        ))
        .await?;

        info!(code = permission.code(), "permission created");
        Ok(permission)
    }

    /// Updates a permission description. The code never changes.
    pub async fn update_permission(
        &self,
        actor: &UserIdentity,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        let permission = self
            .permissions
            .update_permission_description(
                actor.tenant_id(),
                permission_id,
                input.description.trim(),
            )
            .await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::PermissionUpdated,
            "permission",
            permission_id,
            format!("updated description of permission '{}'", permission.code()),
        ))
        .await?;

        Ok(permission)
    }

    /// Deletes a permission; the store cascades it out of groups, roles and
    /// access point mappings.
    pub async fn delete_permission(
        &self,
        actor: &UserIdentity,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.permissions
            .delete_permission(actor.tenant_id(), permission_id)
            .await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::PermissionDeleted,
            "permission",
            permission_id,
            format!("deleted permission '{permission_id}'"),
        ))
        .await?;

        info!(%permission_id, "permission deleted");
        Ok(())
    }
}
