use tracing::{debug, info};

use turnstile_core::{AppError, AppResult, UserIdentity};
use turnstile_domain::{
    AuditAction, CatalogQuery, GroupName, Page, PermissionGroup, PermissionGroupId,
};

use super::{CatalogService, not_found};
use crate::{AuditEvent, CreateGroupInput, GROUP_SEARCH_FIELDS, UpdateGroupInput};

impl CatalogService {
    /// Returns one page of permission groups matching the query.
    pub async fn list_groups(
        &self,
        actor: &UserIdentity,
        query: &CatalogQuery,
    ) -> AppResult<Page<PermissionGroup>> {
        let tenant_id = actor.tenant_id();
        let groups = self
            .read_retry
            .run("list_groups", move || self.groups.list_groups(tenant_id))
            .await?;

        debug!(search = query.search(), page = query.page(), "listing groups");
        Ok(query.apply(groups, GROUP_SEARCH_FIELDS))
    }

    /// Returns one permission group.
    pub async fn get_group(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
    ) -> AppResult<PermissionGroup> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("find_group", move || self.groups.find_group(tenant_id, group_id))
            .await?
            .ok_or_else(|| not_found("permission group", group_id, actor))
    }

    /// Creates an active, empty permission group.
    pub async fn create_group(
        &self,
        actor: &UserIdentity,
        input: CreateGroupInput,
    ) -> AppResult<PermissionGroup> {
        let name = GroupName::new(input.name)?;
        let group = self
            .groups
            .create_group(
                actor.tenant_id(),
                PermissionGroup::new(PermissionGroupId::new(), name),
            )
            .await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::GroupCreated,
            "permission_group",
            group.id(),
            format!("created permission group '{}'", group.name().as_str()),
        ))
        .await?;

        info!(group = group.name().as_str(), "permission group created");
        Ok(group)
    }

    /// Renames and/or (de)activates a permission group.
    pub async fn update_group(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        input: UpdateGroupInput,
    ) -> AppResult<PermissionGroup> {
        if input.name.is_none() && input.is_active.is_none() {
            return Err(AppError::Validation(
                "group update requires a name or an active flag".to_owned(),
            ));
        }

        let name = input.name.map(GroupName::new).transpose()?;
        let group = self
            .groups
            .update_group(actor.tenant_id(), group_id, name, input.is_active)
            .await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::GroupUpdated,
            "permission_group",
            group_id,
            format!(
                "updated permission group '{}' (active: {})",
                group.name().as_str(),
                group.is_active()
            ),
        ))
        .await?;

        Ok(group)
    }

    /// Deletes a permission group together with its membership.
    pub async fn delete_group(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
    ) -> AppResult<()> {
        self.groups.delete_group(actor.tenant_id(), group_id).await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::GroupDeleted,
            "permission_group",
            group_id,
            format!("deleted permission group '{group_id}'"),
        ))
        .await?;

        info!(%group_id, "permission group deleted");
        Ok(())
    }
}
