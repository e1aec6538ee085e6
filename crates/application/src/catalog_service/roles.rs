use turnstile_core::{AppError, AppResult, UserIdentity};
use turnstile_domain::{AuditAction, CatalogQuery, Page, Role, RoleId};

use super::{CatalogService, not_found};
use crate::{AuditEvent, CreateRoleInput, ROLE_SEARCH_FIELDS, UpdateRoleInput};

impl CatalogService {
    /// Returns one page of roles matching the query.
    pub async fn list_roles(
        &self,
        actor: &UserIdentity,
        query: &CatalogQuery,
    ) -> AppResult<Page<Role>> {
        let tenant_id = actor.tenant_id();
        let roles = self
            .read_retry
            .run("list_roles", move || self.roles.list_roles(tenant_id))
            .await?;

        Ok(query.apply(roles, ROLE_SEARCH_FIELDS))
    }

    /// Returns one role.
    pub async fn get_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<Role> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("find_role", move || self.roles.find_role(tenant_id, role_id))
            .await?
            .ok_or_else(|| not_found("role", role_id, actor))
    }

    /// Creates a role and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let role = Role::new(RoleId::new(), input.name, input.grants)?;
        let role = self.roles.create_role(actor.tenant_id(), role).await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::RoleCreated,
            "role",
            role.id(),
            format!(
                "created role '{}' with {} grants",
                role.name(),
                role.grants().len()
            ),
        ))
        .await?;

        Ok(role)
    }

    /// Renames a role and/or replaces its grants.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        if input.name.is_none() && input.grants.is_none() {
            return Err(AppError::Validation(
                "role update requires a name or grants".to_owned(),
            ));
        }

        let mut role = self.get_role(actor, role_id).await?;
        if let Some(name) = input.name {
            role.rename(name)?;
        }
        if let Some(grants) = input.grants {
            role.replace_grants(grants);
        }

        let role = self.roles.update_role(actor.tenant_id(), role).await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::RoleUpdated,
            "role",
            role_id,
            format!("updated role '{}'", role.name()),
        ))
        .await?;

        Ok(role)
    }

    /// Deletes a role and drops it from every user assignment.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        self.roles.delete_role(actor.tenant_id(), role_id).await?;

        self.record(AuditEvent::new(
            actor,
            AuditAction::RoleDeleted,
            "role",
            role_id,
            format!("deleted role '{role_id}'"),
        ))
        .await
    }
}
