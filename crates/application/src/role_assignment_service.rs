use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use turnstile_core::{AppError, AppResult, UserIdentity};
use turnstile_domain::{AuditAction, Role, RoleId, RoleWorkingSet};

use crate::{AuditEvent, AuditRepository, ReadRetryPolicy, RoleRepository, UserRoleAssignment};

/// Application service replacing a user's role set as a whole.
///
/// Unlike group membership, the caller always sends the full desired set.
#[derive(Clone)]
pub struct RoleAssignmentService {
    roles: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    read_retry: ReadRetryPolicy,
}

impl RoleAssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(roles: Arc<dyn RoleRepository>, audit_repository: Arc<dyn AuditRepository>) -> Self {
        Self {
            roles,
            audit_repository,
            read_retry: ReadRetryPolicy::default(),
        }
    }

    /// Replaces the retry policy used for role reads.
    #[must_use]
    pub fn with_read_retry(mut self, read_retry: ReadRetryPolicy) -> Self {
        self.read_retry = read_retry;
        self
    }

    /// Returns the current role assignment of a user.
    pub async fn user_assignment(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let user_id = validate_user_id(user_id)?;
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("user_roles", move || self.roles.user_roles(tenant_id, user_id))
            .await
    }

    /// Returns the roles assigned to a user; empty when none.
    pub async fn assigned_roles(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<BTreeSet<RoleId>> {
        Ok(self.user_assignment(actor, user_id).await?.role_ids)
    }

    /// Returns every role of the tenant ordered by name.
    pub async fn all_roles(&self, actor: &UserIdentity) -> AppResult<Vec<Role>> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("list_roles", move || self.roles.list_roles(tenant_id))
            .await
    }

    /// Starts a working set from the user's assigned roles.
    pub async fn open_working_set(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<RoleWorkingSet> {
        Ok(RoleWorkingSet::new(
            self.assigned_roles(actor, user_id).await?,
        ))
    }

    /// Sends the working set as the user's full role set.
    ///
    /// On success the working set adopts the confirmed assignment; on failure
    /// it is left as it was.
    pub async fn commit(
        &self,
        actor: &UserIdentity,
        user_id: &str,
        working_set: &mut RoleWorkingSet,
    ) -> AppResult<UserRoleAssignment> {
        let assignment = self
            .replace_roles(actor, user_id, working_set.selected())
            .await?;
        working_set.reset(assignment.role_ids.clone());
        Ok(assignment)
    }

    /// Replaces the user's roles with `role_ids` and emits an audit event.
    pub async fn replace_roles(
        &self,
        actor: &UserIdentity,
        user_id: &str,
        role_ids: &BTreeSet<RoleId>,
    ) -> AppResult<UserRoleAssignment> {
        let user_id = validate_user_id(user_id)?;
        let assignment = self
            .roles
            .replace_user_roles(actor.tenant_id(), user_id, role_ids)
            .await?;

        self.audit_repository
            .append_event(AuditEvent::new(
                actor,
                AuditAction::UserRolesReplaced,
                "user_roles",
                user_id,
                format!(
                    "replaced roles of '{user_id}' with {} roles",
                    assignment.role_ids.len()
                ),
            ))
            .await?;

        info!(user_id, roles = assignment.role_ids.len(), "user roles replaced");
        Ok(assignment)
    }
}

fn validate_user_id(user_id: &str) -> AppResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("user id must not be empty".to_owned()));
    }
    Ok(user_id)
}
