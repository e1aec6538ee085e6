use std::sync::Arc;

use turnstile_core::{AppError, AppResult, UserIdentity};

use crate::{
    AuditEvent, AuditRepository, PermissionGroupRepository, PermissionRepository,
    ReadRetryPolicy, RoleRepository,
};

mod groups;
mod permissions;
mod roles;

#[cfg(test)]
mod tests;

/// Application service for permission, group and role catalog maintenance.
#[derive(Clone)]
pub struct CatalogService {
    permissions: Arc<dyn PermissionRepository>,
    groups: Arc<dyn PermissionGroupRepository>,
    roles: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    read_retry: ReadRetryPolicy,
}

impl CatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        groups: Arc<dyn PermissionGroupRepository>,
        roles: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            permissions,
            groups,
            roles,
            audit_repository,
            read_retry: ReadRetryPolicy::default(),
        }
    }

    /// Replaces the retry policy used for catalog reads.
    #[must_use]
    pub fn with_read_retry(mut self, read_retry: ReadRetryPolicy) -> Self {
        self.read_retry = read_retry;
        self
    }

    async fn record(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_repository.append_event(event).await
    }
}

pub(crate) fn not_found(kind: &str, id: impl std::fmt::Display, actor: &UserIdentity) -> AppError {
    AppError::NotFound(format!(
        "{kind} '{id}' does not exist for tenant '{}'",
        actor.tenant_id()
    ))
}
