use async_trait::async_trait;

use turnstile_core::{AppResult, TenantId, UserIdentity};
use turnstile_domain::AuditAction;

/// Append-only audit event emitted after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

impl AuditEvent {
    /// Builds an event attributed to `actor`.
    #[must_use]
    pub fn new(
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: impl ToString,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: actor.tenant_id(),
            subject: actor.subject().to_owned(),
            action,
            resource_type: resource_type.to_owned(),
            resource_id: resource_id.to_string(),
            detail: Some(detail.into()),
        }
    }
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
