use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use turnstile_core::{AppError, AppResult, UserIdentity};
use turnstile_domain::{
    AssignmentSession, AuditAction, Cardinality, CatalogQuery, CommitKind, Page, Permission,
    PermissionGroupId, PermissionId,
};

use crate::{
    AuditEvent, AuditRepository, MembershipChange, PERMISSION_SEARCH_FIELDS,
    PermissionGroupRepository, PermissionRepository, ReadRetryPolicy,
};


/// Commit path for permission group membership.
///
/// Adds and removes are independent batches. A failed batch leaves both the
/// store and the session selection untouched, and batches are never retried
/// automatically. Once the store confirms a batch the call succeeds; a failed
/// audit append is only logged.
#[derive(Clone)]
pub struct AssignmentService {
    permissions: Arc<dyn PermissionRepository>,
    groups: Arc<dyn PermissionGroupRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    read_retry: ReadRetryPolicy,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        groups: Arc<dyn PermissionGroupRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            permissions,
            groups,
            audit_repository,
            read_retry: ReadRetryPolicy::default(),
        }
    }

    /// Replaces the retry policy used for membership reads.
    #[must_use]
    pub fn with_read_retry(mut self, read_retry: ReadRetryPolicy) -> Self {
        self.read_retry = read_retry;
        self
    }

    /// Fetches the authoritative membership of a group.
    pub async fn group_membership(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
    ) -> AppResult<BTreeSet<PermissionId>> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("list_group_permissions", move || {
                self.groups.list_group_permissions(tenant_id, group_id)
            })
            .await
    }

    /// Returns one page of the group's member permissions.
    pub async fn list_group_permissions(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        query: &CatalogQuery,
    ) -> AppResult<Page<Permission>> {
        let membership = self.group_membership(actor, group_id).await?;
        let members = self
            .catalog_permissions(actor)
            .await?
            .into_iter()
            .filter(|permission| membership.contains(&permission.id()))
            .collect();
        Ok(query.apply(members, PERMISSION_SEARCH_FIELDS))
    }

    /// Returns one page of permissions that can still be added to the group.
    pub async fn list_available_permissions(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        query: &CatalogQuery,
    ) -> AppResult<Page<Permission>> {
        let session = self.open_group_session(actor, group_id).await?;
        let permissions = self.catalog_permissions(actor).await?;
        let available =
            session.available(permissions.iter().map(|permission| permission.id()));
        let candidates = permissions
            .into_iter()
            .filter(|permission| available.contains(&permission.id()))
            .collect();
        Ok(query.apply(candidates, PERMISSION_SEARCH_FIELDS))
    }

    /// Opens an edit session against freshly fetched membership.
    pub async fn open_group_session(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
    ) -> AppResult<AssignmentSession<PermissionGroupId>> {
        let current = self.group_membership(actor, group_id).await?;
        Ok(AssignmentSession::open(
            group_id,
            Cardinality::Unbounded,
            current,
        ))
    }

    /// Commits the session's pending additions as one batch.
    pub async fn apply_add(
        &self,
        actor: &UserIdentity,
        session: &mut AssignmentSession<PermissionGroupId>,
    ) -> AppResult<MembershipChange> {
        self.commit(actor, session, CommitKind::Add).await
    }

    /// Commits the session's pending removals as one batch.
    pub async fn apply_remove(
        &self,
        actor: &UserIdentity,
        session: &mut AssignmentSession<PermissionGroupId>,
    ) -> AppResult<MembershipChange> {
        self.commit(actor, session, CommitKind::Remove).await
    }

    /// Adds permissions to a group without an edit session.
    pub async fn add_permissions(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        self.direct_batch(actor, group_id, CommitKind::Add, permissions)
            .await
    }

    /// Removes permissions from a group without an edit session.
    pub async fn remove_permissions(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        self.direct_batch(actor, group_id, CommitKind::Remove, permissions)
            .await
    }

    async fn direct_batch(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        kind: CommitKind,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        if permissions.is_empty() {
            return Err(AppError::Validation(format!(
                "no permissions selected to {}",
                kind.as_str()
            )));
        }

        let change = self.write_batch(actor, group_id, kind, permissions).await?;
        self.record_batch(actor, group_id, kind, &change).await;
        Ok(change)
    }

    async fn commit(
        &self,
        actor: &UserIdentity,
        session: &mut AssignmentSession<PermissionGroupId>,
        kind: CommitKind,
    ) -> AppResult<MembershipChange> {
        let group_id = session.target();
        let batch = session.begin_commit(kind)?;

        match self.write_batch(actor, group_id, kind, &batch).await {
            Ok(change) => {
                session.commit_succeeded(change.membership.clone());
                self.record_batch(actor, group_id, kind, &change).await;
                Ok(change)
            }
            Err(error) => {
                warn!(
                    %group_id,
                    kind = kind.as_str(),
                    batch_size = batch.len(),
                    %error,
                    "group membership commit failed"
                );
                session.commit_failed(error.clone());
                Err(error)
            }
        }
    }

    async fn write_batch(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        kind: CommitKind,
        batch: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        match kind {
            CommitKind::Add => {
                self.groups
                    .add_group_permissions(actor.tenant_id(), group_id, batch)
                    .await
            }
            CommitKind::Remove => {
                self.groups
                    .remove_group_permissions(actor.tenant_id(), group_id, batch)
                    .await
            }
        }
    }

    async fn record_batch(
        &self,
        actor: &UserIdentity,
        group_id: PermissionGroupId,
        kind: CommitKind,
        change: &MembershipChange,
    ) {
        info!(
            %group_id,
            kind = kind.as_str(),
            applied = change.applied.len(),
            skipped = change.skipped.len(),
            "group membership committed"
        );

        let action = match kind {
            CommitKind::Add => AuditAction::GroupPermissionsAdded,
            CommitKind::Remove => AuditAction::GroupPermissionsRemoved,
        };
        let appended = self
            .audit_repository
            .append_event(AuditEvent::new(
                actor,
                action,
                "permission_group",
                group_id,
                format!(
                    "{} {} permissions ({} skipped); group now has {}",
                    kind.as_str(),
                    change.applied.len(),
                    change.skipped.len(),
                    change.membership.len()
                ),
            ))
            .await;

        if let Err(error) = appended {
            warn!(
                %group_id,
                kind = kind.as_str(),
                %error,
                "audit append failed for committed membership batch"
            );
        }
    }

    async fn catalog_permissions(&self, actor: &UserIdentity) -> AppResult<Vec<Permission>> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("list_permissions", move || {
                self.permissions.list_permissions(tenant_id)
            })
            .await
    }
}
