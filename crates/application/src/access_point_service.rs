use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use turnstile_core::{AppError, AppResult, UserIdentity};
use turnstile_domain::{
    AccessPoint, AccessPointId, AssignmentSession, AuditAction, Cardinality, CatalogQuery,
    CommitKind, Page, PermissionId,
};

use crate::catalog_service::not_found;
use crate::{
    ACCESS_POINT_SEARCH_FIELDS, AccessPointRepository, AuditEvent, AuditRepository,
    CreateAccessPointInput, ReadRetryPolicy, UpdateAccessPointInput,
};


/// Application service for access points and their single permission mapping.
#[derive(Clone)]
pub struct AccessPointService {
    access_points: Arc<dyn AccessPointRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    read_retry: ReadRetryPolicy,
}

impl AccessPointService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access_points: Arc<dyn AccessPointRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access_points,
            audit_repository,
            read_retry: ReadRetryPolicy::default(),
        }
    }

    /// Replaces the retry policy used for access point reads.
    #[must_use]
    pub fn with_read_retry(mut self, read_retry: ReadRetryPolicy) -> Self {
        self.read_retry = read_retry;
        self
    }

    /// Returns one page of access points matching the query.
    pub async fn list_access_points(
        &self,
        actor: &UserIdentity,
        query: &CatalogQuery,
    ) -> AppResult<Page<AccessPoint>> {
        let tenant_id = actor.tenant_id();
        let access_points = self
            .read_retry
            .run("list_access_points", move || {
                self.access_points.list_access_points(tenant_id)
            })
            .await?;
        Ok(query.apply(access_points, ACCESS_POINT_SEARCH_FIELDS))
    }

    /// Returns every access point without a mapped permission.
    ///
    /// Always read from the store so a committed mapping is reflected at once.
    pub async fn unmapped_access_points(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<AccessPoint>> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("list_unmapped_access_points", move || {
                self.access_points.list_unmapped_access_points(tenant_id)
            })
            .await
    }

    /// Returns one page of unmapped access points matching the query.
    pub async fn list_unmapped(
        &self,
        actor: &UserIdentity,
        query: &CatalogQuery,
    ) -> AppResult<Page<AccessPoint>> {
        let unmapped = self.unmapped_access_points(actor).await?;
        Ok(query.apply(unmapped, ACCESS_POINT_SEARCH_FIELDS))
    }

    /// Returns one access point.
    pub async fn get_access_point(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
    ) -> AppResult<AccessPoint> {
        let tenant_id = actor.tenant_id();
        self.read_retry
            .run("find_access_point", move || {
                self.access_points
                    .find_access_point(tenant_id, access_point_id)
            })
            .await?
            .ok_or_else(|| not_found("access point", access_point_id, actor))
    }

    /// Creates an access point, optionally already mapped.
    pub async fn create_access_point(
        &self,
        actor: &UserIdentity,
        input: CreateAccessPointInput,
    ) -> AppResult<AccessPoint> {
        let access_point = AccessPoint::new(
            AccessPointId::new(),
            input.endpoint_path,
            input.http_method,
            input.module,
            input.is_public,
        )?
        .with_permission(input.permission_id);

        let access_point = self
            .access_points
            .create_access_point(actor.tenant_id(), access_point)
            .await?;

        self.record(
            actor,
            AuditAction::AccessPointCreated,
            &access_point,
            format!("created access point {}", describe(&access_point)),
        )
        .await?;

        info!(
            endpoint = access_point.endpoint_path(),
            method = access_point.http_method().as_str(),
            "access point created"
        );
        Ok(access_point)
    }

    /// Updates path, method, module and visibility. The mapping is kept.
    pub async fn update_access_point(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
        input: UpdateAccessPointInput,
    ) -> AppResult<AccessPoint> {
        let access_point = AccessPoint::new(
            access_point_id,
            input.endpoint_path,
            input.http_method,
            input.module,
            input.is_public,
        )?;

        let access_point = self
            .access_points
            .update_access_point(actor.tenant_id(), access_point)
            .await?;

        self.record(
            actor,
            AuditAction::AccessPointUpdated,
            &access_point,
            format!("updated access point {}", describe(&access_point)),
        )
        .await?;

        Ok(access_point)
    }

    /// Deletes an access point, removing it from both mapped and unmapped views.
    pub async fn delete_access_point(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
    ) -> AppResult<()> {
        self.access_points
            .delete_access_point(actor.tenant_id(), access_point_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent::new(
                actor,
                AuditAction::AccessPointDeleted,
                "access_point",
                access_point_id,
                format!("deleted access point '{access_point_id}'"),
            ))
            .await?;

        info!(%access_point_id, "access point deleted");
        Ok(())
    }

    /// Maps a permission onto an access point, replacing any existing mapping.
    pub async fn assign(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
        permission_id: PermissionId,
    ) -> AppResult<AccessPoint> {
        let access_point = self
            .write_mapping(actor, access_point_id, Some(permission_id))
            .await?;
        self.record_mapping(actor, &access_point).await;
        Ok(access_point)
    }

    /// Clears the permission mapping of an access point.
    pub async fn unassign(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
    ) -> AppResult<AccessPoint> {
        let access_point = self.write_mapping(actor, access_point_id, None).await?;
        self.record_mapping(actor, &access_point).await;
        Ok(access_point)
    }

    /// Opens a cardinality-one edit session for an access point mapping.
    pub async fn open_mapping_session(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
    ) -> AppResult<AssignmentSession<AccessPointId>> {
        let access_point = self.get_access_point(actor, access_point_id).await?;
        Ok(AssignmentSession::open(
            access_point_id,
            Cardinality::AtMostOne,
            mapping_of(&access_point),
        ))
    }

    /// Commits a mapping session: `Add` maps the selected permission, `Remove`
    /// clears the current one.
    ///
    /// The session adopts the stored mapping as soon as the store confirms it.
    pub async fn commit_mapping(
        &self,
        actor: &UserIdentity,
        session: &mut AssignmentSession<AccessPointId>,
        kind: CommitKind,
    ) -> AppResult<AccessPoint> {
        let access_point_id = session.target();
        let batch = session.begin_commit(kind)?;

        let result = match (kind, batch.first()) {
            (CommitKind::Add, Some(permission_id)) => {
                self.write_mapping(actor, access_point_id, Some(*permission_id))
                    .await
            }
            (CommitKind::Remove, Some(_)) => self.write_mapping(actor, access_point_id, None).await,
            (_, None) => Err(AppError::Validation(
                "no permission selected for the access point".to_owned(),
            )),
        };

        match result {
            Ok(access_point) => {
                session.commit_succeeded(mapping_of(&access_point));
                self.record_mapping(actor, &access_point).await;
                Ok(access_point)
            }
            Err(error) => {
                warn!(%access_point_id, kind = kind.as_str(), %error, "mapping commit failed");
                session.commit_failed(error.clone());
                Err(error)
            }
        }
    }

    async fn write_mapping(
        &self,
        actor: &UserIdentity,
        access_point_id: AccessPointId,
        permission_id: Option<PermissionId>,
    ) -> AppResult<AccessPoint> {
        match permission_id {
            Some(permission_id) => {
                self.access_points
                    .assign_permission(actor.tenant_id(), access_point_id, permission_id)
                    .await
            }
            None => {
                self.access_points
                    .clear_permission(actor.tenant_id(), access_point_id)
                    .await
            }
        }
    }

    /// Audits a mapping the store already confirmed; append failures are logged.
    async fn record_mapping(&self, actor: &UserIdentity, access_point: &AccessPoint) {
        let access_point_id = access_point.id();
        let (action, detail) = match access_point.permission() {
            Some(permission_id) => (
                AuditAction::AccessPointMapped,
                format!(
                    "mapped permission '{permission_id}' to {}",
                    describe(access_point)
                ),
            ),
            None => (
                AuditAction::AccessPointUnmapped,
                format!("cleared mapping of {}", describe(access_point)),
            ),
        };

        info!(%access_point_id, action = action.as_str(), "access point mapping committed");
        if let Err(error) = self.record(actor, action, access_point, detail).await {
            warn!(%access_point_id, %error, "audit append failed for committed mapping");
        }
    }

    async fn record(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        access_point: &AccessPoint,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent::new(
                actor,
                action,
                "access_point",
                access_point.id(),
                detail,
            ))
            .await
    }
}

fn describe(access_point: &AccessPoint) -> String {
    format!(
        "{} {}",
        access_point.http_method().as_str(),
        access_point.endpoint_path()
    )
}

fn mapping_of(access_point: &AccessPoint) -> BTreeSet<PermissionId> {
    access_point.permission().into_iter().collect()
}
