use std::sync::Arc;

use sqlx::PgPool;
use turnstile_application::{
    AccessPointRepository, AccessPointService, AssignmentService, AuditRepository,
    CatalogService, MembershipWriteMode, PermissionGroupRepository, PermissionRepository,
    ReadRetryPolicy, RoleAssignmentService, RoleRepository,
};
use turnstile_core::UserIdentity;
use turnstile_infrastructure::{
    InMemoryAuditRepository, InMemoryCatalogRepository, PostgresAuditRepository,
    PostgresCatalogRepository,
};

use crate::middleware::ApiCredential;
use crate::state::AppState;

/// Port implementations backing the catalog services.
#[derive(Clone)]
pub struct CatalogRepositories {
    pub permissions: Arc<dyn PermissionRepository>,
    pub access_points: Arc<dyn AccessPointRepository>,
    pub groups: Arc<dyn PermissionGroupRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl CatalogRepositories {
    pub fn in_memory(membership_write_mode: MembershipWriteMode) -> Self {
        let store = Arc::new(
            InMemoryCatalogRepository::new().with_membership_write_mode(membership_write_mode),
        );
        Self {
            permissions: store.clone(),
            access_points: store.clone(),
            groups: store.clone(),
            roles: store,
            audit: Arc::new(InMemoryAuditRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool, membership_write_mode: MembershipWriteMode) -> Self {
        let store = Arc::new(
            PostgresCatalogRepository::new(pool.clone())
                .with_membership_write_mode(membership_write_mode),
        );
        Self {
            permissions: store.clone(),
            access_points: store.clone(),
            groups: store.clone(),
            roles: store,
            audit: Arc::new(PostgresAuditRepository::new(pool)),
        }
    }
}

pub fn build_app_state(
    repositories: CatalogRepositories,
    read_retry: ReadRetryPolicy,
    identity: UserIdentity,
    api_token: &str,
) -> AppState {
    AppState {
        catalog_service: CatalogService::new(
            repositories.permissions.clone(),
            repositories.groups.clone(),
            repositories.roles.clone(),
            repositories.audit.clone(),
        )
        .with_read_retry(read_retry),
        assignment_service: AssignmentService::new(
            repositories.permissions,
            repositories.groups,
            repositories.audit.clone(),
        )
        .with_read_retry(read_retry),
        access_point_service: AccessPointService::new(
            repositories.access_points,
            repositories.audit.clone(),
        )
        .with_read_retry(read_retry),
        role_assignment_service: RoleAssignmentService::new(
            repositories.roles,
            repositories.audit,
        )
        .with_read_retry(read_retry),
        credential: ApiCredential::new(api_token),
        identity,
    }
}
