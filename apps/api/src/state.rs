use turnstile_application::{
    AccessPointService, AssignmentService, CatalogService, RoleAssignmentService,
};
use turnstile_core::UserIdentity;

use crate::middleware::ApiCredential;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: CatalogService,
    pub assignment_service: AssignmentService,
    pub access_point_service: AccessPointService,
    pub role_assignment_service: RoleAssignmentService,
    pub credential: ApiCredential,
    pub identity: UserIdentity,
}
