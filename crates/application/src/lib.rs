//! Application services and ports.

#![forbid(unsafe_code)]

mod access_point_service;
mod assignment_service;
mod catalog_ports;
mod catalog_search;
mod catalog_service;
mod read_retry;
mod role_assignment_service;

#[cfg(test)]
mod test_support;

pub use access_point_service::AccessPointService;
pub use assignment_service::AssignmentService;
pub use catalog_ports::{
    AccessPointRepository, AuditEvent, AuditRepository, CreateAccessPointInput, CreateGroupInput,
    CreatePermissionInput, CreateRoleInput, MembershipChange, MembershipWriteMode,
    PermissionGroupRepository, PermissionRepository, RoleRepository, UpdateAccessPointInput,
    UpdateGroupInput, UpdatePermissionInput, UpdateRoleInput, UserRoleAssignment,
};
pub use catalog_search::{
    ACCESS_POINT_SEARCH_FIELDS, CatalogSearchSession, GROUP_SEARCH_FIELDS,
    PERMISSION_SEARCH_FIELDS, ROLE_SEARCH_FIELDS,
};
pub use catalog_service::CatalogService;
pub use read_retry::ReadRetryPolicy;
pub use role_assignment_service::RoleAssignmentService;
