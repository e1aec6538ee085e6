mod catalog;
mod common;
mod conversions;

pub use catalog::{
    AccessPointResponse, AssignAccessPointPermissionRequest, CreateAccessPointRequest,
    CreateGroupRequest, CreatePermissionRequest, CreateRoleRequest, GroupResponse,
    MembershipChangeResponse, PermissionResponse, ReplaceUserRolesRequest, RoleResponse,
    UpdateAccessPointRequest, UpdateGroupRequest, UpdatePermissionRequest, UpdateRoleRequest,
    UserRolesResponse,
};
pub use common::{HealthResponse, PageQuery, PageResponse};
