mod audit;
mod inputs;
mod membership;
mod repositories;

pub use audit::{AuditEvent, AuditRepository};
pub use inputs::{
    CreateAccessPointInput, CreateGroupInput, CreatePermissionInput, CreateRoleInput,
    UpdateAccessPointInput, UpdateGroupInput, UpdatePermissionInput, UpdateRoleInput,
};
pub use membership::{MembershipChange, MembershipWriteMode, UserRoleAssignment};
pub use repositories::{
    AccessPointRepository, PermissionGroupRepository, PermissionRepository, RoleRepository,
};
