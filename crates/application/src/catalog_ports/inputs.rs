use std::collections::BTreeSet;

use turnstile_domain::{HttpMethod, PermissionId, RoleGrant};

/// Input payload for permission creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Unique capability code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
}

/// Input payload for permission updates. The code is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePermissionInput {
    /// Replacement description.
    pub description: String,
}

/// Input payload for access point creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccessPointInput {
    /// Protected endpoint path.
    pub endpoint_path: String,
    /// Protected HTTP method.
    pub http_method: HttpMethod,
    /// Owning module label.
    pub module: String,
    /// Whether the endpoint is public.
    pub is_public: bool,
    /// Optional initial permission mapping.
    pub permission_id: Option<PermissionId>,
}

/// Input payload for access point updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAccessPointInput {
    /// Protected endpoint path.
    pub endpoint_path: String,
    /// Protected HTTP method.
    pub http_method: HttpMethod,
    /// Owning module label.
    pub module: String,
    /// Whether the endpoint is public.
    pub is_public: bool,
}

/// Input payload for permission group creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupInput {
    /// Group name.
    pub name: String,
}

/// Input payload for permission group updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateGroupInput {
    /// Replacement name, when renaming.
    pub name: Option<String>,
    /// Replacement active flag.
    pub is_active: Option<bool>,
}

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Grants attached to the role.
    pub grants: BTreeSet<RoleGrant>,
}

/// Input payload for role updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement grant set.
    pub grants: Option<BTreeSet<RoleGrant>>,
}
