use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// Incoming payload for permission updates.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-permission-request.ts"
)]
pub struct UpdatePermissionRequest {
    pub description: String,
}

/// API representation of a permission.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: String,
    pub code: String,
    pub description: String,
}

/// Incoming payload for access point creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-access-point-request.ts"
)]
pub struct CreateAccessPointRequest {
    pub endpoint_path: String,
    pub http_method: String,
    pub module: String,
    #[serde(default)]
    pub is_public: bool,
    pub permission_id: Option<String>,
}

/// Incoming payload for access point updates.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-access-point-request.ts"
)]
pub struct UpdateAccessPointRequest {
    pub endpoint_path: String,
    pub http_method: String,
    pub module: String,
    pub is_public: bool,
}

/// Incoming payload for mapping a permission onto an access point.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-access-point-permission-request.ts"
)]
pub struct AssignAccessPointPermissionRequest {
    pub permission_id: String,
}

/// API representation of an access point.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-point-response.ts"
)]
pub struct AccessPointResponse {
    pub access_point_id: String,
    pub endpoint_path: String,
    pub http_method: String,
    pub module: String,
    pub is_public: bool,
    pub permission_id: Option<String>,
}

/// Incoming payload for permission group creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-group-request.ts"
)]
pub struct CreateGroupRequest {
    pub name: String,
}

/// Incoming payload for permission group updates.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-group-request.ts"
)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// API representation of a permission group.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/group-response.ts"
)]
pub struct GroupResponse {
    pub group_id: String,
    pub name: String,
    pub is_active: bool,
    pub permission_ids: Vec<String>,
}

/// Store confirmation of a membership batch.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/membership-change-response.ts"
)]
pub struct MembershipChangeResponse {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub permission_ids: Vec<String>,
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permission_ids: Vec<String>,
    #[serde(default)]
    pub group_ids: Vec<String>,
}

/// Incoming payload for role updates.
///
/// Grants are replaced only when either id list is present.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub permission_ids: Option<Vec<String>>,
    pub group_ids: Option<Vec<String>>,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub permission_ids: Vec<String>,
    pub group_ids: Vec<String>,
}

/// Incoming payload replacing a user's full role set.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/replace-user-roles-request.ts"
)]
pub struct ReplaceUserRolesRequest {
    pub role_ids: Vec<String>,
}

/// API representation of a user's role assignment.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-roles-response.ts"
)]
pub struct UserRolesResponse {
    pub user_id: String,
    pub role_ids: Vec<String>,
    pub updated_at: Option<String>,
}
