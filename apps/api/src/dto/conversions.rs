use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::SecondsFormat;
use turnstile_application::{MembershipChange, UserRoleAssignment};
use turnstile_domain::{AccessPoint, Permission, PermissionGroup, Role, RoleGrant};

use super::catalog::{
    AccessPointResponse, GroupResponse, MembershipChangeResponse, PermissionResponse,
    RoleResponse, UserRolesResponse,
};

fn id_strings<T: Display>(ids: &BTreeSet<T>) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            permission_id: value.id().to_string(),
            code: value.code().to_owned(),
            description: value.description().to_owned(),
        }
    }
}

impl From<AccessPoint> for AccessPointResponse {
    fn from(value: AccessPoint) -> Self {
        Self {
            access_point_id: value.id().to_string(),
            endpoint_path: value.endpoint_path().to_owned(),
            http_method: value.http_method().as_str().to_owned(),
            module: value.module().to_owned(),
            is_public: value.is_public(),
            permission_id: value.permission().map(|id| id.to_string()),
        }
    }
}

impl From<PermissionGroup> for GroupResponse {
    fn from(value: PermissionGroup) -> Self {
        Self {
            group_id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            is_active: value.is_active(),
            permission_ids: id_strings(value.members()),
        }
    }
}

impl From<MembershipChange> for MembershipChangeResponse {
    fn from(value: MembershipChange) -> Self {
        Self {
            applied: id_strings(&value.applied),
            skipped: id_strings(&value.skipped),
            permission_ids: id_strings(&value.membership),
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        let mut permission_ids = Vec::new();
        let mut group_ids = Vec::new();
        for grant in value.grants() {
            match grant {
                RoleGrant::Permission(permission_id) => {
                    permission_ids.push(permission_id.to_string());
                }
                RoleGrant::Group(group_id) => group_ids.push(group_id.to_string()),
            }
        }

        Self {
            role_id: value.id().to_string(),
            name: value.name().to_owned(),
            permission_ids,
            group_ids,
        }
    }
}

impl From<UserRoleAssignment> for UserRolesResponse {
    fn from(value: UserRoleAssignment) -> Self {
        Self {
            role_ids: id_strings(&value.role_ids),
            updated_at: value
                .updated_at
                .map(|updated_at| updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            user_id: value.user_id,
        }
    }
}
