use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use turnstile_application::MembershipWriteMode;
use turnstile_core::{AppError, AppResult, TenantId};
use turnstile_domain::{
    AccessPoint, AccessPointId, GroupName, HttpMethod, Permission, PermissionGroup,
    PermissionGroupId, PermissionId, Role, RoleGrant, RoleId,
};

use crate::sqlx_errors::map_sqlx_error;

mod access_points;
mod groups;
mod permissions;
mod roles;


/// PostgreSQL-backed catalog store.
///
/// Membership batches run in one transaction with the group row locked, so
/// concurrent batches against the same group are serialized.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
    membership_write_mode: MembershipWriteMode,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            membership_write_mode: MembershipWriteMode::default(),
        }
    }

    /// Sets how already-present ids in an add batch are treated.
    #[must_use]
    pub fn with_membership_write_mode(mut self, mode: MembershipWriteMode) -> Self {
        self.membership_write_mode = mode;
        self
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error(error, "begin transaction"))
    }
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| map_sqlx_error(error, "commit transaction"))
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    code: String,
    description: String,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> AppResult<Self> {
        Permission::new(PermissionId::from_uuid(row.id), row.code, row.description)
    }
}

#[derive(Debug, FromRow)]
struct AccessPointRow {
    id: Uuid,
    endpoint_path: String,
    http_method: String,
    module: String,
    is_public: bool,
    permission_id: Option<Uuid>,
}

impl TryFrom<AccessPointRow> for AccessPoint {
    type Error = AppError;

    fn try_from(row: AccessPointRow) -> AppResult<Self> {
        Ok(AccessPoint::new(
            AccessPointId::from_uuid(row.id),
            row.endpoint_path,
            HttpMethod::from_str(row.http_method.as_str())?,
            row.module,
            row.is_public,
        )?
        .with_permission(row.permission_id.map(PermissionId::from_uuid)))
    }
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct MemberRow {
    group_id: Uuid,
    permission_id: Uuid,
}

fn build_group(row: GroupRow, members: BTreeSet<PermissionId>) -> AppResult<PermissionGroup> {
    Ok(PermissionGroup::from_parts(
        PermissionGroupId::from_uuid(row.id),
        GroupName::new(row.name)?,
        row.is_active,
        members,
    ))
}

fn group_members(rows: Vec<MemberRow>) -> HashMap<Uuid, BTreeSet<PermissionId>> {
    let mut members: HashMap<Uuid, BTreeSet<PermissionId>> = HashMap::new();
    for row in rows {
        members
            .entry(row.group_id)
            .or_default()
            .insert(PermissionId::from_uuid(row.permission_id));
    }
    members
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role_id: Uuid,
    permission_id: Option<Uuid>,
    group_id: Option<Uuid>,
}

fn role_grants(rows: Vec<RoleGrantRow>) -> HashMap<Uuid, BTreeSet<RoleGrant>> {
    let mut grants: HashMap<Uuid, BTreeSet<RoleGrant>> = HashMap::new();
    for row in rows {
        let grant = match (row.permission_id, row.group_id) {
            (Some(permission_id), _) => {
                RoleGrant::Permission(PermissionId::from_uuid(permission_id))
            }
            (None, Some(group_id)) => RoleGrant::Group(PermissionGroupId::from_uuid(group_id)),
            (None, None) => continue,
        };
        grants.entry(row.role_id).or_default().insert(grant);
    }
    grants
}

fn build_role(row: RoleRow, grants: BTreeSet<RoleGrant>) -> AppResult<Role> {
    Role::new(RoleId::from_uuid(row.id), row.name, grants)
}

fn join_ids<T: std::fmt::Display>(ids: impl IntoIterator<Item = T>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn missing(kind: &str, id: impl std::fmt::Display, tenant_id: TenantId) -> AppError {
    AppError::NotFound(format!(
        "{kind} '{id}' does not exist for tenant '{tenant_id}'"
    ))
}
