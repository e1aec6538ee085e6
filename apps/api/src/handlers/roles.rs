use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;
use turnstile_application::{CreateRoleInput, UpdateRoleInput};
use turnstile_core::{AppResult, UserIdentity};
use turnstile_domain::{EntityKind, PermissionGroupId, PermissionId, RoleGrant, RoleId};

use super::{create_payload, parse_id, parse_id_set};
use crate::dto::{CreateRoleRequest, PageQuery, PageResponse, RoleResponse, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<RoleResponse>>> {
    let page = state
        .catalog_service
        .list_roles(&user, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id: RoleId = parse_id(role_id.as_str())?;
    let role = state.catalog_service.get_role(&user, role_id).await?;

    Ok(Json(role.into()))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let payload: CreateRoleRequest = create_payload(EntityKind::Role, payload)?;
    let grants = role_grants(&payload.permission_ids, &payload.group_ids)?;
    let role = state
        .catalog_service
        .create_role(
            &user,
            CreateRoleInput {
                name: payload.name,
                grants,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(role.into())))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id: RoleId = parse_id(role_id.as_str())?;
    let grants = match (&payload.permission_ids, &payload.group_ids) {
        (None, None) => None,
        (permission_ids, group_ids) => Some(role_grants(
            permission_ids.as_deref().unwrap_or_default(),
            group_ids.as_deref().unwrap_or_default(),
        )?),
    };

    let role = state
        .catalog_service
        .update_role(
            &user,
            role_id,
            UpdateRoleInput {
                name: payload.name,
                grants,
            },
        )
        .await?;

    Ok(Json(role.into()))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let role_id: RoleId = parse_id(role_id.as_str())?;
    state.catalog_service.delete_role(&user, role_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn role_grants(
    permission_ids: &[String],
    group_ids: &[String],
) -> AppResult<BTreeSet<RoleGrant>> {
    let permissions: BTreeSet<PermissionId> = parse_id_set(permission_ids)?;
    let groups: BTreeSet<PermissionGroupId> = parse_id_set(group_ids)?;

    Ok(permissions
        .into_iter()
        .map(RoleGrant::Permission)
        .chain(groups.into_iter().map(RoleGrant::Group))
        .collect())
}
