use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;
use turnstile_application::{CreateGroupInput, UpdateGroupInput};
use turnstile_core::{AppError, AppResult, UserIdentity};
use turnstile_domain::{EntityKind, PermissionGroupId, PermissionId};

use super::{create_payload, parse_id, parse_id_set};
use crate::dto::{
    CreateGroupRequest, GroupResponse, MembershipChangeResponse, PageQuery, PageResponse,
    PermissionResponse, UpdateGroupRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_groups_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<GroupResponse>>> {
    let page = state
        .catalog_service
        .list_groups(&user, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn get_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<GroupResponse>> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    let group = state.catalog_service.get_group(&user, group_id).await?;

    Ok(Json(group.into()))
}

pub async fn create_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let payload: CreateGroupRequest = create_payload(EntityKind::PermissionGroup, payload)?;
    let group = state
        .catalog_service
        .create_group(&user, CreateGroupInput { name: payload.name })
        .await?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

pub async fn update_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Json(payload): Json<UpdateGroupRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    let group = state
        .catalog_service
        .update_group(
            &user,
            group_id,
            UpdateGroupInput {
                name: payload.name,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(group.into()))
}

pub async fn delete_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<StatusCode> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    state.catalog_service.delete_group(&user, group_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_group_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<PermissionResponse>>> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    let page = state
        .assignment_service
        .list_group_permissions(&user, group_id, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn list_available_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<PermissionResponse>>> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    let page = state
        .assignment_service
        .list_available_permissions(&user, group_id, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn add_group_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<MembershipChangeResponse>> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    let permissions = batch(payload)?;
    let change = state
        .assignment_service
        .add_permissions(&user, group_id, &permissions)
        .await?;

    Ok(Json(change.into()))
}

pub async fn remove_group_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<MembershipChangeResponse>> {
    let group_id: PermissionGroupId = parse_id(group_id.as_str())?;
    let permissions = batch(payload)?;
    let change = state
        .assignment_service
        .remove_permissions(&user, group_id, &permissions)
        .await?;

    Ok(Json(change.into()))
}

/// Reads a non-empty JSON array of permission ids.
fn batch(payload: Value) -> AppResult<BTreeSet<PermissionId>> {
    let ids: Vec<String> = serde_json::from_value(payload).map_err(|_| {
        AppError::Validation("body must be a JSON array of permission ids".to_owned())
    })?;
    let permissions = parse_id_set(&ids)?;
    if permissions.is_empty() {
        return Err(AppError::Validation(
            "at least one permission id is required".to_owned(),
        ));
    }
    Ok(permissions)
}
