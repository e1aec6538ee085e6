use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;
use turnstile_application::{CreatePermissionInput, UpdatePermissionInput};
use turnstile_core::UserIdentity;
use turnstile_domain::{EntityKind, PermissionId};

use super::{create_payload, parse_id};
use crate::dto::{
    CreatePermissionRequest, PageQuery, PageResponse, PermissionResponse,
    UpdatePermissionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<PermissionResponse>>> {
    let page = state
        .catalog_service
        .list_permissions(&user, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn get_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<String>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission_id: PermissionId = parse_id(permission_id.as_str())?;
    let permission = state
        .catalog_service
        .get_permission(&user, permission_id)
        .await?;

    Ok(Json(permission.into()))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let payload: CreatePermissionRequest = create_payload(EntityKind::Permission, payload)?;
    let permission = state
        .catalog_service
        .create_permission(
            &user,
            CreatePermissionInput {
                code: payload.code,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(permission.into())))
}

pub async fn update_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<String>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission_id: PermissionId = parse_id(permission_id.as_str())?;
    let permission = state
        .catalog_service
        .update_permission(
            &user,
            permission_id,
            UpdatePermissionInput {
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(permission.into()))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<String>,
) -> ApiResult<StatusCode> {
    let permission_id: PermissionId = parse_id(permission_id.as_str())?;
    state
        .catalog_service
        .delete_permission(&user, permission_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
