use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;
use turnstile_application::{CreateAccessPointInput, UpdateAccessPointInput};
use turnstile_core::UserIdentity;
use turnstile_domain::{AccessPointId, EntityKind, HttpMethod, PermissionId};

use super::{create_payload, parse_id};
use crate::dto::{
    AccessPointResponse, AssignAccessPointPermissionRequest, CreateAccessPointRequest,
    PageQuery, PageResponse, UpdateAccessPointRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_access_points_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<AccessPointResponse>>> {
    let page = state
        .access_point_service
        .list_access_points(&user, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn list_unmapped_access_points_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<AccessPointResponse>>> {
    let page = state
        .access_point_service
        .list_unmapped(&user, &query.into())
        .await?;

    Ok(Json(page.into()))
}

pub async fn get_access_point_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(access_point_id): Path<String>,
) -> ApiResult<Json<AccessPointResponse>> {
    let access_point_id: AccessPointId = parse_id(access_point_id.as_str())?;
    let access_point = state
        .access_point_service
        .get_access_point(&user, access_point_id)
        .await?;

    Ok(Json(access_point.into()))
}

pub async fn create_access_point_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<AccessPointResponse>)> {
    let payload: CreateAccessPointRequest = create_payload(EntityKind::AccessPoint, payload)?;
    let permission_id = payload
        .permission_id
        .as_deref()
        .map(parse_id::<PermissionId>)
        .transpose()?;

    let access_point = state
        .access_point_service
        .create_access_point(
            &user,
            CreateAccessPointInput {
                endpoint_path: payload.endpoint_path,
                http_method: HttpMethod::from_transport(payload.http_method.as_str())?,
                module: payload.module,
                is_public: payload.is_public,
                permission_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(access_point.into())))
}

pub async fn update_access_point_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(access_point_id): Path<String>,
    Json(payload): Json<UpdateAccessPointRequest>,
) -> ApiResult<Json<AccessPointResponse>> {
    let access_point_id: AccessPointId = parse_id(access_point_id.as_str())?;
    let access_point = state
        .access_point_service
        .update_access_point(
            &user,
            access_point_id,
            UpdateAccessPointInput {
                endpoint_path: payload.endpoint_path,
                http_method: HttpMethod::from_transport(payload.http_method.as_str())?,
                module: payload.module,
                is_public: payload.is_public,
            },
        )
        .await?;

    Ok(Json(access_point.into()))
}

pub async fn delete_access_point_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(access_point_id): Path<String>,
) -> ApiResult<StatusCode> {
    let access_point_id: AccessPointId = parse_id(access_point_id.as_str())?;
    state
        .access_point_service
        .delete_access_point(&user, access_point_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_access_point_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(access_point_id): Path<String>,
    Json(payload): Json<AssignAccessPointPermissionRequest>,
) -> ApiResult<Json<AccessPointResponse>> {
    let access_point_id: AccessPointId = parse_id(access_point_id.as_str())?;
    let permission_id: PermissionId = parse_id(payload.permission_id.as_str())?;
    let access_point = state
        .access_point_service
        .assign(&user, access_point_id, permission_id)
        .await?;

    Ok(Json(access_point.into()))
}

pub async fn clear_access_point_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(access_point_id): Path<String>,
) -> ApiResult<Json<AccessPointResponse>> {
    let access_point_id: AccessPointId = parse_id(access_point_id.as_str())?;
    let access_point = state
        .access_point_service
        .unassign(&user, access_point_id)
        .await?;

    Ok(Json(access_point.into()))
}
