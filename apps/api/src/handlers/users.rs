use axum::Json;
use axum::extract::{Extension, Path, State};
use turnstile_core::UserIdentity;
use turnstile_domain::RoleId;

use super::parse_id_set;
use crate::dto::{ReplaceUserRolesRequest, UserRolesResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserRolesResponse>> {
    let assignment = state
        .role_assignment_service
        .user_assignment(&user, user_id.as_str())
        .await?;

    Ok(Json(assignment.into()))
}

/// Replaces the user's full role set; roles missing from the body are revoked.
pub async fn replace_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<ReplaceUserRolesRequest>,
) -> ApiResult<Json<UserRolesResponse>> {
    let role_ids = parse_id_set::<RoleId>(&payload.role_ids)?;
    let assignment = state
        .role_assignment_service
        .replace_roles(&user, user_id.as_str(), &role_ids)
        .await?;

    Ok(Json(assignment.into()))
}
