use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;
use turnstile_core::AppError;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/permissions",
            get(handlers::permissions::list_permissions_handler)
                .post(handlers::permissions::create_permission_handler),
        )
        .route(
            "/api/permissions/{permission_id}",
            get(handlers::permissions::get_permission_handler)
                .put(handlers::permissions::update_permission_handler)
                .delete(handlers::permissions::delete_permission_handler),
        )
        .route(
            "/api/permission-groups",
            get(handlers::groups::list_groups_handler).post(handlers::groups::create_group_handler),
        )
        .route(
            "/api/permission-groups/{group_id}",
            get(handlers::groups::get_group_handler)
                .put(handlers::groups::update_group_handler)
                .delete(handlers::groups::delete_group_handler),
        )
        .route(
            "/api/permission-groups/{group_id}/permissions",
            get(handlers::groups::list_group_permissions_handler)
                .post(handlers::groups::add_group_permissions_handler)
                .delete(handlers::groups::remove_group_permissions_handler),
        )
        .route(
            "/api/permission-groups/{group_id}/available-permissions",
            get(handlers::groups::list_available_permissions_handler),
        )
        .route(
            "/api/access-points",
            get(handlers::access_points::list_access_points_handler)
                .post(handlers::access_points::create_access_point_handler),
        )
        .route(
            "/api/access-points/unmapped",
            get(handlers::access_points::list_unmapped_access_points_handler),
        )
        .route(
            "/api/access-points/{access_point_id}",
            get(handlers::access_points::get_access_point_handler)
                .put(handlers::access_points::update_access_point_handler)
                .delete(handlers::access_points::delete_access_point_handler),
        )
        .route(
            "/api/access-points/{access_point_id}/permission",
            post(handlers::access_points::assign_access_point_permission_handler)
                .delete(handlers::access_points::clear_access_point_permission_handler),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/users/{user_id}/roles",
            get(handlers::users::user_roles_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::replace_user_roles_handler),
        )
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_api_token,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
