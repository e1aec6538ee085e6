//! Turnstile API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use tracing::info;
use turnstile_core::AppError;

use crate::api_config::{ApiConfig, CatalogStoreConfig, init_tracing};
use crate::api_services::{CatalogRepositories, build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let repositories = match &config.catalog_store {
        CatalogStoreConfig::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }
            CatalogRepositories::postgres(pool, config.membership_write_mode)
        }
        CatalogStoreConfig::Memory => {
            info!("using in-memory catalog store; data is lost on restart");
            CatalogRepositories::in_memory(config.membership_write_mode)
        }
    };

    let app_state = build_app_state(
        repositories,
        config.read_retry,
        config.identity(),
        config.api_token.as_str(),
    );
    let app = api_router::build_router(app_state, config.frontend_url.as_str())?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(
        %address,
        tenant_id = %config.tenant_id,
        membership_write_mode = config.membership_write_mode.as_str(),
        "turnstile api listening"
    );
    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}
