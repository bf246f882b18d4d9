//! Branding and settings endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, post},
};
use owr_common::AppResult;
use owr_core::{Logo, SetSettingInput};
use owr_db::entities::app_setting;

use super::files::read_file_part;
use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

async fn get_logo(State(state): State<AppState>) -> AppResult<ApiResponse<Logo>> {
    let logo = state.settings_service.logo().await?;
    Ok(ApiResponse::ok(logo))
}

/// Replace the site logo with an uploaded image.
async fn upload_logo(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<Logo>> {
    let part = read_file_part(&mut multipart).await?;
    let logo = state
        .settings_service
        .upload_logo(&part.file_name, &part.data)
        .await?;
    tracing::info!(admin_id = %admin.id, "Logo uploaded");
    Ok(ApiResponse::ok(logo))
}

async fn get_setting(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<ApiResponse<app_setting::Model>> {
    let setting = state.settings_service.get(&key).await?;
    Ok(ApiResponse::ok(setting))
}

async fn put_setting(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<SetSettingInput>,
) -> AppResult<ApiResponse<app_setting::Model>> {
    let setting = state.settings_service.set(&key, input).await?;
    Ok(ApiResponse::ok(setting))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/logo", get(get_logo))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/settings/logo", post(upload_logo))
        .route("/settings/{key}", get(get_setting).put(put_setting))
}
