//! Admin user management and analytics endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use owr_common::AppResult;
use owr_core::{AnalyticsSummary, UserProfile};

use super::Page;
use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, Deleted},
};

async fn list_users(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let users = state
        .user_service
        .list(page.limit(), page.offset())
        .await?;
    Ok(ApiResponse::ok(users))
}

async fn toggle_admin(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.user_service.toggle_admin(&admin.id, &id).await?;
    Ok(ApiResponse::ok(profile))
}

async fn toggle_ban(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.user_service.toggle_ban(&admin.id, &id).await?;
    Ok(ApiResponse::ok(profile))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    state.user_service.delete(&admin.id, &id).await?;
    Ok(ApiResponse::ok(Deleted::new(id)))
}

async fn analytics(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AnalyticsSummary>> {
    let summary = state.analytics_service.summary().await?;
    Ok(ApiResponse::ok(summary))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/admin", post(toggle_admin))
        .route("/users/{id}/ban", post(toggle_ban))
        .route("/analytics", get(analytics))
}
