//! Category, subcategory and candidate endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use owr_common::AppResult;
use owr_core::{
    CandidateView, CategoryDeletion, CategoryInput, CreateCandidateInput, SubcategoryInput,
    UpdateCandidateInput,
};
use owr_db::entities::{category, subcategory};

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, Deleted},
};

// --- public ---

async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let categories = state.catalog_service.list_categories().await?;
    Ok(ApiResponse::ok(categories))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.catalog_service.get_category(&id).await?;
    Ok(ApiResponse::ok(category))
}

async fn list_subcategories(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> AppResult<ApiResponse<Vec<subcategory::Model>>> {
    let subcategories = state.catalog_service.list_subcategories(&category_id).await?;
    Ok(ApiResponse::ok(subcategories))
}

async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<subcategory::Model>> {
    let subcategory = state.catalog_service.get_subcategory(&id).await?;
    Ok(ApiResponse::ok(subcategory))
}

async fn list_candidates(
    State(state): State<AppState>,
    Path(subcategory_id): Path<String>,
) -> AppResult<ApiResponse<Vec<CandidateView>>> {
    let candidates = state.catalog_service.list_candidates(&subcategory_id).await?;
    Ok(ApiResponse::ok(candidates))
}

async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CandidateView>> {
    let candidate = state.catalog_service.get_candidate(&id).await?;
    Ok(ApiResponse::ok(candidate))
}

// --- admin ---

async fn create_category(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.catalog_service.create_category(input).await?;
    Ok(ApiResponse::created(category))
}

async fn update_category(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.catalog_service.update_category(&id, input).await?;
    Ok(ApiResponse::ok(category))
}

async fn delete_category(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CategoryDeletion>> {
    let deletion = state.catalog_service.delete_category(&id).await?;
    Ok(ApiResponse::ok(deletion))
}

async fn create_subcategory(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<SubcategoryInput>,
) -> AppResult<ApiResponse<subcategory::Model>> {
    let subcategory = state.catalog_service.create_subcategory(input).await?;
    Ok(ApiResponse::created(subcategory))
}

async fn update_subcategory(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SubcategoryInput>,
) -> AppResult<ApiResponse<subcategory::Model>> {
    let subcategory = state.catalog_service.update_subcategory(&id, input).await?;
    Ok(ApiResponse::ok(subcategory))
}

async fn delete_subcategory(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    state.catalog_service.delete_subcategory(&id).await?;
    Ok(ApiResponse::ok(Deleted::new(id)))
}

async fn create_candidate(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCandidateInput>,
) -> AppResult<ApiResponse<CandidateView>> {
    let candidate = state.catalog_service.create_candidate(input).await?;
    Ok(ApiResponse::created(candidate))
}

async fn update_candidate(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCandidateInput>,
) -> AppResult<ApiResponse<CandidateView>> {
    let candidate = state.catalog_service.update_candidate(&id, input).await?;
    Ok(ApiResponse::ok(candidate))
}

async fn delete_candidate(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    state.catalog_service.delete_candidate(&id).await?;
    Ok(ApiResponse::ok(Deleted::new(id)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category))
        .route("/categories/{id}/subcategories", get(list_subcategories))
        .route("/subcategories/{id}", get(get_subcategory))
        .route("/subcategories/{id}/candidates", get(list_candidates))
        .route("/candidates/{id}", get(get_candidate))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/subcategories", post(create_subcategory))
        .route(
            "/subcategories/{id}",
            put(update_subcategory).delete(delete_subcategory),
        )
        .route("/candidates", post(create_candidate))
        .route(
            "/candidates/{id}",
            put(update_candidate).delete(delete_candidate),
        )
}
