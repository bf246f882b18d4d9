//! News, record and social link endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use owr_common::AppResult;
use owr_core::{
    CreateNewsInput, RecordInput, SocialLinkInput, UpdateNewsInput, content::news_limit,
};
use owr_db::entities::{news, record, social_media_link};

use super::Page;
use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, Deleted},
};

// --- news ---

async fn list_news(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> AppResult<ApiResponse<Vec<news::Model>>> {
    let articles = state
        .news_service
        .list_published(news_limit(page.limit), page.offset())
        .await?;
    Ok(ApiResponse::ok(articles))
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<news::Model>> {
    let article = state.news_service.get_published(&id).await?;
    Ok(ApiResponse::ok(article))
}

async fn admin_list_news(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> AppResult<ApiResponse<Vec<news::Model>>> {
    let articles = state
        .news_service
        .list_all(news_limit(page.limit), page.offset())
        .await?;
    Ok(ApiResponse::ok(articles))
}

async fn create_news(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateNewsInput>,
) -> AppResult<ApiResponse<news::Model>> {
    let article = state.news_service.create(input).await?;
    Ok(ApiResponse::created(article))
}

async fn update_news(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateNewsInput>,
) -> AppResult<ApiResponse<news::Model>> {
    let article = state.news_service.update(&id, input).await?;
    Ok(ApiResponse::ok(article))
}

async fn delete_news(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    state.news_service.delete(&id).await?;
    Ok(ApiResponse::ok(Deleted::new(id)))
}

// --- records ---

async fn list_records(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<record::Model>>> {
    let records = state.record_service.list_verified().await?;
    Ok(ApiResponse::ok(records))
}

async fn admin_list_records(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<record::Model>>> {
    let records = state.record_service.list_all().await?;
    Ok(ApiResponse::ok(records))
}

async fn create_record(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<RecordInput>,
) -> AppResult<ApiResponse<record::Model>> {
    let record = state.record_service.create(input).await?;
    Ok(ApiResponse::created(record))
}

async fn update_record(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RecordInput>,
) -> AppResult<ApiResponse<record::Model>> {
    let record = state.record_service.update(&id, input).await?;
    Ok(ApiResponse::ok(record))
}

async fn toggle_record_verified(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<record::Model>> {
    let record = state.record_service.toggle_verified(&id).await?;
    Ok(ApiResponse::ok(record))
}

async fn delete_record(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    state.record_service.delete(&id).await?;
    Ok(ApiResponse::ok(Deleted::new(id)))
}

// --- social links ---

async fn list_social_links(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<social_media_link::Model>>> {
    let links = state.social_link_service.list().await?;
    Ok(ApiResponse::ok(links))
}

async fn create_social_link(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<SocialLinkInput>,
) -> AppResult<ApiResponse<social_media_link::Model>> {
    let link = state.social_link_service.create(input).await?;
    Ok(ApiResponse::created(link))
}

async fn update_social_link(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SocialLinkInput>,
) -> AppResult<ApiResponse<social_media_link::Model>> {
    let link = state.social_link_service.update(&id, input).await?;
    Ok(ApiResponse::ok(link))
}

async fn delete_social_link(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    state.social_link_service.delete(&id).await?;
    Ok(ApiResponse::ok(Deleted::new(id)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_news))
        .route("/news/{id}", get(get_news))
        .route("/records", get(list_records))
        .route("/social-links", get(list_social_links))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/news", get(admin_list_news).post(create_news))
        .route("/news/{id}", put(update_news).delete(delete_news))
        .route("/records", get(admin_list_records).post(create_record))
        .route("/records/{id}", put(update_record).delete(delete_record))
        .route("/records/{id}/verify", post(toggle_record_verified))
        .route("/social-links", post(create_social_link))
        .route(
            "/social-links/{id}",
            put(update_social_link).delete(delete_social_link),
        )
}
