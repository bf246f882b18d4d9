//! Certificate endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use owr_common::{AppResult, SignedUrl};
use owr_core::{
    ApproveCertificateInput, CertificateListItem, IssueCertificateInput, RequestCertificateInput,
};
use owr_db::entities::certificate;

use super::Page;
use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Request a certificate. It stays pending until an administrator decides.
async fn request_certificate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RequestCertificateInput>,
) -> AppResult<ApiResponse<certificate::Model>> {
    let certificate = state.certificate_service.request(&user.id, input).await?;
    Ok(ApiResponse::created(certificate))
}

async fn my_certificates(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<certificate::Model>>> {
    let certificates = state.certificate_service.my_certificates(&user.id).await?;
    Ok(ApiResponse::ok(certificates))
}

/// Time-limited download link for an approved certificate.
async fn download_certificate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SignedUrl>> {
    let is_admin = state.user_service.is_admin(&user.id).await?;
    let link = state
        .certificate_service
        .download(&user, is_admin, &id)
        .await?;
    Ok(ApiResponse::ok(link))
}

async fn list_certificates(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> AppResult<ApiResponse<Vec<CertificateListItem>>> {
    let certificates = state
        .certificate_service
        .list_all(page.limit(), page.offset())
        .await?;
    Ok(ApiResponse::ok(certificates))
}

/// Send a certificate to a user without a prior request.
async fn issue_certificate(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<IssueCertificateInput>,
) -> AppResult<ApiResponse<certificate::Model>> {
    let certificate = state.certificate_service.issue(input).await?;
    tracing::info!(admin_id = %admin.id, certificate_id = %certificate.id, "Certificate issued");
    Ok(ApiResponse::created(certificate))
}

async fn approve_certificate(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ApproveCertificateInput>,
) -> AppResult<ApiResponse<certificate::Model>> {
    let certificate = state.certificate_service.approve(&id, input).await?;
    tracing::info!(admin_id = %admin.id, certificate_id = %id, "Certificate approved");
    Ok(ApiResponse::ok(certificate))
}

async fn reject_certificate(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<certificate::Model>> {
    let certificate = state.certificate_service.reject(&id).await?;
    tracing::info!(admin_id = %admin.id, certificate_id = %id, "Certificate rejected");
    Ok(ApiResponse::ok(certificate))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(request_certificate))
        .route("/mine", get(my_certificates))
        .route("/{id}/download", get(download_certificate))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/certificates",
            get(list_certificates).post(issue_certificate),
        )
        .route("/certificates/{id}/approve", post(approve_certificate))
        .route("/certificates/{id}/reject", post(reject_certificate))
}
