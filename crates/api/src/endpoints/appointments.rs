//! Appointment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use owr_common::AppResult;
use owr_core::{BookAppointmentInput, Decision};
use owr_db::entities::appointment;

use super::Page;
use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

async fn book_appointment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<BookAppointmentInput>,
) -> AppResult<ApiResponse<appointment::Model>> {
    let appointment = state.appointment_service.book(&user.id, input).await?;
    Ok(ApiResponse::created(appointment))
}

async fn my_appointments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<appointment::Model>>> {
    let appointments = state.appointment_service.my_appointments(&user.id).await?;
    Ok(ApiResponse::ok(appointments))
}

async fn list_appointments(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> AppResult<ApiResponse<Vec<appointment::Model>>> {
    let appointments = state
        .appointment_service
        .list_all(page.limit(), page.offset())
        .await?;
    Ok(ApiResponse::ok(appointments))
}

/// Approve an appointment. The confirmation email is sent in the background.
async fn approve_appointment(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<appointment::Model>> {
    let appointment = state
        .appointment_service
        .decide(&id, Decision::Approve)
        .await?;
    Ok(ApiResponse::ok(appointment))
}

async fn reject_appointment(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<appointment::Model>> {
    let appointment = state
        .appointment_service
        .decide(&id, Decision::Reject)
        .await?;
    Ok(ApiResponse::ok(appointment))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(book_appointment))
        .route("/mine", get(my_appointments))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route("/appointments/{id}/approve", post(approve_appointment))
        .route("/appointments/{id}/reject", post(reject_appointment))
}
