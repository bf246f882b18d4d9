//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use owr_common::AppResult;
use owr_core::{AuthSession, SignInInput, SignUpInput, UserProfile};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done, done},
};

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignUpInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.user_service.sign_up(input).await?;
    Ok(ApiResponse::created(session))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.user_service.sign_in(input).await?;
    Ok(ApiResponse::ok(session))
}

/// Sign out (invalidate current token by regenerating).
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Done>> {
    state.user_service.sign_out(&user.id).await?;
    Ok(done())
}

/// The caller's profile.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.user_service.me(user).await?;
    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/me", get(me))
}
