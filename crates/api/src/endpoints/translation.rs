//! Translation endpoint.

use axum::{Json, Router, extract::State, routing::post};
use owr_common::AppResult;
use owr_core::{TranslateInput, TranslationResponse};

use crate::{middleware::AppState, response::ApiResponse};

/// Translate a batch of UI strings.
async fn translate(
    State(state): State<AppState>,
    Json(input): Json<TranslateInput>,
) -> AppResult<ApiResponse<TranslationResponse>> {
    let response = state.translation_service.translate(input).await?;
    Ok(ApiResponse::ok(response))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(translate))
}
