//! Voting endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use owr_common::AppResult;
use owr_core::{CastVoteInput, VoteReceipt};
use owr_db::entities::vote;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Filter for the caller's votes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVotesQuery {
    pub subcategory_id: Option<String>,
}

/// Subcategory to check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusQuery {
    pub subcategory_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
}

/// Cast a vote. A second vote in the same subcategory is refused.
async fn cast_vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CastVoteInput>,
) -> AppResult<ApiResponse<VoteReceipt>> {
    let receipt = state.vote_service.cast(&user.id, input).await?;
    Ok(ApiResponse::created(receipt))
}

async fn my_votes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MyVotesQuery>,
) -> AppResult<ApiResponse<Vec<vote::Model>>> {
    let votes = state
        .vote_service
        .my_votes(&user.id, query.subcategory_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(votes))
}

async fn vote_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<VoteStatusQuery>,
) -> AppResult<ApiResponse<VoteStatus>> {
    let has_voted = state
        .vote_service
        .has_voted(&user.id, &query.subcategory_id)
        .await?;
    Ok(ApiResponse::ok(VoteStatus { has_voted }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cast_vote))
        .route("/mine", get(my_votes))
        .route("/status", get(vote_status))
}
