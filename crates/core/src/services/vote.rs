//! Vote casting.

use owr_common::{AppError, AppResult, IdGenerator};
use owr_db::{
    entities::vote,
    repositories::{CandidateRepository, VoteRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for casting a vote.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteInput {
    #[validate(length(min = 1, max = 64))]
    pub candidate_id: String,
}

/// A recorded vote and the candidate's tally after it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub vote: vote::Model,
    pub vote_count: i32,
}

/// Vote service.
#[derive(Clone)]
pub struct VoteService {
    candidate_repo: CandidateRepository,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(candidate_repo: CandidateRepository, vote_repo: VoteRepository) -> Self {
        Self {
            candidate_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast the caller's single vote in a candidate's subcategory.
    pub async fn cast(&self, user_id: &str, input: CastVoteInput) -> AppResult<VoteReceipt> {
        input.validate()?;

        let candidate = self.candidate_repo.get_by_id(&input.candidate_id).await?;

        // Fast path for the UI; the unique index decides.
        if self
            .vote_repo
            .has_voted_in_subcategory(user_id, &candidate.subcategory_id)
            .await?
        {
            return Err(AppError::AlreadyVoted(
                "You have already voted in this subcategory".to_string(),
            ));
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            candidate_id: Set(candidate.id.clone()),
            subcategory_id: Set(candidate.subcategory_id.clone()),
            created_at: Set(chrono::Utc::now()),
        };

        let cast = self.vote_repo.cast(model).await?;

        tracing::info!(
            user_id = %user_id,
            candidate_id = %cast.candidate.id,
            subcategory_id = %cast.vote.subcategory_id,
            vote_count = cast.candidate.vote_count,
            "Vote cast"
        );

        Ok(VoteReceipt {
            vote: cast.vote,
            vote_count: cast.candidate.vote_count,
        })
    }

    /// The caller's votes, optionally within one subcategory.
    pub async fn my_votes(
        &self,
        user_id: &str,
        subcategory_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_by_user(user_id, subcategory_id).await
    }

    /// Whether the caller already voted in a subcategory.
    pub async fn has_voted(&self, user_id: &str, subcategory_id: &str) -> AppResult<bool> {
        self.vote_repo
            .has_voted_in_subcategory(user_id, subcategory_id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use owr_db::entities::candidate;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_candidate(votes: i32) -> candidate::Model {
        candidate::Model {
            id: "cand1".to_string(),
            subcategory_id: "sub1".to_string(),
            name: "Candidate".to_string(),
            description: None,
            display_order: 0,
            vote_count: votes,
            created_at: Utc::now(),
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn service(db: DatabaseConnection) -> VoteService {
        let db = Arc::new(db);
        VoteService::new(
            CandidateRepository::new(db.clone()),
            VoteRepository::new(db),
        )
    }

    fn input() -> CastVoteInput {
        CastVoteInput {
            candidate_id: "cand1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cast_returns_new_tally() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_candidate(3)]])
            .append_query_results([count_row(0)])
            .append_query_results([[vote::Model {
                id: "v1".to_string(),
                user_id: "user1".to_string(),
                candidate_id: "cand1".to_string(),
                subcategory_id: "sub1".to_string(),
                created_at: Utc::now(),
            }]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[test_candidate(4)]])
            .into_connection();

        let receipt = service(db).cast("user1", input()).await.unwrap();

        assert_eq!(receipt.vote_count, 4);
        assert_eq!(receipt.vote.subcategory_id, "sub1");
    }

    #[tokio::test]
    async fn test_second_vote_in_subcategory_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_candidate(4)]])
            .append_query_results([count_row(1)])
            .into_connection();

        let result = service(db).cast("user1", input()).await;

        assert!(matches!(result, Err(AppError::AlreadyVoted(_))));
    }

    #[tokio::test]
    async fn test_unknown_candidate() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<candidate::Model>::new()])
            .into_connection();

        let result = service(db).cast("user1", input()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_candidate_id_fails_validation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let result = service(db)
            .cast(
                "user1",
                CastVoteInput {
                    candidate_id: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
