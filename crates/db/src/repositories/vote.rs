//! Vote repository.

use std::sync::Arc;

use crate::entities::{Candidate, Vote, candidate, vote};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait, sea_query::Expr,
};

/// Outcome of a successful vote.
#[derive(Debug, Clone)]
pub struct CastVote {
    /// The inserted vote row.
    pub vote: vote::Model,
    /// The candidate after its tally was incremented.
    pub candidate: candidate::Model,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a vote and bump the candidate's tally in one transaction.
    ///
    /// The unique index on `(user_id, subcategory_id)` decides duplicates: a
    /// violation rolls the transaction back and returns
    /// [`AppError::AlreadyVoted`]. The tally is incremented by a single
    /// `UPDATE ... SET vote_count = vote_count + 1`, so concurrent votes for
    /// the same candidate never lose an increment.
    pub async fn cast(&self, model: vote::ActiveModel) -> AppResult<CastVote> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let vote = match model.insert(&txn).await {
            Ok(vote) => vote,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(map_insert_error(&e));
            }
        };

        let result = Candidate::update_many()
            .col_expr(
                candidate::Column::VoteCount,
                Expr::col(candidate::Column::VoteCount).add(1),
            )
            .filter(candidate::Column::Id.eq(vote.candidate_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            let _ = txn.rollback().await;
            return Err(AppError::NotFound(format!(
                "Candidate not found: {}",
                vote.candidate_id
            )));
        }

        let candidate = Candidate::find_by_id(vote.candidate_id.as_str())
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| {
                AppError::NotFound(format!("Candidate not found: {}", vote.candidate_id))
            })?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(CastVote { vote, candidate })
    }

    /// Votes cast by a user, optionally within one subcategory.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        subcategory_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        let mut query = Vote::find().filter(vote::Column::UserId.eq(user_id));
        if let Some(subcategory_id) = subcategory_id {
            query = query.filter(vote::Column::SubcategoryId.eq(subcategory_id));
        }
        query
            .order_by_desc(vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Advisory check; the unique index is the authority.
    pub async fn has_voted_in_subcategory(
        &self,
        user_id: &str,
        subcategory_id: &str,
    ) -> AppResult<bool> {
        let count = Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::SubcategoryId.eq(subcategory_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Count votes for a candidate.
    pub async fn count_for_candidate(&self, candidate_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::CandidateId.eq(candidate_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all votes.
    pub async fn count(&self) -> AppResult<u64> {
        Vote::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn map_insert_error(err: &DbErr) -> AppError {
    constraint_error(err.sql_err()).unwrap_or_else(|| AppError::Database(err.to_string()))
}

/// Constraint violations raised by a vote insert.
fn constraint_error(err: Option<SqlErr>) -> Option<AppError> {
    match err? {
        SqlErr::UniqueConstraintViolation(_) => Some(AppError::AlreadyVoted(
            "You have already voted in this subcategory".to_string(),
        )),
        SqlErr::ForeignKeyConstraintViolation(_) => Some(AppError::NotFound(
            "Candidate or subcategory no longer exists".to_string(),
        )),
        _ => None,
    }
}
