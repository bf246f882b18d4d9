//! User and role repositories.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{Candidate, User, UserRole, Vote, candidate, user, user_role, vote};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait, sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    /// Find a user by email. Callers pass the lower-cased address.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        User::find()
            .filter(user::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a user together with its initial roles.
    pub async fn create(
        &self,
        model: user::ActiveModel,
        roles: Vec<user_role::ActiveModel>,
    ) -> AppResult<user::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = match model.insert(&txn).await {
            Ok(user) => user,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(map_unique_error(&e, "Email is already registered"));
            }
        };

        for role in roles {
            role.insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_desc(user::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user and everything they own.
    ///
    /// Votes disappear through the foreign key cascade, so the tallies of the
    /// candidates they voted for are decremented first, in the same
    /// transaction. The user row is locked before the votes are read: a vote
    /// insert needs a key-share lock on it for the foreign key, so no vote can
    /// slip in between the decrement and the cascade.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let locked = User::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if locked.is_none() {
            let _ = txn.rollback().await;
            return Ok(false);
        }

        let votes = Vote::find()
            .filter(vote::Column::UserId.eq(id))
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // A user holds at most one vote per subcategory, so each candidate
        // appears at most once and a single decrement per candidate is exact.
        let candidate_ids: HashSet<String> = votes.into_iter().map(|v| v.candidate_id).collect();
        if !candidate_ids.is_empty() {
            Candidate::update_many()
                .col_expr(
                    candidate::Column::VoteCount,
                    Expr::col(candidate::Column::VoteCount).sub(1),
                )
                .filter(candidate::Column::Id.is_in(candidate_ids.iter().map(String::as_str)))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        let result = User::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            let _ = txn.rollback().await;
            return Ok(false);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }
}

/// Role repository for database operations.
#[derive(Clone)]
pub struct UserRoleRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRoleRepository {
    /// Create a new role repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether a user holds a role.
    pub async fn has_role(&self, user_id: &str, role: user_role::Role) -> AppResult<bool> {
        let count = UserRole::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(user_role::Column::Role.eq(role))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Grant a role. Granting a role already held is a no-op.
    pub async fn grant(&self, model: user_role::ActiveModel) -> AppResult<()> {
        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Revoke a role. Returns whether a row was removed.
    pub async fn revoke(&self, user_id: &str, role: user_role::Role) -> AppResult<bool> {
        let result = UserRole::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(user_role::Column::Role.eq(role))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// The subset of `user_ids` holding `role`.
    pub async fn holders_among(
        &self,
        user_ids: &[String],
        role: user_role::Role,
    ) -> AppResult<HashSet<String>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = UserRole::find()
            .filter(user_role::Column::UserId.is_in(user_ids.iter().map(String::as_str)))
            .filter(user_role::Column::Role.eq(role))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }
}

fn map_unique_error(err: &DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::UserStatus;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            full_name: Some("Test User".to_string()),
            password_hash: "$argon2id$stub".to_string(),
            token: Some(format!("token-{id}")),
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn test_vote(id: &str, candidate_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            candidate_id: candidate_id.to_string(),
            subcategory_id: format!("sub-{candidate_id}"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("user1")]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let user = repo.find_by_token("token-user1").await.unwrap().unwrap();

        assert_eq!(user.id, "user1");
        assert!(!user.is_banned());
    }

    #[tokio::test]
    async fn test_delete_decrements_tallies_before_cascade() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("user1")]])
                .append_query_results([[test_vote("v1", "cand1"), test_vote("v2", "cand2")]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        assert!(repo.delete("user1").await.unwrap());
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = format!("{log:?}");
        assert!(sql.contains(r#"\"vote_count\" - "#), "{sql}");
        let lock = sql.find("FOR UPDATE").unwrap();
        let decrement = sql.find(r#"\"vote_count\" - "#).unwrap();
        assert!(lock < decrement, "{sql}");
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(!repo.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = UserRoleRepository::new(db);
        assert!(repo.has_role("user1", user_role::Role::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn test_holders_among() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_role::Model {
                    id: "r1".to_string(),
                    user_id: "user2".to_string(),
                    role: user_role::Role::Admin,
                    created_at: Utc::now(),
                }]])
                .into_connection(),
        );

        let repo = UserRoleRepository::new(db);
        let admins = repo
            .holders_among(
                &["user1".to_string(), "user2".to_string()],
                user_role::Role::Admin,
            )
            .await
            .unwrap();

        assert!(admins.contains("user2"));
        assert!(!admins.contains("user1"));
    }
}
