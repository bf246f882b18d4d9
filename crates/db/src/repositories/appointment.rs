//! Appointment repository.

use std::sync::Arc;

use crate::entities::{Appointment, ReviewStatus, appointment};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Appointment repository for database operations.
#[derive(Clone)]
pub struct AppointmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AppointmentRepository {
    /// Create a new appointment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an appointment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<appointment::Model>> {
        Appointment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an appointment by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<appointment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment not found: {id}")))
    }

    /// Insert an appointment.
    pub async fn create(&self, model: appointment::ActiveModel) -> AppResult<appointment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's appointments, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<appointment::Model>> {
        Appointment::find()
            .filter(appointment::Column::UserId.eq(user_id))
            .order_by_desc(appointment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All appointments, newest first.
    pub async fn list_all(&self, limit: u64, offset: u64) -> AppResult<Vec<appointment::Model>> {
        Appointment::find()
            .order_by_desc(appointment::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending appointment to `status`. Returns `false` when no pending
    /// row matched.
    pub async fn transition_from_pending(&self, id: &str, status: ReviewStatus) -> AppResult<bool> {
        let result = Appointment::update_many()
            .set(appointment::ActiveModel {
                status: sea_orm::Set(status),
                updated_at: sea_orm::Set(Some(chrono::Utc::now())),
                ..Default::default()
            })
            .filter(appointment::Column::Id.eq(id))
            .filter(appointment::Column::Status.eq(ReviewStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_appointment(id: &str) -> appointment::Model {
        appointment::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            appointment_date: Utc::now() + Duration::days(3),
            note: None,
            status: ReviewStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_appointment("a1"), test_appointment("a2")]])
                .into_connection(),
        );

        let repo = AppointmentRepository::new(db);
        assert_eq!(repo.list_all(50, 0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_transition_matches_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = AppointmentRepository::new(db);
        assert!(
            repo.transition_from_pending("a1", ReviewStatus::Approved)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .transition_from_pending("a1", ReviewStatus::Rejected)
                .await
                .unwrap()
        );
    }
}
