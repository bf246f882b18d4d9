//! Certificate repository.

use std::sync::Arc;

use crate::entities::{Certificate, ReviewStatus, certificate};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Certificate repository for database operations.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a certificate by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<certificate::Model>> {
        Certificate::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a certificate by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<certificate::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Certificate not found: {id}")))
    }

    /// Insert a certificate.
    pub async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's certificates, newest request first.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .order_by_desc(certificate::Column::RequestedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All certificates, newest request first.
    pub async fn list_all(&self, limit: u64, offset: u64) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .order_by_desc(certificate::Column::RequestedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply a review decision if the row is still pending.
    ///
    /// `changes` must not touch the primary key. Returns `false` when no
    /// pending row matched, i.e. the certificate is missing or another
    /// decision already landed.
    pub async fn transition_from_pending(
        &self,
        id: &str,
        changes: certificate::ActiveModel,
    ) -> AppResult<bool> {
        let result = Certificate::update_many()
            .set(changes)
            .filter(certificate::Column::Id.eq(id))
            .filter(certificate::Column::Status.eq(ReviewStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count certificates.
    pub async fn count(&self) -> AppResult<u64> {
        Certificate::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
