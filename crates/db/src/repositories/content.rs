//! News, record and social link repositories.

use std::sync::Arc;

use crate::entities::{News, Record, SocialMediaLink, news, record, social_media_link};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// News repository for database operations.
#[derive(Clone)]
pub struct NewsRepository {
    db: Arc<DatabaseConnection>,
}

impl NewsRepository {
    /// Create a new news repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Articles newest first; `published_only` hides drafts.
    pub async fn list(
        &self,
        published_only: bool,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<news::Model>> {
        let mut query = News::find();
        if published_only {
            query = query.filter(news::Column::Published.eq(true));
        }
        query
            .order_by_desc(news::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an article by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<news::Model>> {
        News::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an article by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<news::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("News not found: {id}")))
    }

    /// Insert an article.
    pub async fn create(&self, model: news::ActiveModel) -> AppResult<news::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an article.
    pub async fn update(&self, model: news::ActiveModel) -> AppResult<news::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an article.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = News::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Record repository for database operations.
#[derive(Clone)]
pub struct RecordRepository {
    db: Arc<DatabaseConnection>,
}

impl RecordRepository {
    /// Create a new record repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records in display order; `verified_only` hides unverified ones.
    pub async fn list(&self, verified_only: bool) -> AppResult<Vec<record::Model>> {
        let mut query = Record::find();
        if verified_only {
            query = query.filter(record::Column::Verified.eq(true));
        }
        query
            .order_by_asc(record::Column::DisplayOrder)
            .order_by_desc(record::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a record by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<record::Model> {
        Record::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Record not found: {id}")))
    }

    /// Insert a record.
    pub async fn create(&self, model: record::ActiveModel) -> AppResult<record::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a record.
    pub async fn update(&self, model: record::ActiveModel) -> AppResult<record::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a record.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Record::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Social link repository for database operations.
#[derive(Clone)]
pub struct SocialLinkRepository {
    db: Arc<DatabaseConnection>,
}

impl SocialLinkRepository {
    /// Create a new social link repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Links in display order.
    pub async fn list(&self) -> AppResult<Vec<social_media_link::Model>> {
        SocialMediaLink::find()
            .order_by_asc(social_media_link::Column::DisplayOrder)
            .order_by_asc(social_media_link::Column::Platform)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a link by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<social_media_link::Model> {
        SocialMediaLink::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Social link not found: {id}")))
    }

    /// Insert a link.
    pub async fn create(
        &self,
        model: social_media_link::ActiveModel,
    ) -> AppResult<social_media_link::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a link.
    pub async fn update(
        &self,
        model: social_media_link::ActiveModel,
    ) -> AppResult<social_media_link::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a link.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = SocialMediaLink::delete_by_id(id)
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_news(id: &str, published: bool) -> news::Model {
        news::Model {
            id: id.to_string(),
            title: format!("Headline {id}"),
            body: "Body".to_string(),
            cover_image_url: None,
            published,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_published_news_query_filters_drafts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_news("n1", true)]])
                .into_connection(),
        );

        let repo = NewsRepository::new(db.clone());
        let items = repo.list(true, 20, 0).await.unwrap();
        assert_eq!(items.len(), 1);
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains(r#"\"published\" = $1"#), "{sql}");
    }

    #[tokio::test]
    async fn test_get_record_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<record::Model>::new()])
                .into_connection(),
        );

        let repo = RecordRepository::new(db);
        assert!(matches!(
            repo.get_by_id("r1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_social_links() {
        let link = social_media_link::Model {
            id: "l1".to_string(),
            platform: "instagram".to_string(),
            url: "https://instagram.com/owr".to_string(),
            icon: None,
            display_order: 0,
            created_at: Utc::now(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[link]])
                .into_connection(),
        );

        let repo = SocialLinkRepository::new(db);
        let links = repo.list().await.unwrap();
        assert_eq!(links[0].platform, "instagram");
    }
}
