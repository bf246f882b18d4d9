//! Category and subcategory repositories.

use std::sync::Arc;

use crate::entities::{Category, Subcategory, category, subcategory};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All categories in display order.
    pub async fn list(&self) -> AppResult<Vec<category::Model>> {
        Category::find()
            .order_by_asc(category::Column::DisplayOrder)
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a category by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<category::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))
    }

    /// Create a new category.
    pub async fn create(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a category.
    pub async fn update(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a category. Subcategories, candidates and votes go with it.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Subcategory repository for database operations.
#[derive(Clone)]
pub struct SubcategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl SubcategoryRepository {
    /// Create a new subcategory repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Subcategories of a category in display order.
    pub async fn list_by_category(&self, category_id: &str) -> AppResult<Vec<subcategory::Model>> {
        Subcategory::find()
            .filter(subcategory::Column::CategoryId.eq(category_id))
            .order_by_asc(subcategory::Column::DisplayOrder)
            .order_by_asc(subcategory::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count subcategories of a category.
    pub async fn count_by_category(&self, category_id: &str) -> AppResult<u64> {
        Subcategory::find()
            .filter(subcategory::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a subcategory by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<subcategory::Model>> {
        Subcategory::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a subcategory by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<subcategory::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subcategory not found: {id}")))
    }

    /// Create a new subcategory.
    pub async fn create(&self, model: subcategory::ActiveModel) -> AppResult<subcategory::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a subcategory.
    pub async fn update(&self, model: subcategory::ActiveModel) -> AppResult<subcategory::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a subcategory and everything beneath it.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Subcategory::delete_by_id(id)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_category(id: &str, order: i32) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: format!("cat-{id}"),
            full_name: format!("Category {id}"),
            description: None,
            image_url: None,
            display_order: order,
            created_at: Utc::now(),
        }
    }

    fn test_subcategory(id: &str, category_id: &str) -> subcategory::Model {
        subcategory::Model {
            id: id.to_string(),
            category_id: category_id.to_string(),
            name: format!("Sub {id}"),
            description: None,
            image_url: None,
            display_order: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_categories() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_category("c1", 0), test_category("c2", 1)]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let categories = repo.list().await.unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].id, "c1");
    }

    #[tokio::test]
    async fn test_get_category_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_category_reports_missing_row() {
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

        let repo = CategoryRepository::new(db);
        assert!(repo.delete("c1").await.unwrap());
        assert!(!repo.delete("c1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_subcategories_by_category() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    test_subcategory("s1", "c1"),
                    test_subcategory("s2", "c1"),
                ]])
                .into_connection(),
        );

        let repo = SubcategoryRepository::new(db);
        let subs = repo.list_by_category("c1").await.unwrap();

        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| s.category_id == "c1"));
    }

    #[tokio::test]
    async fn test_count_subcategories() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = SubcategoryRepository::new(db);
        assert_eq!(repo.count_by_category("c1").await.unwrap(), 3);
    }
}
