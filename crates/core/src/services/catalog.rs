//! Categories, subcategories and candidates.

use chrono::Utc;
use owr_common::{AppError, AppResult, IdGenerator};
use owr_db::{
    entities::{candidate, candidate_image, category, subcategory},
    repositories::{
        CandidateRepository, CandidateWithImages, CategoryRepository, SubcategoryRepository,
    },
};
use sea_orm::{Set, Unchanged};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Category fields. Used for both create and replace.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 256))]
    pub full_name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(custom(function = "super::validation::image_url"))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

/// Subcategory fields. Used for both create and replace.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryInput {
    #[validate(length(min = 1, max = 64))]
    pub category_id: String,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(custom(function = "super::validation::image_url"))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

/// Input for creating a candidate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateInput {
    #[validate(length(min = 1, max = 64))]
    pub subcategory_id: String,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[validate(custom(function = "super::validation::image_urls"))]
    pub image_urls: Option<Vec<String>>,
}

/// Input for updating a candidate.
///
/// Candidates stay in their subcategory: votes carry the subcategory they
/// were cast in, so moving a candidate would split its tally.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<Option<String>>,
    pub display_order: Option<i32>,
    /// When present, replaces every image of the candidate.
    #[validate(custom(function = "super::validation::image_urls"))]
    pub image_urls: Option<Vec<String>>,
}

/// A candidate with its images in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: candidate::Model,
    pub images: Vec<candidate_image::Model>,
}

impl From<CandidateWithImages> for CandidateView {
    fn from(value: CandidateWithImages) -> Self {
        Self {
            candidate: value.candidate,
            images: value.images,
        }
    }
}

/// Result of deleting a category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDeletion {
    pub id: String,
    /// Subcategories removed with it.
    pub subcategories_removed: u64,
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    category_repo: CategoryRepository,
    subcategory_repo: SubcategoryRepository,
    candidate_repo: CandidateRepository,
    id_gen: IdGenerator,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(
        category_repo: CategoryRepository,
        subcategory_repo: SubcategoryRepository,
        candidate_repo: CandidateRepository,
    ) -> Self {
        Self {
            category_repo,
            subcategory_repo,
            candidate_repo,
            id_gen: IdGenerator::new(),
        }
    }

    // --- categories ---

    pub async fn list_categories(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.list().await
    }

    pub async fn get_category(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    pub async fn create_category(&self, input: CategoryInput) -> AppResult<category::Model> {
        input.validate()?;
        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            full_name: Set(input.full_name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            display_order: Set(input.display_order),
            created_at: Set(Utc::now()),
        };
        let created = self.category_repo.create(model).await?;
        tracing::info!(category_id = %created.id, "Category created");
        Ok(created)
    }

    pub async fn update_category(
        &self,
        id: &str,
        input: CategoryInput,
    ) -> AppResult<category::Model> {
        input.validate()?;
        let existing = self.category_repo.get_by_id(id).await?;
        let model = category::ActiveModel {
            id: Unchanged(existing.id),
            name: Set(input.name),
            full_name: Set(input.full_name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            display_order: Set(input.display_order),
            created_at: Unchanged(existing.created_at),
        };
        self.category_repo.update(model).await
    }

    /// Delete a category together with its subcategories, candidates and votes.
    pub async fn delete_category(&self, id: &str) -> AppResult<CategoryDeletion> {
        self.category_repo.get_by_id(id).await?;
        let subcategories_removed = self.subcategory_repo.count_by_category(id).await?;

        if !self.category_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Category not found: {id}")));
        }

        tracing::info!(category_id = %id, subcategories_removed, "Category deleted");
        Ok(CategoryDeletion {
            id: id.to_string(),
            subcategories_removed,
        })
    }

    // --- subcategories ---

    pub async fn list_subcategories(
        &self,
        category_id: &str,
    ) -> AppResult<Vec<subcategory::Model>> {
        self.category_repo.get_by_id(category_id).await?;
        self.subcategory_repo.list_by_category(category_id).await
    }

    pub async fn get_subcategory(&self, id: &str) -> AppResult<subcategory::Model> {
        self.subcategory_repo.get_by_id(id).await
    }

    pub async fn create_subcategory(
        &self,
        input: SubcategoryInput,
    ) -> AppResult<subcategory::Model> {
        input.validate()?;
        self.category_repo.get_by_id(&input.category_id).await?;

        let model = subcategory::ActiveModel {
            id: Set(self.id_gen.generate()),
            category_id: Set(input.category_id),
            name: Set(input.name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            display_order: Set(input.display_order),
            created_at: Set(Utc::now()),
        };
        let created = self.subcategory_repo.create(model).await?;
        tracing::info!(
            subcategory_id = %created.id,
            category_id = %created.category_id,
            "Subcategory created",
        );
        Ok(created)
    }

    pub async fn update_subcategory(
        &self,
        id: &str,
        input: SubcategoryInput,
    ) -> AppResult<subcategory::Model> {
        input.validate()?;
        let existing = self.subcategory_repo.get_by_id(id).await?;
        if existing.category_id != input.category_id {
            self.category_repo.get_by_id(&input.category_id).await?;
        }

        let model = subcategory::ActiveModel {
            id: Unchanged(existing.id),
            category_id: Set(input.category_id),
            name: Set(input.name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            display_order: Set(input.display_order),
            created_at: Unchanged(existing.created_at),
        };
        self.subcategory_repo.update(model).await
    }

    pub async fn delete_subcategory(&self, id: &str) -> AppResult<()> {
        if !self.subcategory_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Subcategory not found: {id}")));
        }
        tracing::info!(subcategory_id = %id, "Subcategory deleted");
        Ok(())
    }

    // --- candidates ---

    pub async fn list_candidates(&self, subcategory_id: &str) -> AppResult<Vec<CandidateView>> {
        self.subcategory_repo.get_by_id(subcategory_id).await?;
        Ok(self
            .candidate_repo
            .list_with_images(subcategory_id)
            .await?
            .into_iter()
            .map(CandidateView::from)
            .collect())
    }

    pub async fn get_candidate(&self, id: &str) -> AppResult<CandidateView> {
        self.candidate_repo.get_with_images(id).await.map(Into::into)
    }

    pub async fn create_candidate(&self, input: CreateCandidateInput) -> AppResult<CandidateView> {
        input.validate()?;
        self.subcategory_repo.get_by_id(&input.subcategory_id).await?;

        let model = candidate::ActiveModel {
            id: Set(self.id_gen.generate()),
            subcategory_id: Set(input.subcategory_id),
            name: Set(input.name),
            description: Set(input.description),
            display_order: Set(input.display_order),
            vote_count: Set(0),
            created_at: Set(Utc::now()),
        };
        let images = input.image_urls.map(|urls| self.image_models(urls));

        let created = self.candidate_repo.create(model, images).await?;
        tracing::info!(candidate_id = %created.candidate.id, "Candidate created");
        Ok(created.into())
    }

    pub async fn update_candidate(
        &self,
        id: &str,
        input: UpdateCandidateInput,
    ) -> AppResult<CandidateView> {
        input.validate()?;
        let existing = self.candidate_repo.get_by_id(id).await?;

        let mut model = candidate::ActiveModel {
            id: Unchanged(existing.id),
            ..Default::default()
        };
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(display_order) = input.display_order {
            model.display_order = Set(display_order);
        }
        let images = input.image_urls.map(|urls| self.image_models(urls));

        self.candidate_repo
            .update(model, images)
            .await
            .map(Into::into)
    }

    pub async fn delete_candidate(&self, id: &str) -> AppResult<()> {
        if !self.candidate_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Candidate not found: {id}")));
        }
        tracing::info!(candidate_id = %id, "Candidate deleted");
        Ok(())
    }

    fn image_models(&self, urls: Vec<String>) -> Vec<candidate_image::ActiveModel> {
        let now = Utc::now();
        urls.into_iter()
            .enumerate()
            .map(|(position, url)| candidate_image::ActiveModel {
                id: Set(self.id_gen.generate()),
                image_url: Set(url),
                display_order: Set(position as i32),
                created_at: Set(now),
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> CatalogService {
        let db = Arc::new(db);
        CatalogService::new(
            CategoryRepository::new(db.clone()),
            SubcategoryRepository::new(db.clone()),
            CandidateRepository::new(db),
        )
    }

    fn test_category() -> category::Model {
        category::Model {
            id: "cat1".to_string(),
            name: "Sports".to_string(),
            full_name: "Sports records".to_string(),
            description: None,
            image_url: None,
            display_order: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_delete_category_reports_removed_subcategories() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_category()]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(4))
            }]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let deletion = service(db).delete_category("cat1").await.unwrap();

        assert_eq!(deletion.subcategories_removed, 4);
    }

    #[tokio::test]
    async fn test_create_subcategory_requires_parent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();

        let result = service(db)
            .create_subcategory(SubcategoryInput {
                category_id: "missing".to_string(),
                name: "100m".to_string(),
                description: None,
                image_url: None,
                display_order: 0,
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_category_validates_fields() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db)
            .create_category(CategoryInput {
                name: String::new(),
                full_name: "Full".to_string(),
                description: None,
                image_url: Some("ftp://nope".to_string()),
                display_order: 0,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_image_models_follow_list_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let models = service(db).image_models(vec![
            "/api/files/candidates/a.png".to_string(),
            "/api/files/candidates/b.png".to_string(),
        ]);

        assert_eq!(models.len(), 2);
        assert_eq!(models[1].display_order, Set(1));
    }
}
