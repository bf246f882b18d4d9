//! Candidate repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Candidate, CandidateImage, candidate, candidate_image};
use owr_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// A candidate together with its ordered images.
#[derive(Debug, Clone)]
pub struct CandidateWithImages {
    /// The candidate row.
    pub candidate: candidate::Model,
    /// Images in display order.
    pub images: Vec<candidate_image::Model>,
}

/// Candidate repository for database operations.
#[derive(Clone)]
pub struct CandidateRepository {
    db: Arc<DatabaseConnection>,
}

impl CandidateRepository {
    /// Create a new candidate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a candidate by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<candidate::Model>> {
        Candidate::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a candidate by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<candidate::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Candidate not found: {id}")))
    }

    /// Find candidates by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<candidate::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Candidate::find()
            .filter(candidate::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Candidates of a subcategory with their images, both in display order.
    pub async fn list_with_images(
        &self,
        subcategory_id: &str,
    ) -> AppResult<Vec<CandidateWithImages>> {
        let candidates = Candidate::find()
            .filter(candidate::Column::SubcategoryId.eq(subcategory_id))
            .order_by_asc(candidate::Column::DisplayOrder)
            .order_by_asc(candidate::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let mut images = self.images_for(&ids).await?;

        Ok(candidates
            .into_iter()
            .map(|candidate| {
                let images = images.remove(&candidate.id).unwrap_or_default();
                CandidateWithImages { candidate, images }
            })
            .collect())
    }

    /// One candidate with its images.
    pub async fn get_with_images(&self, id: &str) -> AppResult<CandidateWithImages> {
        let candidate = self.get_by_id(id).await?;
        let images = self
            .images_for(std::slice::from_ref(&candidate.id))
            .await?
            .remove(&candidate.id)
            .unwrap_or_default();
        Ok(CandidateWithImages { candidate, images })
    }

    /// Images grouped by candidate ID.
    pub async fn images_for(
        &self,
        candidate_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<candidate_image::Model>>> {
        if candidate_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let images = CandidateImage::find()
            .filter(
                candidate_image::Column::CandidateId
                    .is_in(candidate_ids.iter().map(String::as_str)),
            )
            .order_by_asc(candidate_image::Column::DisplayOrder)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut grouped: HashMap<String, Vec<candidate_image::Model>> = HashMap::new();
        for image in images {
            grouped.entry(image.candidate_id.clone()).or_default().push(image);
        }
        Ok(grouped)
    }

    /// Insert a candidate and, if given, its images.
    pub async fn create(
        &self,
        model: candidate::ActiveModel,
        images: Option<Vec<candidate_image::ActiveModel>>,
    ) -> AppResult<CandidateWithImages> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let candidate = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let images = match images {
            Some(images) => replace_images(&txn, &candidate.id, images).await?,
            None => Vec::new(),
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(CandidateWithImages { candidate, images })
    }

    /// Update a candidate. When `images` is given the stored images are replaced.
    pub async fn update(
        &self,
        model: candidate::ActiveModel,
        images: Option<Vec<candidate_image::ActiveModel>>,
    ) -> AppResult<CandidateWithImages> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let candidate = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let images = match images {
            Some(images) => replace_images(&txn, &candidate.id, images).await?,
            None => CandidateImage::find()
                .filter(candidate_image::Column::CandidateId.eq(candidate.id.as_str()))
                .order_by_asc(candidate_image::Column::DisplayOrder)
                .all(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(CandidateWithImages { candidate, images })
    }

    /// Delete a candidate. Its votes and images cascade.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Candidate::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Candidates with the most votes.
    pub async fn top_by_votes(&self, limit: u64) -> AppResult<Vec<candidate::Model>> {
        Candidate::find()
            .order_by_desc(candidate::Column::VoteCount)
            .order_by_asc(candidate::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn replace_images<C: ConnectionTrait>(
    conn: &C,
    candidate_id: &str,
    images: Vec<candidate_image::ActiveModel>,
) -> AppResult<Vec<candidate_image::Model>> {
    CandidateImage::delete_many()
        .filter(candidate_image::Column::CandidateId.eq(candidate_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let mut stored = Vec::with_capacity(images.len());
    for mut image in images {
        image.candidate_id = Set(candidate_id.to_string());
        stored.push(
            image
                .insert(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        );
    }
    Ok(stored)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_candidate(id: &str, votes: i32) -> candidate::Model {
        candidate::Model {
            id: id.to_string(),
            subcategory_id: "sub1".to_string(),
            name: format!("Candidate {id}"),
            description: None,
            display_order: 0,
            vote_count: votes,
            created_at: Utc::now(),
        }
    }

    fn test_image(id: &str, candidate_id: &str, order: i32) -> candidate_image::Model {
        candidate_image::Model {
            id: id.to_string(),
            candidate_id: candidate_id.to_string(),
            image_url: format!("https://img.example/{id}.png"),
            display_order: order,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_with_images_groups_by_candidate() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_candidate("a", 0), test_candidate("b", 2)]])
                .append_query_results([[
                    test_image("i1", "a", 0),
                    test_image("i2", "a", 1),
                    test_image("i3", "b", 0),
                ]])
                .into_connection(),
        );

        let repo = CandidateRepository::new(db);
        let list = repo.list_with_images("sub1").await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].images.len(), 2);
        assert_eq!(list[1].images.len(), 1);
        assert_eq!(list[1].candidate.vote_count, 2);
    }

    #[tokio::test]
    async fn test_list_with_images_empty_subcategory_skips_image_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<candidate::Model>::new()])
                .into_connection(),
        );

        let repo = CandidateRepository::new(db);
        assert!(repo.list_with_images("sub1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_images() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_candidate("a", 4)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .append_query_results([[test_image("new1", "a", 0)]])
                .into_connection(),
        );

        let repo = CandidateRepository::new(db);
        let model = candidate::ActiveModel {
            id: sea_orm::Unchanged("a".to_string()),
            name: Set("Renamed".to_string()),
            ..Default::default()
        };
        let image = candidate_image::ActiveModel {
            id: Set("new1".to_string()),
            image_url: Set("https://img.example/new1.png".to_string()),
            display_order: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = repo.update(model, Some(vec![image])).await.unwrap();

        assert_eq!(updated.images.len(), 1);
        assert_eq!(updated.images[0].id, "new1");
        assert_eq!(updated.candidate.vote_count, 4);
    }

    #[tokio::test]
    async fn test_top_by_votes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_candidate("a", 9), test_candidate("b", 3)]])
                .into_connection(),
        );

        let repo = CandidateRepository::new(db);
        let top = repo.top_by_votes(5).await.unwrap();

        assert_eq!(top[0].vote_count, 9);
    }
}
