//! News, records and social media links.

use chrono::Utc;
use owr_common::{AppError, AppResult, IdGenerator};
use owr_db::{
    entities::{news, record, social_media_link},
    repositories::{NewsRepository, RecordRepository, SocialLinkRepository},
};
use sea_orm::{Set, Unchanged};
use serde::Deserialize;
use validator::Validate;

/// Default and maximum page size for news listings.
pub const DEFAULT_NEWS_LIMIT: u64 = 20;
pub const MAX_NEWS_LIMIT: u64 = 100;

/// Input for creating an article.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 100_000))]
    pub body: String,
    #[validate(custom(function = "super::validation::image_url"))]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// Input for updating an article. Absent fields are kept.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100_000))]
    pub body: Option<String>,
    pub cover_image_url: Option<Option<String>>,
    pub published: Option<bool>,
}

/// Record fields. Used for both create and replace.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub category: String,
    #[validate(length(min = 1, max = 256))]
    pub record_value: String,
    #[validate(length(min = 1, max = 256))]
    pub holder_name: String,
    #[validate(custom(function = "super::validation::image_url"))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// Social link fields. Used for both create and replace.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinkInput {
    #[validate(length(min = 1, max = 64))]
    pub platform: String,
    #[validate(url)]
    pub url: String,
    #[validate(length(max = 128))]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

/// Clamp a requested page size.
#[must_use]
pub fn news_limit(requested: Option<u64>) -> u64 {
    requested
        .unwrap_or(DEFAULT_NEWS_LIMIT)
        .clamp(1, MAX_NEWS_LIMIT)
}

/// News service.
#[derive(Clone)]
pub struct NewsService {
    news_repo: NewsRepository,
    id_gen: IdGenerator,
}

impl NewsService {
    /// Create a new news service.
    #[must_use]
    pub const fn new(news_repo: NewsRepository) -> Self {
        Self {
            news_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Published articles, newest first.
    pub async fn list_published(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        self.news_repo.list(true, limit, offset).await
    }

    /// A published article. Drafts look missing to the public.
    pub async fn get_published(&self, id: &str) -> AppResult<news::Model> {
        let article = self.news_repo.get_by_id(id).await?;
        if !article.published {
            return Err(AppError::NotFound(format!("News not found: {id}")));
        }
        Ok(article)
    }

    /// Every article including drafts.
    pub async fn list_all(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        self.news_repo.list(false, limit, offset).await
    }

    pub async fn create(&self, input: CreateNewsInput) -> AppResult<news::Model> {
        input.validate()?;
        let model = news::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            body: Set(input.body),
            cover_image_url: Set(input.cover_image_url),
            published: Set(input.published),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let article = self.news_repo.create(model).await?;
        tracing::info!(news_id = %article.id, published = article.published, "News created");
        Ok(article)
    }

    pub async fn update(&self, id: &str, input: UpdateNewsInput) -> AppResult<news::Model> {
        input.validate()?;
        if let Some(Some(url)) = &input.cover_image_url {
            super::validation::image_url(url)
                .map_err(|_| AppError::Validation("coverImageUrl: invalid URL".to_string()))?;
        }
        self.news_repo.get_by_id(id).await?;

        let mut model = news::ActiveModel {
            id: Unchanged(id.to_string()),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(body) = input.body {
            model.body = Set(body);
        }
        if let Some(cover) = input.cover_image_url {
            model.cover_image_url = Set(cover);
        }
        if let Some(published) = input.published {
            model.published = Set(published);
        }

        self.news_repo.update(model).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.news_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("News not found: {id}")));
        }
        tracing::info!(news_id = %id, "News deleted");
        Ok(())
    }
}

/// Record service.
#[derive(Clone)]
pub struct RecordService {
    record_repo: RecordRepository,
    id_gen: IdGenerator,
}

impl RecordService {
    /// Create a new record service.
    #[must_use]
    pub const fn new(record_repo: RecordRepository) -> Self {
        Self {
            record_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Verified records in display order.
    pub async fn list_verified(&self) -> AppResult<Vec<record::Model>> {
        self.record_repo.list(true).await
    }

    pub async fn list_all(&self) -> AppResult<Vec<record::Model>> {
        self.record_repo.list(false).await
    }

    pub async fn create(&self, input: RecordInput) -> AppResult<record::Model> {
        input.validate()?;
        let model = record::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            record_value: Set(input.record_value),
            holder_name: Set(input.holder_name),
            image_url: Set(input.image_url),
            verified: Set(input.verified),
            display_order: Set(input.display_order),
            created_at: Set(Utc::now()),
        };
        let created = self.record_repo.create(model).await?;
        tracing::info!(record_id = %created.id, "Record created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, input: RecordInput) -> AppResult<record::Model> {
        input.validate()?;
        let existing = self.record_repo.get_by_id(id).await?;
        let model = record::ActiveModel {
            id: Unchanged(existing.id),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            record_value: Set(input.record_value),
            holder_name: Set(input.holder_name),
            image_url: Set(input.image_url),
            verified: Set(input.verified),
            display_order: Set(input.display_order),
            created_at: Unchanged(existing.created_at),
        };
        self.record_repo.update(model).await
    }

    /// Flip the verified flag.
    pub async fn toggle_verified(&self, id: &str) -> AppResult<record::Model> {
        let existing = self.record_repo.get_by_id(id).await?;
        let verified = !existing.verified;
        let model = record::ActiveModel {
            id: Unchanged(existing.id),
            verified: Set(verified),
            ..Default::default()
        };
        let updated = self.record_repo.update(model).await?;
        tracing::info!(record_id = %id, verified, "Record verification toggled");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.record_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Record not found: {id}")));
        }
        Ok(())
    }
}

/// Social link service.
#[derive(Clone)]
pub struct SocialLinkService {
    link_repo: SocialLinkRepository,
    id_gen: IdGenerator,
}

impl SocialLinkService {
    /// Create a new social link service.
    #[must_use]
    pub const fn new(link_repo: SocialLinkRepository) -> Self {
        Self {
            link_repo,
            id_gen: IdGenerator::new(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<social_media_link::Model>> {
        self.link_repo.list().await
    }

    pub async fn create(&self, input: SocialLinkInput) -> AppResult<social_media_link::Model> {
        input.validate()?;
        let model = social_media_link::ActiveModel {
            id: Set(self.id_gen.generate()),
            platform: Set(input.platform),
            url: Set(input.url),
            icon: Set(input.icon),
            display_order: Set(input.display_order),
            created_at: Set(Utc::now()),
        };
        self.link_repo.create(model).await
    }

    pub async fn update(
        &self,
        id: &str,
        input: SocialLinkInput,
    ) -> AppResult<social_media_link::Model> {
        input.validate()?;
        let existing = self.link_repo.get_by_id(id).await?;
        let model = social_media_link::ActiveModel {
            id: Unchanged(existing.id),
            platform: Set(input.platform),
            url: Set(input.url),
            icon: Set(input.icon),
            display_order: Set(input.display_order),
            created_at: Unchanged(existing.created_at),
        };
        self.link_repo.update(model).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.link_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Social link not found: {id}")));
        }
        Ok(())
    }
}
