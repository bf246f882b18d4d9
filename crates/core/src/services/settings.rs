//! Branding and key/value application settings.

use owr_common::{AppError, AppResult, Bucket};
use owr_db::{entities::app_setting, repositories::AppSettingRepository};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::storage::StorageService;

/// Setting holding the public logo URL.
pub const LOGO_URL_KEY: &str = "logo_url";

/// Body for setting an arbitrary key.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetSettingInput {
    #[validate(length(max = 10_000))]
    pub value: Option<String>,
}

/// Current logo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    pub logo_url: Option<String>,
}

/// Settings service.
#[derive(Clone)]
pub struct SettingsService {
    setting_repo: AppSettingRepository,
    storage: StorageService,
}

impl SettingsService {
    /// Create a new settings service.
    #[must_use]
    pub const fn new(setting_repo: AppSettingRepository, storage: StorageService) -> Self {
        Self {
            setting_repo,
            storage,
        }
    }

    pub async fn logo(&self) -> AppResult<Logo> {
        Ok(Logo {
            logo_url: self.setting_repo.get_value(LOGO_URL_KEY).await?,
        })
    }

    /// Store a new logo image and point the logo setting at it.
    pub async fn upload_logo(&self, file_name: &str, data: &[u8]) -> AppResult<Logo> {
        if !super::storage::is_image(file_name) {
            return Err(AppError::BadRequest(
                "Logo must be a png, jpg, gif, webp or svg image".to_string(),
            ));
        }
        let uploaded = self.storage.upload(Bucket::Logos, file_name, data).await?;
        let setting = self
            .setting_repo
            .upsert(LOGO_URL_KEY, Some(uploaded.url))
            .await?;

        tracing::info!(key = %uploaded.key, "Logo replaced");
        Ok(Logo {
            logo_url: setting.setting_value,
        })
    }

    pub async fn get(&self, key: &str) -> AppResult<app_setting::Model> {
        validate_setting_key(key)?;
        self.setting_repo
            .get(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Setting not found: {key}")))
    }

    pub async fn set(&self, key: &str, input: SetSettingInput) -> AppResult<app_setting::Model> {
        validate_setting_key(key)?;
        input.validate()?;
        self.setting_repo.upsert(key, input.value).await
    }
}

/// Keys are short identifiers: letters, digits, `_`, `-` and `.`.
fn validate_setting_key(key: &str) -> AppResult<()> {
    let ok = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid setting key: {key}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use owr_common::{LocalStorage, UrlSigner};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> SettingsService {
        let base = "http://localhost:3000/api/files";
        let dir = std::env::temp_dir().join(format!("owr-settings-{}", uuid::Uuid::new_v4()));
        let storage = StorageService::new(
            Arc::new(LocalStorage::new(dir, base.to_string())),
            UrlSigner::new("test-secret", base, 60).unwrap(),
            1024,
        );
        SettingsService::new(AppSettingRepository::new(Arc::new(db)), storage)
    }

    #[test]
    fn test_setting_keys() {
        assert!(validate_setting_key("logo_url").is_ok());
        assert!(validate_setting_key("site.title-2").is_ok());
        assert!(validate_setting_key("").is_err());
        assert!(validate_setting_key("a b").is_err());
    }

    #[tokio::test]
    async fn test_missing_logo_is_null() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<app_setting::Model>::new()])
            .into_connection();

        let logo = service(db).logo().await.unwrap();

        assert!(logo.logo_url.is_none());
    }

    #[tokio::test]
    async fn test_upload_logo_stores_public_url() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let logo = service(db).upload_logo("brand.png", b"png").await.unwrap();

        let url = logo.logo_url.unwrap();
        assert!(url.starts_with("http://localhost:3000/api/files/logos/"));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_logo_must_be_an_image() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).upload_logo("notes.txt", b"hello").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
