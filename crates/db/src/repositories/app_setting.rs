//! Key/value settings repository.

use std::sync::Arc;

use crate::entities::{AppSetting, app_setting};
use chrono::Utc;
use owr_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};

/// Settings repository for database operations.
#[derive(Clone)]
pub struct AppSettingRepository {
    db: Arc<DatabaseConnection>,
}

impl AppSettingRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Read a setting row.
    pub async fn get(&self, key: &str) -> AppResult<Option<app_setting::Model>> {
        AppSetting::find_by_id(key)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read a setting's value; missing rows and null values are both `None`.
    pub async fn get_value(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.get(key).await?.and_then(|s| s.setting_value))
    }

    /// Insert or replace a setting.
    pub async fn upsert(&self, key: &str, value: Option<String>) -> AppResult<app_setting::Model> {
        let model = app_setting::ActiveModel {
            setting_key: Set(key.to_string()),
            setting_value: Set(value.clone()),
            updated_at: Set(Some(Utc::now())),
        };

        AppSetting::insert(model)
            .on_conflict(
                OnConflict::column(app_setting::Column::SettingKey)
                    .update_columns([
                        app_setting::Column::SettingValue,
                        app_setting::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(key = %key, "Setting updated");

        Ok(app_setting::Model {
            setting_key: key.to_string(),
            setting_value: value,
            updated_at: Some(Utc::now()),
        })
    }
}
