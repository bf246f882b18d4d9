//! Key/value site settings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting key holding the public logo URL.
pub const LOGO_URL_KEY: &str = "logo_url";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "app_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub setting_key: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub setting_value: Option<String>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
