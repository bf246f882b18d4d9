//! World record entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A record shown on the records page once verified.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Free-form grouping label.
    pub category: String,
    /// The measured value, e.g. "42 km".
    pub record_value: String,
    pub holder_name: String,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    pub verified: bool,
    pub display_order: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
