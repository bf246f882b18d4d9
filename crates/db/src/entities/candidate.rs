//! Candidate entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "candidate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub subcategory_id: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub display_order: i32,

    /// Vote tally (denormalized). Only ever changed by single-statement
    /// increments and decrements so it always equals the vote rows.
    #[sea_orm(default_value = 0)]
    pub vote_count: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id",
        on_delete = "Cascade"
    )]
    Subcategory,
    #[sea_orm(has_many = "super::candidate_image::Entity")]
    CandidateImage,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

impl Related<super::candidate_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CandidateImage.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
