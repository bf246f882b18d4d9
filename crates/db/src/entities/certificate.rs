//! Certificate entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::status::ReviewStatus;

/// Certificate model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "certificate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Candidate the certificate refers to, if any.
    #[sea_orm(nullable)]
    pub candidate_id: Option<String>,
    /// What is being certified.
    #[sea_orm(nullable)]
    pub title: Option<String>,
    /// Review status.
    pub status: ReviewStatus,
    /// Object key in the private certificates bucket; set on approval.
    #[sea_orm(nullable)]
    pub file_key: Option<String>,
    /// When the user asked for it.
    pub requested_at: DateTimeUtc,
    /// When it was approved.
    #[sea_orm(nullable)]
    pub issued_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::candidate::Entity",
        from = "Column::CandidateId",
        to = "super::candidate::Column::Id",
        on_delete = "SetNull"
    )]
    Candidate,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::candidate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Candidate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
