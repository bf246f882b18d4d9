//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Vote::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::CandidateId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::SubcategoryId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_user")
                            .from(Vote::Table, Vote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_candidate")
                            .from(Vote::Table, Vote::CandidateId)
                            .to(Candidate::Table, Candidate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_subcategory")
                            .from(Vote::Table, Vote::SubcategoryId)
                            .to(Subcategory::Table, Subcategory::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, subcategory_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_user_subcategory_unique")
                    .table(Vote::Table)
                    .col(Vote::UserId)
                    .col(Vote::SubcategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: candidate_id (tally audits)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_candidate_id")
                    .table(Vote::Table)
                    .col(Vote::CandidateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    UserId,
    CandidateId,
    SubcategoryId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Candidate {
    Table,
    Id,
}

#[derive(Iden)]
enum Subcategory {
    Table,
    Id,
}
