//! Create category, subcategory, candidate and `candidate_image` tables migration.
//!
//! Every child row cascades with its parent: deleting a category removes its
//! subcategories, their candidates, candidate images and votes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Category::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Category::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Category::FullName).string_len(256).not_null())
                    .col(ColumnDef::new(Category::Description).text())
                    .col(ColumnDef::new(Category::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Category::DisplayOrder).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Category::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_category_display_order")
                    .table(Category::Table)
                    .col(Category::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subcategory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subcategory::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Subcategory::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Subcategory::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Subcategory::Description).text())
                    .col(ColumnDef::new(Subcategory::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Subcategory::DisplayOrder).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Subcategory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subcategory_category")
                            .from(Subcategory::Table, Subcategory::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (category_id, display_order)
        manager
            .create_index(
                Index::create()
                    .name("idx_subcategory_category_order")
                    .table(Subcategory::Table)
                    .col(Subcategory::CategoryId)
                    .col(Subcategory::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Candidate::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Candidate::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Candidate::SubcategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Candidate::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Candidate::Description).text())
                    .col(ColumnDef::new(Candidate::DisplayOrder).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Candidate::VoteCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Candidate::VoteCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Candidate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candidate_subcategory")
                            .from(Candidate::Table, Candidate::SubcategoryId)
                            .to(Subcategory::Table, Subcategory::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_candidate_subcategory_order")
                    .table(Candidate::Table)
                    .col(Candidate::SubcategoryId)
                    .col(Candidate::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        // Index: vote_count (analytics top list)
        manager
            .create_index(
                Index::create()
                    .name("idx_candidate_vote_count")
                    .table(Candidate::Table)
                    .col(Candidate::VoteCount)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CandidateImage::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CandidateImage::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(CandidateImage::CandidateId).string_len(32).not_null())
                    .col(ColumnDef::new(CandidateImage::ImageUrl).string_len(1024).not_null())
                    .col(
                        ColumnDef::new(CandidateImage::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CandidateImage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candidate_image_candidate")
                            .from(CandidateImage::Table, CandidateImage::CandidateId)
                            .to(Candidate::Table, Candidate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_candidate_image_candidate_id")
                    .table(CandidateImage::Table)
                    .col(CandidateImage::CandidateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CandidateImage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Candidate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subcategory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
    Name,
    FullName,
    Description,
    ImageUrl,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Subcategory {
    Table,
    Id,
    CategoryId,
    Name,
    Description,
    ImageUrl,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Candidate {
    Table,
    Id,
    SubcategoryId,
    Name,
    Description,
    DisplayOrder,
    VoteCount,
    CreatedAt,
}

#[derive(Iden)]
enum CandidateImage {
    Table,
    Id,
    CandidateId,
    ImageUrl,
    DisplayOrder,
    CreatedAt,
}
