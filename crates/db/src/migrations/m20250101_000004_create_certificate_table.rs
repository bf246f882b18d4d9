//! Create certificate table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Certificate::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Certificate::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::CandidateId).string_len(32))
                    .col(ColumnDef::new(Certificate::Title).string_len(256))
                    .col(
                        ColumnDef::new(Certificate::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Certificate::FileKey).string_len(512))
                    .col(
                        ColumnDef::new(Certificate::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Certificate::IssuedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Certificate::UpdatedAt).timestamp_with_time_zone())
                    // An approved certificate always carries its file and issue time.
                    .check(
                        Expr::col(Certificate::Status).ne("approved").or(Expr::col(
                            Certificate::FileKey,
                        )
                        .is_not_null()
                        .and(Expr::col(Certificate::IssuedAt).is_not_null())),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_user")
                            .from(Certificate::Table, Certificate::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_candidate")
                            .from(Certificate::Table, Certificate::CandidateId)
                            .to(Candidate::Table, Candidate::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_user_id")
                    .table(Certificate::Table)
                    .col(Certificate::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_requested_at")
                    .table(Certificate::Table)
                    .col(Certificate::RequestedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificate {
    Table,
    Id,
    UserId,
    CandidateId,
    Title,
    Status,
    FileKey,
    RequestedAt,
    IssuedAt,
    UpdatedAt,
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
