//! Create news, record, `social_media_link` and `app_setting` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(News::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(News::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(News::Title).string_len(256).not_null())
                    .col(ColumnDef::new(News::Body).text().not_null())
                    .col(ColumnDef::new(News::CoverImageUrl).string_len(1024))
                    .col(ColumnDef::new(News::Published).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(News::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(News::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: (published, created_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_news_published_created_at")
                    .table(News::Table)
                    .col(News::Published)
                    .col(News::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Record::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Record::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Record::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Record::Description).text())
                    .col(ColumnDef::new(Record::Category).string_len(128).not_null())
                    .col(ColumnDef::new(Record::RecordValue).string_len(256).not_null())
                    .col(ColumnDef::new(Record::HolderName).string_len(256).not_null())
                    .col(ColumnDef::new(Record::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Record::Verified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Record::DisplayOrder).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Record::CreatedAt)
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
                    .name("idx_record_verified_order")
                    .table(Record::Table)
                    .col(Record::Verified)
                    .col(Record::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SocialMediaLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocialMediaLink::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SocialMediaLink::Platform).string_len(64).not_null())
                    .col(ColumnDef::new(SocialMediaLink::Url).string_len(1024).not_null())
                    .col(ColumnDef::new(SocialMediaLink::Icon).string_len(64))
                    .col(
                        ColumnDef::new(SocialMediaLink::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SocialMediaLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AppSetting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSetting::SettingKey)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppSetting::SettingValue).text())
                    .col(ColumnDef::new(AppSetting::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppSetting::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SocialMediaLink::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Record::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(News::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum News {
    Table,
    Id,
    Title,
    Body,
    CoverImageUrl,
    Published,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Record {
    Table,
    Id,
    Title,
    Description,
    Category,
    RecordValue,
    HolderName,
    ImageUrl,
    Verified,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum SocialMediaLink {
    Table,
    Id,
    Platform,
    Url,
    Icon,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum AppSetting {
    Table,
    SettingKey,
    SettingValue,
    UpdatedAt,
}
