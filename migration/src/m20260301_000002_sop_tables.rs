//! SOP 分类、文档与附件表

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_tenancy_tables::{Restaurants, Staff};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SopCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SopCategories::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SopCategories::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SopCategories::Code).string_len(32).not_null())
                    .col(ColumnDef::new(SopCategories::NameEn).string_len(255).not_null())
                    .col(ColumnDef::new(SopCategories::NameTh).string_len(255).not_null())
                    .col(ColumnDef::new(SopCategories::DescriptionEn).text().null())
                    .col(ColumnDef::new(SopCategories::DescriptionTh).text().null())
                    .col(
                        ColumnDef::new(SopCategories::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SopCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SopCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sop_categories_restaurant")
                            .from(SopCategories::Table, SopCategories::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_sop_categories_restaurant_code")
                    .table(SopCategories::Table)
                    .col(SopCategories::RestaurantId)
                    .col(SopCategories::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SopDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SopDocuments::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SopDocuments::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SopDocuments::CategoryId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SopDocuments::TitleEn).string_len(500).not_null())
                    .col(ColumnDef::new(SopDocuments::TitleTh).string_len(500).not_null())
                    .col(ColumnDef::new(SopDocuments::ContentEn).text().not_null())
                    .col(ColumnDef::new(SopDocuments::ContentTh).text().not_null())
                    .col(ColumnDef::new(SopDocuments::Steps).text().not_null())
                    .col(ColumnDef::new(SopDocuments::Tags).text().not_null())
                    .col(ColumnDef::new(SopDocuments::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(SopDocuments::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(SopDocuments::CreatedBy).string_len(36).null())
                    .col(ColumnDef::new(SopDocuments::UpdatedBy).string_len(36).null())
                    .col(ColumnDef::new(SopDocuments::ApprovedBy).string_len(36).null())
                    .col(
                        ColumnDef::new(SopDocuments::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SopDocuments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SopDocuments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sop_documents_restaurant")
                            .from(SopDocuments::Table, SopDocuments::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sop_documents_category")
                            .from(SopDocuments::Table, SopDocuments::CategoryId)
                            .to(SopCategories::Table, SopCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sop_documents_restaurant_status")
                    .table(SopDocuments::Table)
                    .col(SopDocuments::RestaurantId)
                    .col(SopDocuments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sop_documents_category")
                    .table(SopDocuments::Table)
                    .col(SopDocuments::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SopAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SopAttachments::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SopAttachments::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SopAttachments::SopId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(SopAttachments::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SopAttachments::ContentType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SopAttachments::SizeBytes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SopAttachments::StorageKey)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SopAttachments::UploadedBy)
                            .string_len(36)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SopAttachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sop_attachments_sop")
                            .from(SopAttachments::Table, SopAttachments::SopId)
                            .to(SopDocuments::Table, SopDocuments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sop_attachments_uploader")
                            .from(SopAttachments::Table, SopAttachments::UploadedBy)
                            .to(Staff::Table, Staff::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sop_attachments_sop")
                    .table(SopAttachments::Table)
                    .col(SopAttachments::SopId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SopAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SopDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SopCategories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SopCategories {
    Table,
    Id,
    RestaurantId,
    Code,
    NameEn,
    NameTh,
    DescriptionEn,
    DescriptionTh,
    SortOrder,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum SopDocuments {
    Table,
    Id,
    RestaurantId,
    CategoryId,
    TitleEn,
    TitleTh,
    ContentEn,
    ContentTh,
    Steps,
    Tags,
    Status,
    Version,
    CreatedBy,
    UpdatedBy,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SopAttachments {
    Table,
    Id,
    RestaurantId,
    SopId,
    FileName,
    ContentType,
    SizeBytes,
    StorageKey,
    UploadedBy,
    CreatedAt,
}
