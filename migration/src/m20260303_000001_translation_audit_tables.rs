//! 翻译工作流与审计日志表
//!
//! - translation_keys / translations: 每个 key 每种语言一条译文
//! - translation_history: 译文版本历史（只追加）
//! - audit_logs: 操作审计（只追加）

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_tenancy_tables::Restaurants;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TranslationKeys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TranslationKeys::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TranslationKeys::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TranslationKeys::KeyName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TranslationKeys::Category)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TranslationKeys::Description).text().null())
                    .col(
                        ColumnDef::new(TranslationKeys::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_translation_keys_restaurant")
                            .from(TranslationKeys::Table, TranslationKeys::RestaurantId)
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
                    .name("uq_translation_keys_restaurant_key")
                    .table(TranslationKeys::Table)
                    .col(TranslationKeys::RestaurantId)
                    .col(TranslationKeys::KeyName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Translations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Translations::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Translations::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Translations::KeyId).string_len(36).not_null())
                    .col(ColumnDef::new(Translations::Locale).string_len(8).not_null())
                    .col(ColumnDef::new(Translations::Value).text().not_null())
                    .col(ColumnDef::new(Translations::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Translations::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Translations::UpdatedBy).string_len(36).null())
                    .col(
                        ColumnDef::new(Translations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_translations_key")
                            .from(Translations::Table, Translations::KeyId)
                            .to(TranslationKeys::Table, TranslationKeys::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_translations_key_locale")
                    .table(Translations::Table)
                    .col(Translations::KeyId)
                    .col(Translations::Locale)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TranslationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TranslationHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TranslationHistory::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TranslationHistory::TranslationId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TranslationHistory::Version)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TranslationHistory::Value).text().not_null())
                    .col(
                        ColumnDef::new(TranslationHistory::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TranslationHistory::ChangedBy)
                            .string_len(36)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TranslationHistory::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_translation_history_translation")
                            .from(TranslationHistory::Table, TranslationHistory::TranslationId)
                            .to(Translations::Table, Translations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_translation_history_translation")
                    .table(TranslationHistory::Table)
                    .col(TranslationHistory::TranslationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuditLogs::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditLogs::StaffId).string_len(36).null())
                    .col(ColumnDef::new(AuditLogs::Action).string_len(64).not_null())
                    .col(
                        ColumnDef::new(AuditLogs::ResourceType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditLogs::ResourceId).string_len(64).null())
                    .col(ColumnDef::new(AuditLogs::Metadata).text().null())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string_len(45).null())
                    .col(
                        ColumnDef::new(AuditLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_logs_restaurant_created")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::RestaurantId)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TranslationHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Translations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TranslationKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TranslationKeys {
    Table,
    Id,
    RestaurantId,
    KeyName,
    Category,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Translations {
    Table,
    Id,
    RestaurantId,
    KeyId,
    Locale,
    Value,
    Status,
    Version,
    UpdatedBy,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TranslationHistory {
    Table,
    Id,
    RestaurantId,
    TranslationId,
    Version,
    Value,
    Status,
    ChangedBy,
    ChangedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    RestaurantId,
    StaffId,
    Action,
    ResourceType,
    ResourceId,
    Metadata,
    IpAddress,
    CreatedAt,
}
