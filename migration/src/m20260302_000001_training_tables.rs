//! 培训模块、学习进度与证书表

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_tenancy_tables::{Restaurants, Staff};
use crate::m20260301_000002_sop_tables::SopDocuments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrainingModules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrainingModules::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrainingModules::SopId).string_len(36).null())
                    .col(
                        ColumnDef::new(TrainingModules::TitleEn)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::TitleTh)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrainingModules::DescriptionEn).text().null())
                    .col(ColumnDef::new(TrainingModules::DescriptionTh).text().null())
                    .col(ColumnDef::new(TrainingModules::Questions).text().not_null())
                    .col(
                        ColumnDef::new(TrainingModules::PassingScore)
                            .integer()
                            .not_null()
                            .default(80),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::DurationMinutes)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::CertificateValidDays)
                            .integer()
                            .not_null()
                            .default(365),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::CreatedBy)
                            .string_len(36)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingModules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_training_modules_restaurant")
                            .from(TrainingModules::Table, TrainingModules::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_training_modules_sop")
                            .from(TrainingModules::Table, TrainingModules::SopId)
                            .to(SopDocuments::Table, SopDocuments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TrainingProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrainingProgress::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::ModuleId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::StaffId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::ProgressPercent)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(TrainingProgress::BestScore).integer().null())
                    .col(
                        ColumnDef::new(TrainingProgress::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrainingProgress::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_training_progress_module")
                            .from(TrainingProgress::Table, TrainingProgress::ModuleId)
                            .to(TrainingModules::Table, TrainingModules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_training_progress_staff")
                            .from(TrainingProgress::Table, TrainingProgress::StaffId)
                            .to(Staff::Table, Staff::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_training_progress_module_staff")
                    .table(TrainingProgress::Table)
                    .col(TrainingProgress::ModuleId)
                    .col(TrainingProgress::StaffId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TrainingCertificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrainingCertificates::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::RestaurantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::ModuleId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::StaffId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::CertificateNumber)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::Score)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrainingCertificates::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_training_certificates_module")
                            .from(TrainingCertificates::Table, TrainingCertificates::ModuleId)
                            .to(TrainingModules::Table, TrainingModules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_training_certificates_staff")
                            .from(TrainingCertificates::Table, TrainingCertificates::StaffId)
                            .to(Staff::Table, Staff::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_training_certificates_staff")
                    .table(TrainingCertificates::Table)
                    .col(TrainingCertificates::RestaurantId)
                    .col(TrainingCertificates::StaffId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrainingCertificates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TrainingProgress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TrainingModules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TrainingModules {
    Table,
    Id,
    RestaurantId,
    SopId,
    TitleEn,
    TitleTh,
    DescriptionEn,
    DescriptionTh,
    Questions,
    PassingScore,
    DurationMinutes,
    CertificateValidDays,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TrainingProgress {
    Table,
    Id,
    RestaurantId,
    ModuleId,
    StaffId,
    Status,
    ProgressPercent,
    Attempts,
    BestScore,
    StartedAt,
    CompletedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TrainingCertificates {
    Table,
    Id,
    RestaurantId,
    ModuleId,
    StaffId,
    CertificateNumber,
    Score,
    IssuedAt,
    ExpiresAt,
    Status,
}
