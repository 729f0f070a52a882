//! 租户与员工表
//!
//! - restaurants: 租户（每个餐厅一行）
//! - staff: 员工账号，PIN 哈希与登录失败计数

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurants::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restaurants::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Restaurants::NameTh).string_len(255).null())
                    .col(
                        ColumnDef::new(Restaurants::Timezone)
                            .string_len(64)
                            .not_null()
                            .default("Asia/Bangkok"),
                    )
                    .col(
                        ColumnDef::new(Restaurants::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Restaurants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Staff::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Staff::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Staff::RestaurantId).string_len(36).not_null())
                    .col(ColumnDef::new(Staff::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Staff::FullName).string_len(255).not_null())
                    .col(ColumnDef::new(Staff::FullNameTh).string_len(255).null())
                    .col(ColumnDef::new(Staff::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Staff::PinHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Staff::FailedPinAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Staff::LockedUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Staff::LastLoginAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Staff::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Staff::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Staff::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_restaurant")
                            .from(Staff::Table, Staff::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一餐厅内邮箱唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_staff_restaurant_email")
                    .table(Staff::Table)
                    .col(Staff::RestaurantId)
                    .col(Staff::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_staff_restaurant_email").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Staff::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Restaurants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Restaurants {
    Table,
    Id,
    Name,
    NameTh,
    Timezone,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Staff {
    Table,
    Id,
    RestaurantId,
    Email,
    FullName,
    FullNameTh,
    Role,
    PinHash,
    FailedPinAttempts,
    LockedUntil,
    LastLoginAt,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
