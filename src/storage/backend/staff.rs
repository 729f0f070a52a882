//! 员工账号与 PIN 登录计数
//!
//! 失败计数的自增、读取与锁定在同一个事务内完成，
//! 并发的错误 PIN 不会越过锁定阈值。

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{collect_models, model_to_staff};
use crate::errors::{Result, SopError};
use crate::storage::models::Staff;
use crate::storage::scope::{RestaurantScope, scoped_find, scoped_update};
use migration::entities::staff;

/// 一次错误 PIN 之后的计数状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFailure {
    /// 本次失败后的连续失败次数（触发锁定时为阈值本身）
    pub attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StaffActivity {
    pub active_staff: u64,
    pub recent_logins: u64,
    pub locked_accounts: u64,
}

impl SeaOrmStorage {
    pub async fn insert_staff(&self, scope: &RestaurantScope, s: &Staff) -> Result<()> {
        let model = staff::ActiveModel {
            id: Set(s.id.clone()),
            restaurant_id: Set(scope.restaurant_id().to_string()),
            email: Set(s.email.clone()),
            full_name: Set(s.full_name.clone()),
            full_name_th: Set(s.full_name_th.clone()),
            role: Set(s.role.as_ref().to_string()),
            pin_hash: Set(s.pin_hash.clone()),
            failed_pin_attempts: Set(s.failed_pin_attempts as i32),
            locked_until: Set(s.locked_until),
            last_login_at: Set(s.last_login_at),
            is_active: Set(s.is_active),
            created_at: Set(s.created_at),
            updated_at: Set(s.updated_at),
        };
        model.insert(&self.db).await?;
        info!("Staff created: {} ({})", s.id, s.role);
        Ok(())
    }

    pub async fn find_staff(&self, scope: &RestaurantScope, id: &str) -> Result<Option<Staff>> {
        let model = self
            .retrying("find_staff", || async {
                scoped_find::<staff::Entity>(scope)
                    .filter(staff::Column::Id.eq(id))
                    .one(&self.db)
                    .await
            })
            .await?;
        model.map(model_to_staff).transpose()
    }

    /// `email` 必须已经小写化
    pub async fn find_staff_by_email(
        &self,
        scope: &RestaurantScope,
        email: &str,
    ) -> Result<Option<Staff>> {
        let model = self
            .retrying("find_staff_by_email", || async {
                scoped_find::<staff::Entity>(scope)
                    .filter(staff::Column::Email.eq(email))
                    .one(&self.db)
                    .await
            })
            .await?;
        model.map(model_to_staff).transpose()
    }

    pub async fn list_staff(&self, scope: &RestaurantScope) -> Result<Vec<Staff>> {
        let models = self
            .retrying("list_staff", || async {
                scoped_find::<staff::Entity>(scope)
                    .order_by_asc(staff::Column::FullName)
                    .all(&self.db)
                    .await
            })
            .await?;
        collect_models(models, model_to_staff)
    }

    /// 写回可变字段（姓名、角色、状态、PIN 与锁定状态）
    pub async fn update_staff(&self, scope: &RestaurantScope, s: &Staff) -> Result<()> {
        let changes = staff::ActiveModel {
            full_name: Set(s.full_name.clone()),
            full_name_th: Set(s.full_name_th.clone()),
            role: Set(s.role.as_ref().to_string()),
            pin_hash: Set(s.pin_hash.clone()),
            failed_pin_attempts: Set(s.failed_pin_attempts as i32),
            locked_until: Set(s.locked_until),
            is_active: Set(s.is_active),
            updated_at: Set(s.updated_at),
            ..Default::default()
        };
        let result = scoped_update::<staff::Entity>(scope)
            .set(changes)
            .filter(staff::Column::Id.eq(&s.id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("Staff not found: {}", s.id)));
        }
        Ok(())
    }

    /// 记录一次错误 PIN；达到 `max_attempts` 时锁定并清零计数
    pub async fn record_failed_pin(
        &self,
        scope: &RestaurantScope,
        staff_id: &str,
        max_attempts: u32,
        lockout: Duration,
        now: DateTime<Utc>,
    ) -> Result<PinFailure> {
        let txn = self.db.begin().await.map_err(|e| {
            SopError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        // 先写后读：SQLite 在第一条写语句处即取得写锁
        scoped_update::<staff::Entity>(scope)
            .col_expr(
                staff::Column::FailedPinAttempts,
                Expr::col(staff::Column::FailedPinAttempts).add(1),
            )
            .col_expr(staff::Column::UpdatedAt, Expr::value(now))
            .filter(staff::Column::Id.eq(staff_id))
            .exec(&txn)
            .await?;

        let row = scoped_find::<staff::Entity>(scope)
            .filter(staff::Column::Id.eq(staff_id))
            .one(&txn)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Staff not found: {}", staff_id)))?;

        let attempts = std::cmp::Ord::max(row.failed_pin_attempts, 0) as u32;
        let locked_until = if attempts >= max_attempts {
            let until = now + lockout;
            scoped_update::<staff::Entity>(scope)
                .col_expr(staff::Column::FailedPinAttempts, Expr::value(0))
                .col_expr(staff::Column::LockedUntil, Expr::value(until))
                .filter(staff::Column::Id.eq(staff_id))
                .exec(&txn)
                .await?;
            Some(until)
        } else {
            None
        };

        txn.commit().await.map_err(|e| {
            SopError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(PinFailure {
            attempts,
            locked_until,
        })
    }

    /// 登录成功：清零计数、解除锁定、记录登录时间
    pub async fn record_successful_login(
        &self,
        scope: &RestaurantScope,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let none: Option<DateTime<Utc>> = None;
        scoped_update::<staff::Entity>(scope)
            .col_expr(staff::Column::FailedPinAttempts, Expr::value(0))
            .col_expr(staff::Column::LockedUntil, Expr::value(none))
            .col_expr(staff::Column::LastLoginAt, Expr::value(now))
            .col_expr(staff::Column::UpdatedAt, Expr::value(now))
            .filter(staff::Column::Id.eq(staff_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn staff_activity(
        &self,
        scope: &RestaurantScope,
        logins_since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<StaffActivity> {
        let active_staff = scoped_find::<staff::Entity>(scope)
            .filter(staff::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        let recent_logins = scoped_find::<staff::Entity>(scope)
            .filter(staff::Column::LastLoginAt.gte(logins_since))
            .count(&self.db)
            .await?;
        let locked_accounts = scoped_find::<staff::Entity>(scope)
            .filter(staff::Column::LockedUntil.gt(now))
            .count(&self.db)
            .await?;
        Ok(StaffActivity {
            active_staff,
            recent_logins,
            locked_accounts,
        })
    }
}
