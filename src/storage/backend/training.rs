//! 培训模块、学习进度与证书
//!
//! 通过考核时，进度更新、旧证书作废与新证书写入在同一事务内完成。
//! 进度的计数字段只用 SQL 表达式原地更新，并发提交不会丢失。

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    ExprTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::info;

use super::{SeaOrmStorage, insert_if_absent};
use super::converters::{
    collect_models, model_to_certificate, model_to_progress, model_to_training_module,
};
use crate::errors::{Result, SopError};
use crate::storage::models::{
    CertificateStatus, ProgressStatus, TrainingCertificate, TrainingModule, TrainingProgress,
};
use crate::storage::scope::{RestaurantScope, scoped_delete, scoped_find, scoped_update};
use crate::utils::new_id;
use migration::entities::{training_certificate, training_module, training_progress};

/// 餐厅级培训汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub total_modules: u64,
    pub active_modules: u64,
    pub enrollments: u64,
    pub completions: u64,
    pub failed: u64,
    pub average_best_score: Option<f64>,
    pub active_certificates: u64,
    pub expiring_certificates: u64,
}

fn module_to_active_model(m: &TrainingModule) -> Result<training_module::ActiveModel> {
    Ok(training_module::ActiveModel {
        sop_id: Set(m.sop_id.clone()),
        title_en: Set(m.title_en.clone()),
        title_th: Set(m.title_th.clone()),
        description_en: Set(m.description_en.clone()),
        description_th: Set(m.description_th.clone()),
        questions: Set(serde_json::to_string(&m.questions)?),
        passing_score: Set(m.passing_score as i32),
        duration_minutes: Set(m.duration_minutes as i32),
        certificate_valid_days: Set(m.certificate_valid_days as i32),
        is_active: Set(m.is_active),
        updated_at: Set(m.updated_at),
        ..Default::default()
    })
}

/// 进度行不存在时插入一条 not_started 记录；(module_id, staff_id) 唯一
async fn ensure_progress_on<C: ConnectionTrait>(
    conn: &C,
    scope: &RestaurantScope,
    module_id: &str,
    staff_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let model = training_progress::ActiveModel {
        id: Set(new_id()),
        restaurant_id: Set(scope.restaurant_id().to_string()),
        module_id: Set(module_id.to_string()),
        staff_id: Set(staff_id.to_string()),
        status: Set(ProgressStatus::NotStarted.as_ref().to_string()),
        progress_percent: Set(0),
        attempts: Set(0),
        best_score: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
        updated_at: Set(now),
    };
    let result = training_progress::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                training_progress::Column::ModuleId,
                training_progress::Column::StaffId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(conn)
        .await;
    insert_if_absent(result)?;
    Ok(())
}

/// 当前员工在该模块上的进度行
fn progress_row(
    scope: &RestaurantScope,
    module_id: &str,
    staff_id: &str,
) -> sea_orm::UpdateMany<training_progress::Entity> {
    scoped_update::<training_progress::Entity>(scope)
        .filter(training_progress::Column::ModuleId.eq(module_id))
        .filter(training_progress::Column::StaffId.eq(staff_id))
}

async fn find_progress_on<C: ConnectionTrait>(
    conn: &C,
    scope: &RestaurantScope,
    module_id: &str,
    staff_id: &str,
) -> Result<TrainingProgress> {
    let model = scoped_find::<training_progress::Entity>(scope)
        .filter(training_progress::Column::ModuleId.eq(module_id))
        .filter(training_progress::Column::StaffId.eq(staff_id))
        .one(conn)
        .await?
        .ok_or_else(|| {
            SopError::not_found(format!(
                "Training progress not found for module {}",
                module_id
            ))
        })?;
    model_to_progress(model)
}

fn begin_failed(e: sea_orm::DbErr) -> SopError {
    SopError::database_operation(format!("Failed to begin transaction: {}", e))
}

fn commit_failed(e: sea_orm::DbErr) -> SopError {
    SopError::database_operation(format!("Failed to commit transaction: {}", e))
}

impl SeaOrmStorage {
    // ---- 培训模块 ----

    pub async fn insert_training_module(
        &self,
        scope: &RestaurantScope,
        m: &TrainingModule,
    ) -> Result<()> {
        let mut model = module_to_active_model(m)?;
        model.id = Set(m.id.clone());
        model.restaurant_id = Set(scope.restaurant_id().to_string());
        model.created_by = Set(m.created_by.clone());
        model.created_at = Set(m.created_at);
        model.insert(&self.db).await?;
        info!("Training module created: {}", m.id);
        Ok(())
    }

    pub async fn find_training_module(
        &self,
        scope: &RestaurantScope,
        id: &str,
    ) -> Result<Option<TrainingModule>> {
        let model = self
            .retrying("find_training_module", || async {
                scoped_find::<training_module::Entity>(scope)
                    .filter(training_module::Column::Id.eq(id))
                    .one(&self.db)
                    .await
            })
            .await?;
        model.map(model_to_training_module).transpose()
    }

    pub async fn list_training_modules(
        &self,
        scope: &RestaurantScope,
        active_only: bool,
    ) -> Result<Vec<TrainingModule>> {
        let models = self
            .retrying("list_training_modules", || async {
                let mut query = scoped_find::<training_module::Entity>(scope);
                if active_only {
                    query = query.filter(training_module::Column::IsActive.eq(true));
                }
                query
                    .order_by_asc(training_module::Column::TitleEn)
                    .all(&self.db)
                    .await
            })
            .await?;
        collect_models(models, model_to_training_module)
    }

    pub async fn update_training_module(
        &self,
        scope: &RestaurantScope,
        m: &TrainingModule,
    ) -> Result<()> {
        let result = scoped_update::<training_module::Entity>(scope)
            .set(module_to_active_model(m)?)
            .filter(training_module::Column::Id.eq(&m.id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!(
                "Training module not found: {}",
                m.id
            )));
        }
        Ok(())
    }

    pub async fn delete_training_module(&self, scope: &RestaurantScope, id: &str) -> Result<()> {
        let result = scoped_delete::<training_module::Entity>(scope)
            .filter(training_module::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!(
                "Training module not found: {}",
                id
            )));
        }
        Ok(())
    }

    // ---- 学习进度 ----

    pub async fn find_progress(
        &self,
        scope: &RestaurantScope,
        module_id: &str,
        staff_id: &str,
    ) -> Result<Option<TrainingProgress>> {
        let model = self
            .retrying("find_progress", || async {
                scoped_find::<training_progress::Entity>(scope)
                    .filter(training_progress::Column::ModuleId.eq(module_id))
                    .filter(training_progress::Column::StaffId.eq(staff_id))
                    .one(&self.db)
                    .await
            })
            .await?;
        model.map(model_to_progress).transpose()
    }

    /// `staff_id` 为 None 时返回整个餐厅的进度
    pub async fn list_progress(
        &self,
        scope: &RestaurantScope,
        staff_id: Option<&str>,
        module_id: Option<&str>,
    ) -> Result<Vec<TrainingProgress>> {
        let models = self
            .retrying("list_progress", || async {
                let mut query = scoped_find::<training_progress::Entity>(scope);
                if let Some(staff_id) = staff_id {
                    query = query.filter(training_progress::Column::StaffId.eq(staff_id));
                }
                if let Some(module_id) = module_id {
                    query = query.filter(training_progress::Column::ModuleId.eq(module_id));
                }
                query
                    .order_by_desc(training_progress::Column::UpdatedAt)
                    .all(&self.db)
                    .await
            })
            .await?;
        collect_models(models, model_to_progress)
    }

    /// 开始学习：in_progress，首次开始时记录 started_at；已完成的保持原状
    pub async fn start_progress(
        &self,
        scope: &RestaurantScope,
        module_id: &str,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TrainingProgress> {
        let txn = self.db.begin().await.map_err(begin_failed)?;
        ensure_progress_on(&txn, scope, module_id, staff_id, now).await?;

        progress_row(scope, module_id, staff_id)
            .col_expr(
                training_progress::Column::Status,
                Expr::value(ProgressStatus::InProgress.as_ref()),
            )
            .col_expr(training_progress::Column::UpdatedAt, Expr::value(now))
            .filter(training_progress::Column::Status.ne(ProgressStatus::Completed.as_ref()))
            .exec(&txn)
            .await?;
        progress_row(scope, module_id, staff_id)
            .col_expr(training_progress::Column::StartedAt, Expr::value(now))
            .filter(training_progress::Column::StartedAt.is_null())
            .exec(&txn)
            .await?;

        let progress = find_progress_on(&txn, scope, module_id, staff_id).await?;
        txn.commit().await.map_err(commit_failed)?;
        Ok(progress)
    }

    /// 只在新值更大且已开始时写入；返回写入后的进度（未开始为 None）
    pub async fn advance_progress(
        &self,
        scope: &RestaurantScope,
        module_id: &str,
        staff_id: &str,
        percent: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<TrainingProgress>> {
        progress_row(scope, module_id, staff_id)
            .col_expr(
                training_progress::Column::ProgressPercent,
                Expr::value(percent as i32),
            )
            .col_expr(training_progress::Column::UpdatedAt, Expr::value(now))
            .filter(training_progress::Column::Status.ne(ProgressStatus::NotStarted.as_ref()))
            .filter(training_progress::Column::ProgressPercent.lt(percent as i32))
            .exec(&self.db)
            .await?;
        Ok(self
            .find_progress(scope, module_id, staff_id)
            .await?
            .filter(|p| p.status != ProgressStatus::NotStarted))
    }

    /// 记录一次考核：attempts、best_score 用 SQL 表达式原地更新。
    /// `certificate` 存在即视为通过；同模块同员工的有效旧证书一并作废。
    pub async fn record_assessment(
        &self,
        scope: &RestaurantScope,
        module_id: &str,
        staff_id: &str,
        score: u32,
        certificate: Option<&TrainingCertificate>,
        now: DateTime<Utc>,
    ) -> Result<TrainingProgress> {
        let txn = self.db.begin().await.map_err(begin_failed)?;
        ensure_progress_on(&txn, scope, module_id, staff_id, now).await?;

        progress_row(scope, module_id, staff_id)
            .col_expr(
                training_progress::Column::Attempts,
                Expr::col(training_progress::Column::Attempts).add(1),
            )
            .col_expr(training_progress::Column::UpdatedAt, Expr::value(now))
            .exec(&txn)
            .await?;
        progress_row(scope, module_id, staff_id)
            .col_expr(training_progress::Column::BestScore, Expr::value(score as i32))
            .filter(
                Condition::any()
                    .add(training_progress::Column::BestScore.is_null())
                    .add(training_progress::Column::BestScore.lt(score as i32)),
            )
            .exec(&txn)
            .await?;
        progress_row(scope, module_id, staff_id)
            .col_expr(training_progress::Column::StartedAt, Expr::value(now))
            .filter(training_progress::Column::StartedAt.is_null())
            .exec(&txn)
            .await?;

        if certificate.is_some() {
            progress_row(scope, module_id, staff_id)
                .col_expr(
                    training_progress::Column::Status,
                    Expr::value(ProgressStatus::Completed.as_ref()),
                )
                .col_expr(training_progress::Column::ProgressPercent, Expr::value(100))
                .col_expr(training_progress::Column::CompletedAt, Expr::value(now))
                .exec(&txn)
                .await?;
        } else {
            // 已完成的模块重考失败不撤销完成状态
            progress_row(scope, module_id, staff_id)
                .col_expr(
                    training_progress::Column::Status,
                    Expr::value(ProgressStatus::Failed.as_ref()),
                )
                .filter(training_progress::Column::Status.ne(ProgressStatus::Completed.as_ref()))
                .exec(&txn)
                .await?;
        }

        if let Some(cert) = certificate {
            let superseded = scoped_update::<training_certificate::Entity>(scope)
                .col_expr(
                    training_certificate::Column::Status,
                    Expr::value(CertificateStatus::Revoked.as_ref()),
                )
                .filter(training_certificate::Column::ModuleId.eq(module_id))
                .filter(training_certificate::Column::StaffId.eq(staff_id))
                .filter(training_certificate::Column::Status.eq(CertificateStatus::Active.as_ref()))
                .exec(&txn)
                .await?;

            training_certificate::ActiveModel {
                id: Set(cert.id.clone()),
                restaurant_id: Set(scope.restaurant_id().to_string()),
                module_id: Set(module_id.to_string()),
                staff_id: Set(staff_id.to_string()),
                certificate_number: Set(cert.certificate_number.clone()),
                score: Set(cert.score as i32),
                issued_at: Set(cert.issued_at),
                expires_at: Set(cert.expires_at),
                status: Set(cert.status.as_ref().to_string()),
            }
            .insert(&txn)
            .await?;

            info!(
                "Certificate {} issued to {} (superseded {})",
                cert.certificate_number, staff_id, superseded.rows_affected
            );
        }

        let progress = find_progress_on(&txn, scope, module_id, staff_id).await?;
        txn.commit().await.map_err(commit_failed)?;
        Ok(progress)
    }

    // ---- 证书 ----

    pub async fn find_certificate(
        &self,
        scope: &RestaurantScope,
        id: &str,
    ) -> Result<Option<TrainingCertificate>> {
        let model = scoped_find::<training_certificate::Entity>(scope)
            .filter(training_certificate::Column::Id.eq(id))
            .one(&self.db)
            .await?;
        model.map(model_to_certificate).transpose()
    }

    pub async fn find_certificate_by_number(
        &self,
        scope: &RestaurantScope,
        number: &str,
    ) -> Result<Option<TrainingCertificate>> {
        let model = scoped_find::<training_certificate::Entity>(scope)
            .filter(training_certificate::Column::CertificateNumber.eq(number))
            .one(&self.db)
            .await?;
        model.map(model_to_certificate).transpose()
    }

    pub async fn list_certificates(
        &self,
        scope: &RestaurantScope,
        staff_id: Option<&str>,
    ) -> Result<Vec<TrainingCertificate>> {
        let models = self
            .retrying("list_certificates", || async {
                let mut query = scoped_find::<training_certificate::Entity>(scope);
                if let Some(staff_id) = staff_id {
                    query = query.filter(training_certificate::Column::StaffId.eq(staff_id));
                }
                query
                    .order_by_desc(training_certificate::Column::IssuedAt)
                    .all(&self.db)
                    .await
            })
            .await?;
        collect_models(models, model_to_certificate)
    }

    pub async fn revoke_certificate(&self, scope: &RestaurantScope, id: &str) -> Result<()> {
        let result = scoped_update::<training_certificate::Entity>(scope)
            .col_expr(
                training_certificate::Column::Status,
                Expr::value(CertificateStatus::Revoked.as_ref()),
            )
            .filter(training_certificate::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("Certificate not found: {}", id)));
        }
        info!("Certificate revoked: {}", id);
        Ok(())
    }

    // ---- 统计 ----

    pub async fn training_summary(
        &self,
        scope: &RestaurantScope,
        now: DateTime<Utc>,
        expiring_before: DateTime<Utc>,
    ) -> Result<TrainingSummary> {
        let total_modules = scoped_find::<training_module::Entity>(scope)
            .count(&self.db)
            .await?;
        let active_modules = scoped_find::<training_module::Entity>(scope)
            .filter(training_module::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        // AVG 在各数据库上返回类型不一致，取出后在内存中汇总
        let rows: Vec<(String, Option<i32>)> = scoped_find::<training_progress::Entity>(scope)
            .select_only()
            .column(training_progress::Column::Status)
            .column(training_progress::Column::BestScore)
            .into_tuple()
            .all(&self.db)
            .await?;

        let completed = ProgressStatus::Completed.as_ref();
        let failed = ProgressStatus::Failed.as_ref();
        let scores: Vec<i32> = rows.iter().filter_map(|(_, score)| *score).collect();
        let average_best_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64)
        };

        let active_certs = scoped_find::<training_certificate::Entity>(scope)
            .filter(training_certificate::Column::Status.eq(CertificateStatus::Active.as_ref()))
            .filter(training_certificate::Column::ExpiresAt.gt(now));
        let active_certificates = active_certs.clone().count(&self.db).await?;
        let expiring_certificates = active_certs
            .filter(training_certificate::Column::ExpiresAt.lte(expiring_before))
            .count(&self.db)
            .await?;

        Ok(TrainingSummary {
            total_modules,
            active_modules,
            enrollments: rows.len() as u64,
            completions: rows.iter().filter(|(s, _)| s == completed).count() as u64,
            failed: rows.iter().filter(|(s, _)| s == failed).count() as u64,
            average_best_score,
            active_certificates,
            expiring_certificates,
        })
    }
}
