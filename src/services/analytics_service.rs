//! 餐厅运营看板与单个培训模块报表

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::context::Actor;
use super::translation_service::{LocaleCoverage, locale_coverage};
use crate::errors::{Result, SopError};
use crate::storage::{
    ProgressStatus, Role, SeaOrmStorage, SopStatus, StaffActivity, TrainingProgress,
};

/// 证书即将到期的提前提醒窗口
pub const EXPIRING_WINDOW_DAYS: i64 = 30;
/// 近期登录统计窗口
pub const ACTIVITY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: SopStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category_id: String,
    pub code: Option<String>,
    pub name_en: Option<String>,
    pub name_th: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SopStats {
    pub total: u64,
    pub by_status: Vec<StatusCount>,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingStats {
    pub total_modules: u64,
    pub active_modules: u64,
    pub enrollments: u64,
    pub completions: u64,
    pub failed: u64,
    pub completion_rate: f64,
    pub average_best_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateStats {
    pub active: u64,
    pub expiring_soon: u64,
    pub window_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub sops: SopStats,
    pub training: TrainingStats,
    pub certificates: CertificateStats,
    pub staff: StaffActivity,
    pub translations: Vec<LocaleCoverage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModuleReport {
    pub module_id: String,
    pub title_en: String,
    pub title_th: String,
    pub enrolled: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
    pub completion_rate: f64,
    pub average_score: Option<f64>,
    pub pass_rate: f64,
}

/// 百分比，保留一位小数；分母为 0 时为 0
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 由模块的全部进度记录汇总报表数据
pub fn summarize_progress(progress: &[TrainingProgress]) -> (u64, u64, u64, u64, Option<f64>, f64) {
    let count = |status: ProgressStatus| progress.iter().filter(|p| p.status == status).count() as u64;
    let enrolled = progress.len() as u64;
    let in_progress = count(ProgressStatus::InProgress);
    let completed = count(ProgressStatus::Completed);
    let failed = count(ProgressStatus::Failed);

    let scores: Vec<u32> = progress.iter().filter_map(|p| p.best_score).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(round1(
            scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64,
        ))
    };
    // 参加过考核的人中通过的比例
    let attempted = progress.iter().filter(|p| p.attempts > 0).count() as u64;
    let pass_rate = percentage(completed, attempted);

    (enrolled, in_progress, completed, failed, average_score, pass_rate)
}

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
        actor.require(Role::Manager)?;
        let scope = &actor.scope;
        let now = Utc::now();

        let by_status: Vec<StatusCount> = self
            .storage
            .count_sops_by_status(scope)
            .await?
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        let categories: HashMap<String, _> = self
            .storage
            .list_categories(scope, true)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let mut by_category: Vec<CategoryCount> = self
            .storage
            .count_sops_by_category(scope)
            .await?
            .into_iter()
            .map(|(category_id, count)| {
                let category = categories.get(&category_id);
                CategoryCount {
                    code: category.map(|c| c.code.clone()),
                    name_en: category.map(|c| c.name_en.clone()),
                    name_th: category.map(|c| c.name_th.clone()),
                    category_id,
                    count,
                }
            })
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));

        let summary = self
            .storage
            .training_summary(scope, now, now + Duration::days(EXPIRING_WINDOW_DAYS))
            .await?;
        let staff = self
            .storage
            .staff_activity(scope, now - Duration::days(ACTIVITY_WINDOW_DAYS), now)
            .await?;
        let translations = locale_coverage(&self.storage, scope).await?;

        Ok(Dashboard {
            generated_at: now,
            sops: SopStats {
                total: by_status.iter().map(|s| s.count).sum(),
                by_status,
                by_category,
            },
            training: TrainingStats {
                total_modules: summary.total_modules,
                active_modules: summary.active_modules,
                enrollments: summary.enrollments,
                completions: summary.completions,
                failed: summary.failed,
                completion_rate: percentage(summary.completions, summary.enrollments),
                average_best_score: summary.average_best_score.map(round1),
            },
            certificates: CertificateStats {
                active: summary.active_certificates,
                expiring_soon: summary.expiring_certificates,
                window_days: EXPIRING_WINDOW_DAYS,
            },
            staff,
            translations,
        })
    }

    pub async fn module_report(&self, actor: &Actor, module_id: &str) -> Result<ModuleReport> {
        actor.require(Role::Manager)?;
        let module = self
            .storage
            .find_training_module(&actor.scope, module_id)
            .await?
            .ok_or_else(|| {
                SopError::not_found(format!("Training module not found: {}", module_id))
            })?;
        let progress = self
            .storage
            .list_progress(&actor.scope, None, Some(module_id))
            .await?;
        let (enrolled, in_progress, completed, failed, average_score, pass_rate) =
            summarize_progress(&progress);

        Ok(ModuleReport {
            module_id: module.id,
            title_en: module.title_en,
            title_th: module.title_th,
            enrolled,
            in_progress,
            completed,
            failed,
            completion_rate: percentage(completed, enrolled),
            average_score,
            pass_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(status: ProgressStatus, attempts: u32, best: Option<u32>) -> TrainingProgress {
        TrainingProgress {
            id: crate::utils::new_id(),
            restaurant_id: "r".into(),
            module_id: "m".into(),
            staff_id: crate::utils::new_id(),
            status,
            progress_percent: 0,
            attempts,
            best_score: best,
            started_at: None,
            completed_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(4, 4), 100.0);
    }

    #[test]
    fn test_summarize_progress() {
        let rows = vec![
            progress(ProgressStatus::Completed, 1, Some(90)),
            progress(ProgressStatus::Failed, 2, Some(60)),
            progress(ProgressStatus::InProgress, 0, None),
            progress(ProgressStatus::NotStarted, 0, None),
        ];
        let (enrolled, in_progress, completed, failed, average, pass_rate) =
            summarize_progress(&rows);
        assert_eq!((enrolled, in_progress, completed, failed), (4, 1, 1, 1));
        assert_eq!(average, Some(75.0));
        assert_eq!(pass_rate, 50.0);
    }

    #[test]
    fn test_summarize_empty() {
        let (enrolled, _, _, _, average, pass_rate) = summarize_progress(&[]);
        assert_eq!(enrolled, 0);
        assert_eq!(average, None);
        assert_eq!(pass_rate, 0.0);
    }
}
