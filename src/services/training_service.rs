//! 培训模块、学习进度、考核与证书
//!
//! 考核得分 = round(答对数 * 100 / 题目数)，达到及格线即完成并颁发证书；
//! 同一模块同一员工只保留一张有效证书。

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::audit_service::{AuditEvent, AuditService, actions};
use super::context::Actor;
use crate::errors::{Result, SopError};
use crate::storage::{
    CertificateStatus, QuestionOption, Role, SeaOrmStorage, TrainingCertificate,
    TrainingModule, TrainingProgress, TrainingQuestion,
};
use crate::utils::{generate_certificate_number, new_id};

pub const DEFAULT_PASSING_SCORE: u32 = 80;
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_CERTIFICATE_VALID_DAYS: u32 = 365;
/// 证书有效期上限（约十年）
pub const MAX_CERTIFICATE_VALID_DAYS: u32 = 3650;
/// 单个模块学习时长上限（一天）
pub const MAX_DURATION_MINUTES: u32 = 1440;

#[derive(Debug, Clone, Default)]
pub struct ModuleInput {
    pub sop_id: Option<String>,
    pub title_en: String,
    pub title_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub questions: Vec<TrainingQuestion>,
    pub passing_score: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub certificate_valid_days: Option<u32>,
    pub is_active: Option<bool>,
}

/// 发给员工的题目（不含正确答案）
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub prompt_en: String,
    pub prompt_th: String,
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    pub id: String,
    pub sop_id: Option<String>,
    pub title_en: String,
    pub title_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub questions: Vec<QuestionView>,
    pub passing_score: u32,
    pub duration_minutes: u32,
    pub certificate_valid_days: u32,
}

impl From<TrainingModule> for ModuleView {
    fn from(m: TrainingModule) -> Self {
        Self {
            questions: m
                .questions
                .into_iter()
                .map(|q| QuestionView {
                    prompt_en: q.prompt_en,
                    prompt_th: q.prompt_th,
                    options: q.options,
                })
                .collect(),
            id: m.id,
            sop_id: m.sop_id,
            title_en: m.title_en,
            title_th: m.title_th,
            description_en: m.description_en,
            description_th: m.description_th,
            passing_score: m.passing_score,
            duration_minutes: m.duration_minutes,
            certificate_valid_days: m.certificate_valid_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub score: u32,
    pub passed: bool,
    pub correct: usize,
    pub total: usize,
    pub progress: TrainingProgress,
    pub certificate: Option<TrainingCertificate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateVerification {
    pub certificate: TrainingCertificate,
    pub valid: bool,
}

/// round(correct * 100 / total)，四舍五入
pub fn score_answers(questions: &[TrainingQuestion], answers: &[usize]) -> Result<(usize, u32)> {
    if questions.is_empty() {
        return Err(SopError::validation("Module has no questions"));
    }
    if answers.len() != questions.len() {
        return Err(SopError::assessment_mismatch(format!(
            "Expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.correct_index == **a)
        .count();
    let total = questions.len();
    let score = ((correct * 100 + total / 2) / total) as u32;
    Ok((correct, score))
}

pub fn validate_questions(questions: &[TrainingQuestion]) -> Result<()> {
    if questions.is_empty() {
        return Err(SopError::validation("A module needs at least one question"));
    }
    for (i, q) in questions.iter().enumerate() {
        let n = i + 1;
        if q.prompt_en.trim().is_empty() || q.prompt_th.trim().is_empty() {
            return Err(SopError::validation(format!(
                "Question {} needs both English and Thai prompts",
                n
            )));
        }
        if q.options.len() < 2 {
            return Err(SopError::validation(format!(
                "Question {} needs at least two options",
                n
            )));
        }
        if q.correct_index >= q.options.len() {
            return Err(SopError::validation(format!(
                "Question {} has correct_index {} but only {} options",
                n,
                q.correct_index,
                q.options.len()
            )));
        }
        if q
            .options
            .iter()
            .any(|o| o.text_en.trim().is_empty() || o.text_th.trim().is_empty())
        {
            return Err(SopError::validation(format!(
                "Question {} has an empty option",
                n
            )));
        }
    }
    Ok(())
}

fn build_module_fields(input: &ModuleInput) -> Result<(u32, u32, u32)> {
    validate_questions(&input.questions)?;
    if input.title_en.trim().is_empty() || input.title_th.trim().is_empty() {
        return Err(SopError::validation("Module needs English and Thai titles"));
    }
    let passing = input.passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
    if passing > 100 {
        return Err(SopError::validation("passing_score must be within 0..=100"));
    }
    let duration = input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    let valid_days = input
        .certificate_valid_days
        .unwrap_or(DEFAULT_CERTIFICATE_VALID_DAYS);
    if !(1..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(SopError::validation(format!(
            "duration_minutes must be within 1..={}",
            MAX_DURATION_MINUTES
        )));
    }
    if !(1..=MAX_CERTIFICATE_VALID_DAYS).contains(&valid_days) {
        return Err(SopError::validation(format!(
            "certificate_valid_days must be within 1..={}",
            MAX_CERTIFICATE_VALID_DAYS
        )));
    }
    Ok((passing, duration, valid_days))
}

pub struct TrainingService {
    storage: Arc<SeaOrmStorage>,
    audit: Arc<AuditService>,
}

impl TrainingService {
    pub fn new(storage: Arc<SeaOrmStorage>, audit: Arc<AuditService>) -> Self {
        Self { storage, audit }
    }

    // ============ Modules ============

    async fn ensure_sop(&self, actor: &Actor, sop_id: Option<&str>) -> Result<()> {
        if let Some(sop_id) = sop_id
            && self.storage.find_sop(&actor.scope, sop_id).await?.is_none()
        {
            return Err(SopError::validation(format!("Unknown SOP: {}", sop_id)));
        }
        Ok(())
    }

    pub async fn create_module(&self, actor: &Actor, input: ModuleInput) -> Result<TrainingModule> {
        actor.require(Role::Manager)?;
        let (passing_score, duration_minutes, certificate_valid_days) =
            build_module_fields(&input)?;
        self.ensure_sop(actor, input.sop_id.as_deref()).await?;

        let now = Utc::now();
        let module = TrainingModule {
            id: new_id(),
            restaurant_id: actor.scope.restaurant_id().to_string(),
            sop_id: input.sop_id,
            title_en: input.title_en.trim().to_string(),
            title_th: input.title_th.trim().to_string(),
            description_en: input.description_en,
            description_th: input.description_th,
            questions: input.questions,
            passing_score,
            duration_minutes,
            certificate_valid_days,
            is_active: input.is_active.unwrap_or(true),
            created_by: Some(actor.staff_id.clone()),
            created_at: now,
            updated_at: now,
        };
        self.storage
            .insert_training_module(&actor.scope, &module)
            .await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::MODULE_CREATED, "training_module")
                    .resource(&module.id)
                    .by(actor),
            )
            .await;
        Ok(module)
    }

    pub async fn update_module(
        &self,
        actor: &Actor,
        id: &str,
        input: ModuleInput,
    ) -> Result<TrainingModule> {
        actor.require(Role::Manager)?;
        let existing = self.get_module(actor, id).await?;
        let (passing_score, duration_minutes, certificate_valid_days) =
            build_module_fields(&input)?;
        self.ensure_sop(actor, input.sop_id.as_deref()).await?;

        let module = TrainingModule {
            sop_id: input.sop_id,
            title_en: input.title_en.trim().to_string(),
            title_th: input.title_th.trim().to_string(),
            description_en: input.description_en,
            description_th: input.description_th,
            questions: input.questions,
            passing_score,
            duration_minutes,
            certificate_valid_days,
            is_active: input.is_active.unwrap_or(existing.is_active),
            updated_at: Utc::now(),
            ..existing
        };
        self.storage
            .update_training_module(&actor.scope, &module)
            .await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::MODULE_UPDATED, "training_module")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(module)
    }

    pub async fn delete_module(&self, actor: &Actor, id: &str) -> Result<()> {
        actor.require(Role::Manager)?;
        self.storage.delete_training_module(&actor.scope, id).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::MODULE_DELETED, "training_module")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(())
    }

    /// 完整模块（含答案），manager 以上
    pub async fn get_module(&self, actor: &Actor, id: &str) -> Result<TrainingModule> {
        actor.require(Role::Manager)?;
        self.storage
            .find_training_module(&actor.scope, id)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Training module not found: {}", id)))
    }

    async fn active_module(&self, actor: &Actor, id: &str) -> Result<TrainingModule> {
        self.storage
            .find_training_module(&actor.scope, id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| SopError::not_found(format!("Training module not found: {}", id)))
    }

    /// 员工视角：只含启用模块，不含答案
    pub async fn get_module_view(&self, actor: &Actor, id: &str) -> Result<ModuleView> {
        Ok(self.active_module(actor, id).await?.into())
    }

    pub async fn list_modules(&self, actor: &Actor) -> Result<Vec<TrainingModule>> {
        actor.require(Role::Manager)?;
        self.storage.list_training_modules(&actor.scope, false).await
    }

    pub async fn list_module_views(&self, actor: &Actor) -> Result<Vec<ModuleView>> {
        Ok(self
            .storage
            .list_training_modules(&actor.scope, true)
            .await?
            .into_iter()
            .map(ModuleView::from)
            .collect())
    }

    // ============ Progress ============

    /// 开始学习；已完成的模块保持原状
    pub async fn start_module(&self, actor: &Actor, module_id: &str) -> Result<TrainingProgress> {
        self.active_module(actor, module_id).await?;
        self.storage
            .start_progress(&actor.scope, module_id, &actor.staff_id, Utc::now())
            .await
    }

    /// 进度只增不减
    pub async fn update_progress(
        &self,
        actor: &Actor,
        module_id: &str,
        percent: u32,
    ) -> Result<TrainingProgress> {
        if percent > 100 {
            return Err(SopError::validation("progress_percent must be within 0..=100"));
        }
        self.storage
            .advance_progress(&actor.scope, module_id, &actor.staff_id, percent, Utc::now())
            .await?
            .ok_or_else(|| SopError::validation("Module has not been started"))
    }

    pub async fn submit_assessment(
        &self,
        actor: &Actor,
        module_id: &str,
        answers: &[usize],
    ) -> Result<AssessmentResult> {
        let module = self.active_module(actor, module_id).await?;
        let (correct, score) = score_answers(&module.questions, answers)?;
        let passed = score >= module.passing_score;

        let now = Utc::now();
        let certificate = if passed {
            let expires_at = now
                .checked_add_signed(Duration::days(i64::from(module.certificate_valid_days)))
                .ok_or_else(|| {
                    SopError::validation("certificate_valid_days is out of range")
                })?;
            Some(TrainingCertificate {
                id: new_id(),
                restaurant_id: actor.scope.restaurant_id().to_string(),
                module_id: module_id.to_string(),
                staff_id: actor.staff_id.clone(),
                certificate_number: generate_certificate_number(now),
                score,
                issued_at: now,
                expires_at,
                status: CertificateStatus::Active,
            })
        } else {
            None
        };

        let progress = self
            .storage
            .record_assessment(
                &actor.scope,
                module_id,
                &actor.staff_id,
                score,
                certificate.as_ref(),
                now,
            )
            .await?;

        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::ASSESSMENT_SUBMITTED, "training_module")
                    .resource(module_id)
                    .by(actor)
                    .metadata(json!({ "score": score, "passed": passed, "attempt": progress.attempts })),
            )
            .await;
        if let Some(cert) = &certificate {
            self.audit
                .record(
                    &actor.scope,
                    AuditEvent::new(actions::CERTIFICATE_ISSUED, "training_certificate")
                        .resource(&cert.id)
                        .by(actor)
                        .metadata(json!({ "certificate_number": cert.certificate_number })),
                )
                .await;
        }
        info!(
            "Staff {} scored {} on module {} ({})",
            actor.staff_id,
            score,
            module_id,
            if passed { "passed" } else { "failed" }
        );

        Ok(AssessmentResult {
            score,
            passed,
            correct,
            total: module.questions.len(),
            progress,
            certificate,
        })
    }

    pub async fn my_progress(&self, actor: &Actor) -> Result<Vec<TrainingProgress>> {
        self.storage
            .list_progress(&actor.scope, Some(&actor.staff_id), None)
            .await
    }

    pub async fn list_progress(
        &self,
        actor: &Actor,
        staff_id: Option<&str>,
        module_id: Option<&str>,
    ) -> Result<Vec<TrainingProgress>> {
        actor.require(Role::Manager)?;
        self.storage
            .list_progress(&actor.scope, staff_id, module_id)
            .await
    }

    // ============ Certificates ============

    pub async fn my_certificates(&self, actor: &Actor) -> Result<Vec<TrainingCertificate>> {
        self.storage
            .list_certificates(&actor.scope, Some(&actor.staff_id))
            .await
    }

    pub async fn list_certificates(
        &self,
        actor: &Actor,
        staff_id: Option<&str>,
    ) -> Result<Vec<TrainingCertificate>> {
        actor.require(Role::Manager)?;
        self.storage.list_certificates(&actor.scope, staff_id).await
    }

    /// 本餐厅任何已登录员工都可验证证书编号
    pub async fn verify_certificate(
        &self,
        actor: &Actor,
        number: &str,
    ) -> Result<CertificateVerification> {
        let certificate = self
            .storage
            .find_certificate_by_number(&actor.scope, number.trim())
            .await?
            .ok_or_else(|| SopError::not_found(format!("Certificate not found: {}", number)))?;
        let valid = certificate.is_valid(Utc::now());
        Ok(CertificateVerification { certificate, valid })
    }

    pub async fn revoke_certificate(&self, actor: &Actor, id: &str) -> Result<TrainingCertificate> {
        actor.require(Role::Manager)?;
        let mut certificate = self
            .storage
            .find_certificate(&actor.scope, id)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Certificate not found: {}", id)))?;
        if certificate.status == CertificateStatus::Revoked {
            return Ok(certificate);
        }
        self.storage.revoke_certificate(&actor.scope, id).await?;
        certificate.status = CertificateStatus::Revoked;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::CERTIFICATE_REVOKED, "training_certificate")
                    .resource(id)
                    .by(actor)
                    .metadata(json!({ "certificate_number": certificate.certificate_number })),
            )
            .await;
        Ok(certificate)
    }
}
