//! 培训模块、学习进度、测验与证书

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::api::extractors::Authenticated;
use crate::errors::Result;
use crate::services::TrainingService;
use crate::storage::Role;

use super::helpers::{created_response, success_response};
use super::types::{
    CertificateQuery, MessageResponse, ModuleBody, ProgressBody, ProgressQuery, SubmitBody,
};

// ============ Modules ============

/// manager 以上看到完整题目（含答案），普通员工只看到启用模块的题面
pub async fn list_modules(
    actor: Authenticated,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    if actor.role.at_least(Role::Manager) {
        Ok(success_response(training.list_modules(&actor).await?))
    } else {
        Ok(success_response(training.list_module_views(&actor).await?))
    }
}

pub async fn get_module(
    actor: Authenticated,
    path: web::Path<String>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    if actor.role.at_least(Role::Manager) {
        Ok(success_response(training.get_module(&actor, &path).await?))
    } else {
        Ok(success_response(training.get_module_view(&actor, &path).await?))
    }
}

pub async fn create_module(
    actor: Authenticated,
    body: web::Json<ModuleBody>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    let module = training
        .create_module(&actor, body.into_inner().into())
        .await?;
    Ok(created_response(module))
}

pub async fn update_module(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<ModuleBody>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    let module = training
        .update_module(&actor, &path, body.into_inner().into())
        .await?;
    Ok(success_response(module))
}

pub async fn delete_module(
    actor: Authenticated,
    path: web::Path<String>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    training.delete_module(&actor, &path).await?;
    Ok(success_response(MessageResponse {
        message: "Training module deleted".to_string(),
    }))
}

// ============ Progress ============

pub async fn start_module(
    actor: Authenticated,
    path: web::Path<String>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    Ok(success_response(training.start_module(&actor, &path).await?))
}

pub async fn update_progress(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<ProgressBody>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    let progress = training
        .update_progress(&actor, &path, body.progress_percent)
        .await?;
    Ok(success_response(progress))
}

pub async fn submit_assessment(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<SubmitBody>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    let result = training
        .submit_assessment(&actor, &path, &body.answers)
        .await?;
    Ok(success_response(result))
}

/// `?mine=true` 或普通员工只返回自己的记录
pub async fn list_progress(
    actor: Authenticated,
    query: web::Query<ProgressQuery>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    if query.mine || !actor.role.at_least(Role::Manager) {
        return Ok(success_response(training.my_progress(&actor).await?));
    }
    let progress = training
        .list_progress(
            &actor,
            query.staff_id.as_deref(),
            query.module_id.as_deref(),
        )
        .await?;
    Ok(success_response(progress))
}

// ============ Certificates ============

pub async fn list_certificates(
    actor: Authenticated,
    query: web::Query<CertificateQuery>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    if query.mine || !actor.role.at_least(Role::Manager) {
        return Ok(success_response(training.my_certificates(&actor).await?));
    }
    let certificates = training
        .list_certificates(&actor, query.staff_id.as_deref())
        .await?;
    Ok(success_response(certificates))
}

pub async fn verify_certificate(
    actor: Authenticated,
    path: web::Path<String>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    Ok(success_response(
        training.verify_certificate(&actor, &path).await?,
    ))
}

pub async fn revoke_certificate(
    actor: Authenticated,
    path: web::Path<String>,
    training: web::Data<Arc<TrainingService>>,
) -> Result<HttpResponse> {
    Ok(success_response(
        training.revoke_certificate(&actor, &path).await?,
    ))
}
