//! /api/v1 路由配置
//!
//! 固定段路由必须注册在同级 `{param}` 路由之前。

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::web;

use super::analytics::{dashboard, module_report};
use super::attachments::{
    delete_attachment, download_attachment, list_attachments, upload_attachment,
};
use super::audit::list_audit;
use super::auth::{LoginLimiterConfig, login, login_rate_limiter, logout, session};
use super::sops::{
    change_sop_status, create_category, create_sop, delete_category, delete_sop, get_category,
    get_sop, list_categories, list_sops, update_category, update_sop,
};
use super::staff::{
    create_staff, deactivate_staff, get_staff, list_staff, reset_pin, update_staff,
};
use super::training::{
    create_module, delete_module, get_module, list_certificates, list_modules, list_progress,
    revoke_certificate, start_module, submit_assessment, update_module, update_progress,
    verify_certificate,
};
use super::translations::{
    change_translation_status, coverage, create_key, delete_key, get_bundle, get_key,
    get_translation, list_keys, translation_history, update_key, upsert_translation,
};
use crate::api::constants::API_PREFIX;
use crate::api::middleware::SessionAuth;

/// 认证路由 `/auth`
///
/// - POST /auth/login（带限流）
/// - POST /auth/logout
/// - GET /auth/session
pub fn auth_routes(login_limiter: &LoginLimiterConfig) -> actix_web::Scope {
    web::scope("/auth")
        .route(
            "/login",
            web::post()
                .to(login)
                .wrap(login_rate_limiter(login_limiter)),
        )
        .route("/logout", web::post().to(logout))
        .route("/session", web::get().to(session))
}

/// 员工管理 `/staff`（admin）
pub fn staff_routes() -> actix_web::Scope {
    web::scope("/staff")
        .route("", web::get().to(list_staff))
        .route("", web::post().to(create_staff))
        .route("/{id}/pin", web::put().to(reset_pin))
        .route("/{id}", web::get().to(get_staff))
        .route("/{id}", web::put().to(update_staff))
        .route("/{id}", web::delete().to(deactivate_staff))
}

/// SOP 分类 `/categories`
pub fn category_routes() -> actix_web::Scope {
    web::scope("/categories")
        .route("", web::get().to(list_categories))
        .route("", web::post().to(create_category))
        .route("/{id}", web::get().to(get_category))
        .route("/{id}", web::put().to(update_category))
        .route("/{id}", web::delete().to(delete_category))
}

/// SOP 文档 `/sops`
///
/// - GET/POST /sops
/// - GET/PUT/DELETE /sops/{id}
/// - PUT /sops/{id}/status
/// - GET/POST /sops/{id}/attachments
/// - GET/DELETE /sops/{id}/attachments/{attachment_id}
pub fn sop_routes() -> actix_web::Scope {
    web::scope("/sops")
        .route("", web::get().to(list_sops))
        .route("", web::post().to(create_sop))
        .route("/{id}/status", web::put().to(change_sop_status))
        .route("/{id}/attachments", web::get().to(list_attachments))
        .route("/{id}/attachments", web::post().to(upload_attachment))
        .route(
            "/{id}/attachments/{attachment_id}",
            web::get().to(download_attachment),
        )
        .route(
            "/{id}/attachments/{attachment_id}",
            web::delete().to(delete_attachment),
        )
        .route("/{id}", web::get().to(get_sop))
        .route("/{id}", web::put().to(update_sop))
        .route("/{id}", web::delete().to(delete_sop))
}

/// 培训 `/training`
pub fn training_routes() -> actix_web::Scope {
    web::scope("/training")
        .route("/modules", web::get().to(list_modules))
        .route("/modules", web::post().to(create_module))
        .route("/modules/{id}/start", web::post().to(start_module))
        .route("/modules/{id}/progress", web::put().to(update_progress))
        .route("/modules/{id}/submit", web::post().to(submit_assessment))
        .route("/modules/{id}", web::get().to(get_module))
        .route("/modules/{id}", web::put().to(update_module))
        .route("/modules/{id}", web::delete().to(delete_module))
        .route("/progress", web::get().to(list_progress))
        .route("/certificates", web::get().to(list_certificates))
        // verify 必须在 {id} 之前
        .route(
            "/certificates/verify/{number}",
            web::get().to(verify_certificate),
        )
        .route(
            "/certificates/{id}/revoke",
            web::post().to(revoke_certificate),
        )
}

/// 翻译 `/translations`
///
/// `/keys`、`/bundle`、`/coverage` 必须在 `/{key_id}/{locale}` 之前
pub fn translation_routes() -> actix_web::Scope {
    web::scope("/translations")
        .route("/keys", web::get().to(list_keys))
        .route("/keys", web::post().to(create_key))
        .route("/keys/{id}", web::get().to(get_key))
        .route("/keys/{id}", web::put().to(update_key))
        .route("/keys/{id}", web::delete().to(delete_key))
        .route("/bundle/{locale}", web::get().to(get_bundle))
        .route("/coverage", web::get().to(coverage))
        .route(
            "/{key_id}/{locale}/status",
            web::put().to(change_translation_status),
        )
        .route(
            "/{key_id}/{locale}/history",
            web::get().to(translation_history),
        )
        .route("/{key_id}/{locale}", web::get().to(get_translation))
        .route("/{key_id}/{locale}", web::put().to(upsert_translation))
}

/// 看板 `/analytics`（manager 以上）
pub fn analytics_routes() -> actix_web::Scope {
    web::scope("/analytics")
        .route("/dashboard", web::get().to(dashboard))
        .route("/training/{module_id}", web::get().to(module_report))
}

/// API v1 路由，整体包在会话认证中间件里
pub fn v1_routes(
    login_limiter: &LoginLimiterConfig,
) -> actix_web::Scope<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    web::scope(API_PREFIX)
        .wrap(SessionAuth)
        .service(auth_routes(login_limiter))
        .service(staff_routes())
        .service(category_routes())
        .service(sop_routes())
        .service(training_routes())
        .service(translation_routes())
        .service(analytics_routes())
        .route("/audit", web::get().to(list_audit))
}
