//! 健康检查端点
//!
//! 不经过会话认证，供负载均衡与 k8s probe 使用。

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use tracing::{info, trace, warn};

use crate::services::HealthService;

use super::v1::ErrorCode;
use super::v1::helpers::json_response;

/// 完整健康报告；数据库不可用时返回 503
pub async fn health_check(health: web::Data<Arc<HealthService>>) -> impl Responder {
    trace!("Received health check request");
    let report = health.report().await;

    if report.is_healthy() {
        info!(
            "Health check completed in {}ms, uptime {}s",
            report.response_time_ms, report.uptime_secs
        );
        json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(report))
    } else {
        warn!("Health check failed: {:?}", report.database.error);
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ServiceUnavailable,
            "Service Unavailable",
            Some(report),
        )
    }
}

// 进程存活即可
pub async fn liveness_check() -> impl Responder {
    trace!("Received liveness check request");
    HttpResponse::NoContent().finish()
}

pub async fn readiness_check(health: web::Data<Arc<HealthService>>) -> impl Responder {
    trace!("Received readiness check request");
    if health.ready().await {
        HttpResponse::Ok()
            .append_header(("Content-Type", "text/plain"))
            .body("OK")
    } else {
        HttpResponse::ServiceUnavailable()
            .append_header(("Content-Type", "text/plain"))
            .body("database unavailable")
    }
}

/// Health 路由 `/health`
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(health_check))
        .route("", web::head().to(health_check))
        .route("/ready", web::get().to(readiness_check))
        .route("/ready", web::head().to(readiness_check))
        .route("/live", web::get().to(liveness_check))
        .route("/live", web::head().to(liveness_check))
}
