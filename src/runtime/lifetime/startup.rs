//! 服务装配
//!
//! 存储、缓存与各业务服务只在这里构建一次，HTTP 服务器和集成测试共用。

use actix_web::http::StatusCode;
use actix_web::{error, web};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::jwt::JwtService;
use crate::api::services::v1::ErrorCode;
use crate::api::services::v1::helpers::json_response;
use crate::api::services::{LoginLimiterConfig, health_routes, v1_routes};
use crate::cache::build_bundle_cache;
use crate::config::AppConfig;
use crate::services::{
    AnalyticsService, AttachmentService, AuditService, AuthPolicy, AuthService, HealthService,
    SopService, StaffService, TrainingService, TranslationService,
};
use crate::storage::SeaOrmStorage;

/// JSON 请求体上限（附件走 multipart，不受此限制）
const JSON_LIMIT_BYTES: usize = 1024 * 1024;

/// 所有共享服务
#[derive(Clone)]
pub struct AppServices {
    pub storage: Arc<SeaOrmStorage>,
    pub jwt: Arc<JwtService>,
    pub audit: Arc<AuditService>,
    pub auth: Arc<AuthService>,
    pub staff: Arc<StaffService>,
    pub attachments: Arc<AttachmentService>,
    pub sops: Arc<SopService>,
    pub training: Arc<TrainingService>,
    pub translations: Arc<TranslationService>,
    pub analytics: Arc<AnalyticsService>,
    pub health: Arc<HealthService>,
}

impl AppServices {
    pub fn build(storage: Arc<SeaOrmStorage>, config: &AppConfig) -> Self {
        let audit = Arc::new(AuditService::new(storage.clone()));
        let attachments = Arc::new(AttachmentService::new(
            storage.clone(),
            audit.clone(),
            &config.storage,
        ));
        let bundle_cache = build_bundle_cache(&config.cache);
        debug!(
            "Translation bundle cache: ttl={}s, max_entries={}",
            config.cache.translation_ttl_secs, config.cache.translation_max_entries
        );

        let services = Self {
            jwt: Arc::new(JwtService::from_config(&config.auth)),
            auth: Arc::new(AuthService::new(
                storage.clone(),
                audit.clone(),
                AuthPolicy::from_config(&config.auth),
            )),
            staff: Arc::new(StaffService::new(storage.clone(), audit.clone())),
            sops: Arc::new(SopService::new(
                storage.clone(),
                audit.clone(),
                attachments.clone(),
            )),
            training: Arc::new(TrainingService::new(storage.clone(), audit.clone())),
            translations: Arc::new(TranslationService::new(
                storage.clone(),
                audit.clone(),
                bundle_cache,
            )),
            analytics: Arc::new(AnalyticsService::new(storage.clone())),
            health: Arc::new(HealthService::new(storage.clone())),
            attachments,
            audit,
            storage,
        };
        info!(
            "Services initialized on {} backend",
            services.storage.backend_name()
        );
        services
    }

    /// 注册共享数据、提取器配置与全部路由
    pub fn configure(&self, cfg: &mut web::ServiceConfig, login_limiter: &LoginLimiterConfig) {
        cfg.app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(self.jwt.clone()))
            .app_data(web::Data::new(self.audit.clone()))
            .app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.staff.clone()))
            .app_data(web::Data::new(self.attachments.clone()))
            .app_data(web::Data::new(self.sops.clone()))
            .app_data(web::Data::new(self.training.clone()))
            .app_data(web::Data::new(self.translations.clone()))
            .app_data(web::Data::new(self.analytics.clone()))
            .app_data(web::Data::new(self.health.clone()))
            .app_data(
                web::JsonConfig::default()
                    .limit(JSON_LIMIT_BYTES)
                    .error_handler(|err, _req| bad_request(err.to_string(), err)),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _req| bad_request(err.to_string(), err)),
            )
            .app_data(
                web::PathConfig::default()
                    .error_handler(|err, _req| bad_request(err.to_string(), err)),
            )
            .service(health_routes())
            .service(v1_routes(login_limiter));
    }
}

/// 提取器失败时仍然返回统一的 JSON 信封
fn bad_request<E>(message: String, cause: E) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let response = json_response::<()>(
        StatusCode::BAD_REQUEST,
        ErrorCode::BadRequest,
        message,
        None,
    );
    error::InternalError::from_response(cause, response).into()
}
