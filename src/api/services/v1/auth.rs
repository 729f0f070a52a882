//! PIN 登录、登出与当前会话

use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError,
};
use actix_web::dev::ServiceRequest;
use actix_web::http::header::{HeaderValue, RETRY_AFTER};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use governor::NotUntil;
use governor::clock::{Clock, DefaultClock, QuantaInstant};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::extractors::Authenticated;
use crate::api::jwt::JwtService;
use crate::config::{AuthConfig, get_config};
use crate::errors::{Result, SopError};
use crate::services::{AuthService, LoginRequest};
use crate::utils::ip::{extract_client_ip, resolve_client_ip};

use super::error_code::ErrorCode;
use super::helpers::{CookieBuilder, error_response, success_response};
use super::types::{ApiResponse, LoginBody, MessageResponse, SessionResponse};

/// 登录限流 key：对端 IP；只有来自可信代理时才采信转发头
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        let conn_info = req.connection_info();
        let config = get_config();
        let key = resolve_client_ip(
            conn_info.peer_addr(),
            req.headers(),
            &config.auth.trusted_proxies,
        )
        .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract peer IP"))?;
        debug!("Login rate limit key: {}", key);
        Ok(key)
    }

    /// 超限时返回与其他接口一致的 JSON 错误，并带上 Retry-After
    fn exceed_rate_limit_response(
        &self,
        negative: &NotUntil<QuantaInstant>,
        _response: HttpResponseBuilder,
    ) -> HttpResponse {
        let wait_secs = negative
            .wait_time_from(DefaultClock::default().now())
            .as_secs()
            .max(1);
        let err = SopError::rate_limited(format!(
            "Too many login attempts, retry in {}s",
            wait_secs
        ));
        let mut response = error_response(&err);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(wait_secs));
        response
    }
}

pub type LoginLimiterConfig = GovernorConfig<LoginKeyExtractor, NoOpMiddleware>;

/// 每 `login_replenish_secs` 秒补充一个令牌，最多突发 `login_burst` 次；超限返回 429
pub fn login_limiter_config(auth: &AuthConfig) -> Result<LoginLimiterConfig> {
    let replenish = auth.login_replenish_secs.max(1);
    let burst = auth.login_burst.max(1);
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(replenish)
        .burst_size(burst)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .ok_or_else(|| SopError::validation("Invalid login rate limit configuration"))?;
    debug!(
        "Login rate limiter: 1 req / {}s, burst {}",
        replenish, burst
    );
    Ok(config)
}

pub fn login_rate_limiter(config: &LoginLimiterConfig) -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    Governor::new(config)
}

/// POST /auth/login
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginBody>,
    auth: web::Data<Arc<AuthService>>,
    jwt: web::Data<Arc<JwtService>>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let request = LoginRequest {
        restaurant_id: body.restaurant_id,
        email: body.email,
        pin: body.pin,
    };
    let staff = auth.login(&request, extract_client_ip(&req)).await?;
    let session = jwt.issue(&staff)?;
    info!("Session issued for staff {}", staff.id);

    let cookie = CookieBuilder::from_config().session_cookie(session.token.clone(), session.expires_at);
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            message_th: None,
            data: Some(SessionResponse {
                staff,
                token: session.token,
                expires_at: session.expires_at,
            }),
        }))
}

/// POST /auth/logout：无论会话是否有效都清除 Cookie
pub async fn logout(
    actor: Option<Authenticated>,
    auth: web::Data<Arc<AuthService>>,
) -> HttpResponse {
    if let Some(actor) = actor {
        auth.logout(&actor).await;
        info!("Staff {} logged out", actor.staff_id);
    }
    HttpResponse::Ok()
        .cookie(CookieBuilder::from_config().expired_session_cookie())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            message_th: None,
            data: Some(MessageResponse {
                message: "Logged out".to_string(),
            }),
        })
}

/// GET /auth/session
pub async fn session(
    actor: Authenticated,
    auth: web::Data<Arc<AuthService>>,
) -> Result<HttpResponse> {
    Ok(success_response(auth.session(&actor).await?))
}
