//! 会话认证中间件
//!
//! 依次尝试 `Authorization: Bearer` 与会话 Cookie；token 校验通过后
//! 再确认员工仍然存在且启用，并以数据库中的当前角色构造 [`Actor`]
//! 放入 request extensions，供 [`Authenticated`](crate::api::extractors::Authenticated) 提取。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::api::constants;
use crate::api::jwt::JwtService;
use crate::api::services::v1::helpers::error_response;
use crate::errors::{Result, SopError};
use crate::services::Actor;
use crate::storage::{RestaurantScope, SeaOrmStorage};
use crate::utils::ip::extract_client_ip;

/// 不需要会话即可访问的路径后缀
const PUBLIC_PATHS: &[&str] = &["/auth/login", "/auth/logout"];

#[derive(Clone, Default)]
pub struct SessionAuth;

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    bearer_token(req).or_else(|| {
        req.cookie(constants::SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path.ends_with(p))
}

async fn authenticate(
    token: &str,
    jwt: &JwtService,
    storage: &SeaOrmStorage,
    ip: Option<String>,
) -> Result<Actor> {
    let claims = jwt.validate(token)?;
    let scope = RestaurantScope::new(claims.restaurant_id);
    match storage.find_staff(&scope, &claims.sub).await? {
        Some(staff) if staff.is_active => Ok(Actor::new(staff.id, staff.role, scope).with_ip(ip)),
        _ => Err(SopError::unauthorized("Session is no longer valid")),
    }
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(
                    HttpResponse::NoContent()
                        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                        .finish()
                        .map_into_right_body(),
                ));
            }

            let token = session_token(&req);
            let public = is_public(req.path());

            let Some(token) = token else {
                if public {
                    return Ok(srv.call(req).await?.map_into_left_body());
                }
                debug!("Missing session token for {}", req.path());
                let err = SopError::unauthorized("Missing session token");
                return Ok(req.into_response(error_response(&err).map_into_right_body()));
            };

            let (Some(jwt), Some(storage)) = (
                req.app_data::<web::Data<Arc<JwtService>>>().cloned(),
                req.app_data::<web::Data<Arc<SeaOrmStorage>>>().cloned(),
            ) else {
                let err = SopError::unauthorized("Authentication is not configured");
                return Ok(req.into_response(error_response(&err).map_into_right_body()));
            };

            let ip = extract_client_ip(req.request());
            match authenticate(&token, &jwt, &storage, ip).await {
                Ok(actor) => {
                    trace!("Authenticated staff {} ({})", actor.staff_id, actor.role);
                    req.extensions_mut().insert(actor);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                // 登录/登出不因旧 token 失效而被拦截
                Err(_) if public => Ok(srv.call(req).await?.map_into_left_body()),
                Err(e) => {
                    debug!("Session rejected: {}", e);
                    Ok(req.into_response(error_response(&e).map_into_right_body()))
                }
            }
        })
    }
}
