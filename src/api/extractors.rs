//! 请求提取器

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};

use crate::errors::SopError;
use crate::services::Actor;

/// 已通过 [`SessionAuth`](crate::api::middleware::SessionAuth) 认证的调用方
#[derive(Debug, Clone)]
pub struct Authenticated(pub Actor);

impl FromRequest for Authenticated {
    type Error = SopError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Actor>()
                .cloned()
                .map(Authenticated)
                .ok_or_else(|| SopError::unauthorized("Authentication required")),
        )
    }
}

impl std::ops::Deref for Authenticated {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}
