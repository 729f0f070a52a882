//! 响应构建与会话 Cookie

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::api::constants;
use crate::config::{AuthConfig, SameSitePolicy};
use crate::errors::{Result, SopError};
use crate::services::Page;
use crate::storage::Locale;

use super::error_code::ErrorCode;
use super::types::{ApiResponse, PaginatedResponse, PaginationInfo};

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            message_th: None,
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn paginated_response<T: Serialize>(page: Page<T>) -> HttpResponse {
    let pagination = PaginationInfo {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages(),
    };
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(PaginatedResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: page.items,
            pagination,
        })
}

/// 从 SopError 构建错误响应；内部错误只返回通用信息
pub fn error_response(err: &SopError) -> HttpResponse {
    let message = if err.is_internal() {
        error!("Request failed: {}", err);
        "Internal server error".to_string()
    } else {
        err.message().to_string()
    };
    HttpResponse::build(err.http_status())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse::<()> {
            code: ErrorCode::from(err) as i32,
            message,
            message_th: Some(err.message_th().to_string()),
            data: None,
        })
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_response(&e),
    }
}

impl ResponseError for SopError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        error_response(self)
    }
}

/// 可选的 RFC3339 时间参数
pub fn parse_datetime(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| {
                    SopError::date_parse(format!("Invalid timestamp '{}', expected RFC3339", s))
                })
        })
        .transpose()
}

/// 路径中的语言代码（`en` / `th`）
pub fn parse_locale(raw: &str) -> Result<Locale> {
    raw.trim()
        .to_lowercase()
        .parse::<Locale>()
        .map_err(|_| SopError::validation(format!("Unsupported locale: {}", raw)))
}

/// 会话 Cookie 构建器
pub struct CookieBuilder {
    same_site: SameSite,
    secure: bool,
    domain: Option<String>,
}

impl CookieBuilder {
    pub fn new(auth: &AuthConfig) -> Self {
        let same_site = match auth.cookie_same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };
        Self {
            same_site,
            secure: auth.cookie_secure,
            domain: auth.cookie_domain.clone(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(&crate::config::get_config().auth)
    }

    fn build(&self, value: String, max_age: actix_web::cookie::time::Duration) -> Cookie<'static> {
        let mut cookie = Cookie::new(constants::SESSION_COOKIE_NAME, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        cookie.set_max_age(max_age);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    /// Cookie 有效期与 token 的 exp 对齐
    pub fn session_cookie(&self, token: String, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let seconds = (expires_at - Utc::now()).num_seconds().max(0);
        self.build(token, actix_web::cookie::time::Duration::seconds(seconds))
    }

    pub fn expired_session_cookie(&self) -> Cookie<'static> {
        self.build(String::new(), actix_web::cookie::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PageRequest;

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&SopError::account_locked("locked"));
        assert_eq!(resp.status(), StatusCode::LOCKED);
        let resp = error_response(&SopError::database_operation("secret detail"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_paginated_response_ok() {
        let page = Page::new(vec![1, 2], PageRequest::new(Some(1), Some(2)), 5);
        assert_eq!(paginated_response(page).status(), StatusCode::OK);
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_datetime(None).unwrap(), None);
        assert_eq!(parse_datetime(Some("  ")).unwrap(), None);
        assert!(parse_datetime(Some("2026-03-01T08:00:00+07:00")).unwrap().is_some());
        assert!(matches!(
            parse_datetime(Some("yesterday")),
            Err(SopError::DateParse(_))
        ));
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale("th").unwrap(), Locale::Th);
        assert_eq!(parse_locale("EN").unwrap(), Locale::En);
        assert!(matches!(parse_locale("fr"), Err(SopError::Validation(_))));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let builder = CookieBuilder {
            same_site: SameSite::Strict,
            secure: true,
            domain: None,
        };
        let cookie = builder.session_cookie("tok".into(), Utc::now() + chrono::Duration::hours(8));
        assert_eq!(cookie.name(), constants::SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.max_age().unwrap().whole_hours() >= 7);

        let expired = builder.expired_session_cookie();
        assert_eq!(expired.value(), "");
        assert_eq!(expired.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
    }
}
