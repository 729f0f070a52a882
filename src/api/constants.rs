//! API 常量

/// 会话 Cookie 名称
pub const SESSION_COOKIE_NAME: &str = "sop_session";

/// 请求 ID 响应头
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// API 路由前缀
pub const API_PREFIX: &str = "/api/v1";
