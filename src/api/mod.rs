//! HTTP 层：路由、中间件、提取器与 JWT 会话

pub mod constants;
pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod services;
