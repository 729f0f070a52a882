//! REST API v1
//!
//! - 认证（PIN 登录、登出、会话）
//! - 员工管理
//! - SOP 分类、文档、附件
//! - 培训模块、测验与证书
//! - 翻译工作流与语言包
//! - 看板与审计日志

mod analytics;
mod attachments;
mod audit;
pub mod auth;
pub mod error_code;
pub mod helpers;
pub mod routes;
mod sops;
mod staff;
mod training;
mod translations;
pub mod types;

pub use auth::{LoginLimiterConfig, login_limiter_config};
pub use error_code::ErrorCode;
pub use helpers::{error_response, success_response};
pub use routes::v1_routes;
pub use types::{ApiResponse, PaginatedResponse};
