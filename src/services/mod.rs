//! 业务服务层
//!
//! HTTP handler 与 CLI 共用这里的逻辑；每个操作都以 [`Actor`] 为入参，
//! 由它携带的 scope 决定租户边界。

mod analytics_service;
mod attachment_service;
mod audit_service;
mod auth_service;
mod context;
mod health;
mod sop_service;
mod staff_service;
mod training_service;
mod translation_service;

pub use analytics_service::*;
pub use attachment_service::*;
pub use audit_service::{AuditEvent, AuditService, actions};
pub use auth_service::*;
pub use context::*;
pub use health::*;
pub use sop_service::*;
pub use staff_service::*;
pub use training_service::*;
pub use translation_service::*;
