//! 审计日志
//!
//! 记录失败只写日志，不影响调用方的业务结果。

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error};

use super::context::{Actor, Page, PageRequest};
use crate::errors::Result;
use crate::storage::{AuditEntry, AuditFilter, RestaurantScope, Role, SeaOrmStorage};

/// 审计动作名称
pub mod actions {
    pub const LOGIN_SUCCESS: &str = "auth.login";
    pub const LOGIN_FAILED: &str = "auth.login_failed";
    pub const ACCOUNT_LOCKED: &str = "auth.account_locked";
    pub const LOGOUT: &str = "auth.logout";

    pub const STAFF_CREATED: &str = "staff.create";
    pub const STAFF_UPDATED: &str = "staff.update";
    pub const STAFF_PIN_RESET: &str = "staff.pin_reset";
    pub const STAFF_DEACTIVATED: &str = "staff.deactivate";

    pub const CATEGORY_CREATED: &str = "category.create";
    pub const CATEGORY_UPDATED: &str = "category.update";
    pub const CATEGORY_DELETED: &str = "category.delete";

    pub const SOP_CREATED: &str = "sop.create";
    pub const SOP_UPDATED: &str = "sop.update";
    pub const SOP_STATUS_CHANGED: &str = "sop.status";
    pub const SOP_DELETED: &str = "sop.delete";
    pub const ATTACHMENT_UPLOADED: &str = "attachment.upload";
    pub const ATTACHMENT_DELETED: &str = "attachment.delete";

    pub const MODULE_CREATED: &str = "training.module_create";
    pub const MODULE_UPDATED: &str = "training.module_update";
    pub const MODULE_DELETED: &str = "training.module_delete";
    pub const ASSESSMENT_SUBMITTED: &str = "training.assessment";
    pub const CERTIFICATE_ISSUED: &str = "training.certificate_issue";
    pub const CERTIFICATE_REVOKED: &str = "training.certificate_revoke";

    pub const TRANSLATION_KEY_CREATED: &str = "translation.key_create";
    pub const TRANSLATION_KEY_UPDATED: &str = "translation.key_update";
    pub const TRANSLATION_KEY_DELETED: &str = "translation.key_delete";
    pub const TRANSLATION_UPDATED: &str = "translation.update";
    pub const TRANSLATION_STATUS_CHANGED: &str = "translation.status";
}

/// 一条待写入的审计事件
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: &'static str,
    pub resource_type: &'static str,
    pub resource_id: Option<String>,
    pub staff_id: Option<String>,
    pub metadata: Option<Value>,
    pub ip_address: Option<String>,
}

impl AuditEvent {
    pub fn new(action: &'static str, resource_type: &'static str) -> Self {
        Self {
            action,
            resource_type,
            resource_id: None,
            staff_id: None,
            metadata: None,
            ip_address: None,
        }
    }

    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// 操作者与来源 IP 取自 actor
    pub fn by(mut self, actor: &Actor) -> Self {
        self.staff_id = Some(actor.staff_id.clone());
        self.ip_address = actor.ip.clone();
        self
    }

    pub fn staff(mut self, staff_id: Option<String>) -> Self {
        self.staff_id = staff_id;
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub struct AuditService {
    storage: Arc<SeaOrmStorage>,
}

impl AuditService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn record(&self, scope: &RestaurantScope, event: AuditEvent) {
        let entry = AuditEntry {
            id: 0,
            restaurant_id: scope.restaurant_id().to_string(),
            staff_id: event.staff_id,
            action: event.action.to_string(),
            resource_type: event.resource_type.to_string(),
            resource_id: event.resource_id,
            metadata: event.metadata,
            ip_address: event.ip_address,
            created_at: Utc::now(),
        };

        match self.storage.insert_audit(scope, &entry).await {
            Ok(()) => debug!("audit: {} {}", entry.action, entry.resource_type),
            Err(e) => error!(
                "Failed to write audit entry {} for {}: {}",
                entry.action,
                scope.restaurant_id(),
                e
            ),
        }
    }

    /// 仅 admin 可读
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> Result<Page<AuditEntry>> {
        actor.require(Role::Admin)?;
        let (items, total) = self
            .storage
            .list_audit(&actor.scope, filter, page.page, page.page_size)
            .await?;
        Ok(Page::new(items, page, total))
    }
}
