//! SOP 分类与文档
//!
//! 文档状态流转：
//! draft → review → approved → archived，review → draft（驳回），archived → draft（恢复）。
//! 修改内容会使版本号 +1；已批准文档被修改后回到 draft。

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::attachment_service::AttachmentService;
use super::audit_service::{AuditEvent, AuditService, actions};
use super::context::{Actor, Page, PageRequest};
use crate::errors::{Result, SopError};
use crate::storage::{
    RestaurantScope, Role, SeaOrmStorage, SopCategory, SopDocument, SopFilter, SopStatus, SopStep,
};
use crate::utils::new_id;

#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub code: String,
    pub name_en: String,
    pub name_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateSopRequest {
    pub category_id: String,
    pub title_en: String,
    pub title_th: String,
    pub content_en: String,
    pub content_th: String,
    pub steps: Vec<SopStep>,
    pub tags: Vec<String>,
}

/// None 字段保持原值
#[derive(Debug, Clone, Default)]
pub struct UpdateSopRequest {
    pub category_id: Option<String>,
    pub title_en: Option<String>,
    pub title_th: Option<String>,
    pub content_en: Option<String>,
    pub content_th: Option<String>,
    pub steps: Option<Vec<SopStep>>,
    pub tags: Option<Vec<String>>,
}

/// 分类代码：大写字母、数字、下划线，2..=32 位
pub fn normalize_category_code(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    let valid = (2..=32).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    if !valid {
        return Err(SopError::validation(format!(
            "Category code must match [A-Z0-9_]{{2,32}}: {}",
            code
        )));
    }
    Ok(code)
}

fn require_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SopError::validation(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

/// 按 order 排序；order 必须唯一且从 1 开始
fn normalize_steps(mut steps: Vec<SopStep>) -> Result<Vec<SopStep>> {
    steps.sort_by_key(|s| s.order);
    let mut seen = BTreeSet::new();
    for step in &steps {
        if step.order == 0 || !seen.insert(step.order) {
            return Err(SopError::validation(format!(
                "Step order must be unique and start at 1: {}",
                step.order
            )));
        }
        if step.text_en.trim().is_empty() || step.text_th.trim().is_empty() {
            return Err(SopError::validation(format!(
                "Step {} needs both English and Thai text",
                step.order
            )));
        }
    }
    Ok(steps)
}

/// 小写、去空白、去重，保持首次出现的顺序
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub struct SopService {
    storage: Arc<SeaOrmStorage>,
    audit: Arc<AuditService>,
    attachments: Arc<AttachmentService>,
}

impl SopService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        audit: Arc<AuditService>,
        attachments: Arc<AttachmentService>,
    ) -> Self {
        Self {
            storage,
            audit,
            attachments,
        }
    }

    // ============ Categories ============

    pub async fn create_category(&self, actor: &Actor, input: CategoryInput) -> Result<SopCategory> {
        actor.require(Role::Manager)?;
        let category = SopCategory {
            id: new_id(),
            restaurant_id: actor.scope.restaurant_id().to_string(),
            code: normalize_category_code(&input.code)?,
            name_en: require_text("name_en", &input.name_en)?,
            name_th: require_text("name_th", &input.name_th)?,
            description_en: input.description_en,
            description_th: input.description_th,
            sort_order: input.sort_order.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            created_at: Utc::now(),
        };
        self.storage.insert_category(&actor.scope, &category).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::CATEGORY_CREATED, "sop_category")
                    .resource(&category.id)
                    .by(actor)
                    .metadata(json!({ "code": category.code })),
            )
            .await;
        Ok(category)
    }

    /// staff 只看到启用的分类
    pub async fn list_categories(&self, actor: &Actor) -> Result<Vec<SopCategory>> {
        let include_inactive = actor.role.at_least(Role::Manager);
        self.storage
            .list_categories(&actor.scope, include_inactive)
            .await
    }

    pub async fn get_category(&self, actor: &Actor, id: &str) -> Result<SopCategory> {
        self.storage
            .find_category(&actor.scope, id)
            .await?
            .filter(|c| c.is_active || actor.role.at_least(Role::Manager))
            .ok_or_else(|| SopError::not_found(format!("Category not found: {}", id)))
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        id: &str,
        input: CategoryInput,
    ) -> Result<SopCategory> {
        actor.require(Role::Manager)?;
        let existing = self.get_category(actor, id).await?;
        let category = SopCategory {
            code: normalize_category_code(&input.code)?,
            name_en: require_text("name_en", &input.name_en)?,
            name_th: require_text("name_th", &input.name_th)?,
            description_en: input.description_en,
            description_th: input.description_th,
            sort_order: input.sort_order.unwrap_or(existing.sort_order),
            is_active: input.is_active.unwrap_or(existing.is_active),
            ..existing
        };
        self.storage.update_category(&actor.scope, &category).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::CATEGORY_UPDATED, "sop_category")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(category)
    }

    pub async fn delete_category(&self, actor: &Actor, id: &str) -> Result<()> {
        actor.require(Role::Manager)?;
        self.storage.delete_category(&actor.scope, id).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::CATEGORY_DELETED, "sop_category")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(())
    }

    // ============ Documents ============

    async fn ensure_category(&self, scope: &RestaurantScope, category_id: &str) -> Result<()> {
        if self.storage.find_category(scope, category_id).await?.is_none() {
            return Err(SopError::validation(format!(
                "Unknown category: {}",
                category_id
            )));
        }
        Ok(())
    }

    pub async fn create(&self, actor: &Actor, req: CreateSopRequest) -> Result<SopDocument> {
        actor.require(Role::Manager)?;
        self.ensure_category(&actor.scope, &req.category_id).await?;

        let now = Utc::now();
        let doc = SopDocument {
            id: new_id(),
            restaurant_id: actor.scope.restaurant_id().to_string(),
            category_id: req.category_id,
            title_en: require_text("title_en", &req.title_en)?,
            title_th: require_text("title_th", &req.title_th)?,
            content_en: req.content_en,
            content_th: req.content_th,
            steps: normalize_steps(req.steps)?,
            tags: normalize_tags(req.tags),
            status: SopStatus::Draft,
            version: 1,
            created_by: Some(actor.staff_id.clone()),
            updated_by: Some(actor.staff_id.clone()),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_sop(&actor.scope, &doc).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::SOP_CREATED, "sop_document")
                    .resource(&doc.id)
                    .by(actor),
            )
            .await;
        Ok(doc)
    }

    /// staff 只能看到已批准的文档，其余情况视为不存在
    pub async fn get(&self, actor: &Actor, id: &str) -> Result<SopDocument> {
        self.storage
            .find_sop(&actor.scope, id)
            .await?
            .filter(|doc| doc.status == SopStatus::Approved || actor.role.at_least(Role::Manager))
            .ok_or_else(|| SopError::not_found(format!("SOP not found: {}", id)))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: SopFilter,
        page: PageRequest,
    ) -> Result<Page<SopDocument>> {
        if !actor.role.at_least(Role::Manager) {
            if filter.status.is_some_and(|s| s != SopStatus::Approved) {
                return Ok(Page::new(Vec::new(), page, 0));
            }
            filter.status = Some(SopStatus::Approved);
        }
        filter.search = filter
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let (items, total) = self
            .storage
            .list_sops(&actor.scope, &filter, page.page, page.page_size)
            .await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn update(&self, actor: &Actor, id: &str, req: UpdateSopRequest) -> Result<SopDocument> {
        actor.require(Role::Manager)?;
        let mut doc = self.get(actor, id).await?;
        if doc.status == SopStatus::Archived {
            return Err(SopError::sop_transition(
                "Archived SOPs must be restored to draft before editing",
            ));
        }

        let mut changed = false;
        if let Some(category_id) = req.category_id.filter(|c| *c != doc.category_id) {
            self.ensure_category(&actor.scope, &category_id).await?;
            doc.category_id = category_id;
            changed = true;
        }
        if let Some(title) = req.title_en {
            let title = require_text("title_en", &title)?;
            changed |= title != doc.title_en;
            doc.title_en = title;
        }
        if let Some(title) = req.title_th {
            let title = require_text("title_th", &title)?;
            changed |= title != doc.title_th;
            doc.title_th = title;
        }
        if let Some(content) = req.content_en {
            changed |= content != doc.content_en;
            doc.content_en = content;
        }
        if let Some(content) = req.content_th {
            changed |= content != doc.content_th;
            doc.content_th = content;
        }
        if let Some(steps) = req.steps {
            let steps = normalize_steps(steps)?;
            changed |= steps != doc.steps;
            doc.steps = steps;
        }
        if let Some(tags) = req.tags {
            let tags = normalize_tags(tags);
            changed |= tags != doc.tags;
            doc.tags = tags;
        }

        if !changed {
            return Ok(doc);
        }

        let previous_status = doc.status;
        doc.version += 1;
        doc.updated_by = Some(actor.staff_id.clone());
        doc.updated_at = Utc::now();
        if doc.status == SopStatus::Approved {
            doc.status = SopStatus::Draft;
            doc.approved_by = None;
            doc.approved_at = None;
        }

        self.storage.update_sop(&actor.scope, &doc).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::SOP_UPDATED, "sop_document")
                    .resource(id)
                    .by(actor)
                    .metadata(json!({
                        "version": doc.version,
                        "from_status": previous_status,
                        "status": doc.status,
                    })),
            )
            .await;
        Ok(doc)
    }

    pub async fn change_status(
        &self,
        actor: &Actor,
        id: &str,
        next: SopStatus,
    ) -> Result<SopDocument> {
        actor.require(Role::Manager)?;
        let mut doc = self.get(actor, id).await?;
        let previous = doc.status;
        if !previous.can_transition_to(next) {
            return Err(SopError::sop_transition(format!(
                "Cannot move SOP from {} to {}",
                previous, next
            )));
        }

        let now = Utc::now();
        doc.status = next;
        doc.updated_by = Some(actor.staff_id.clone());
        doc.updated_at = now;
        match next {
            SopStatus::Approved => {
                doc.approved_by = Some(actor.staff_id.clone());
                doc.approved_at = Some(now);
            }
            SopStatus::Draft => {
                doc.approved_by = None;
                doc.approved_at = None;
            }
            SopStatus::Review | SopStatus::Archived => {}
        }

        self.storage.update_sop(&actor.scope, &doc).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::SOP_STATUS_CHANGED, "sop_document")
                    .resource(id)
                    .by(actor)
                    .metadata(json!({ "from": previous, "to": next })),
            )
            .await;
        info!("SOP {} status {} -> {}", id, previous, next);
        Ok(doc)
    }

    /// 删除文档及其全部附件文件
    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<()> {
        actor.require(Role::Manager)?;
        self.get(actor, id).await?;
        self.attachments.remove_files_for_sop(&actor.scope, id).await?;
        self.storage.delete_sop(&actor.scope, id).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::SOP_DELETED, "sop_document")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(())
    }
}
