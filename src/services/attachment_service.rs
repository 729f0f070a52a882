//! SOP 附件
//!
//! 文件保存在 `<attachments_dir>/<restaurant_id>/<uuid>`，元数据写入 sop_attachments。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::audit_service::{AuditEvent, AuditService, actions};
use super::context::Actor;
use crate::config::StorageConfig;
use crate::errors::{Result, SopError};
use crate::storage::{RestaurantScope, Role, SeaOrmStorage, SopAttachment, SopStatus};
use crate::utils::new_id;

/// 上传文件内容
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 只保留文件名部分，去掉路径与控制字符
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let base = base.trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(SopError::validation("Attachment file name is empty"));
    }
    Ok(base.chars().take(255).collect())
}

pub struct AttachmentService {
    storage: Arc<SeaOrmStorage>,
    audit: Arc<AuditService>,
    root: PathBuf,
    max_bytes: u64,
}

impl AttachmentService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        audit: Arc<AuditService>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            storage,
            audit,
            root: PathBuf::from(&config.attachments_dir),
            max_bytes: config.max_attachment_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn path_for(&self, storage_key: &str) -> PathBuf {
        self.root.join(Path::new(storage_key))
    }

    /// SOP 必须存在且对调用方可见
    async fn ensure_sop_visible(&self, actor: &Actor, sop_id: &str) -> Result<()> {
        let visible = self
            .storage
            .find_sop(&actor.scope, sop_id)
            .await?
            .is_some_and(|doc| {
                doc.status == SopStatus::Approved || actor.role.at_least(Role::Manager)
            });
        if !visible {
            return Err(SopError::not_found(format!("SOP not found: {}", sop_id)));
        }
        Ok(())
    }

    /// 上传前的权限与 SOP 检查；HTTP 层在读取请求体之前调用
    pub async fn authorize_upload(&self, actor: &Actor, sop_id: &str) -> Result<()> {
        actor.require(Role::Manager)?;
        self.ensure_sop_visible(actor, sop_id).await
    }

    pub async fn upload(
        &self,
        actor: &Actor,
        sop_id: &str,
        file: UploadedFile,
    ) -> Result<SopAttachment> {
        self.authorize_upload(actor, sop_id).await?;

        let size = file.bytes.len() as u64;
        if size == 0 {
            return Err(SopError::validation("Attachment is empty"));
        }
        if size > self.max_bytes {
            return Err(SopError::attachment_too_large(format!(
                "Attachment is {} bytes, limit is {} bytes",
                size, self.max_bytes
            )));
        }

        let attachment = SopAttachment {
            id: new_id(),
            restaurant_id: actor.scope.restaurant_id().to_string(),
            sop_id: sop_id.to_string(),
            file_name: sanitize_file_name(&file.file_name)?,
            content_type: if file.content_type.trim().is_empty() {
                "application/octet-stream".to_string()
            } else {
                file.content_type
            },
            size_bytes: size,
            storage_key: format!("{}/{}", actor.scope.restaurant_id(), new_id()),
            uploaded_by: Some(actor.staff_id.clone()),
            created_at: Utc::now(),
        };

        let path = self.path_for(&attachment.storage_key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, &file.bytes).await?;

        if let Err(e) = self.storage.insert_attachment(&actor.scope, &attachment).await {
            // 元数据写入失败时不留下孤立文件
            remove_file_quietly(&path).await;
            return Err(e);
        }

        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::ATTACHMENT_UPLOADED, "sop_attachment")
                    .resource(&attachment.id)
                    .by(actor)
                    .metadata(json!({
                        "sop_id": sop_id,
                        "file_name": attachment.file_name,
                        "size_bytes": size,
                    })),
            )
            .await;
        info!(
            "Attachment {} ({} bytes) stored for SOP {}",
            attachment.id, size, sop_id
        );
        Ok(attachment)
    }

    pub async fn list(&self, actor: &Actor, sop_id: &str) -> Result<Vec<SopAttachment>> {
        self.ensure_sop_visible(actor, sop_id).await?;
        self.storage.list_attachments(&actor.scope, sop_id).await
    }

    /// 返回元数据与文件内容
    pub async fn read(
        &self,
        actor: &Actor,
        sop_id: &str,
        id: &str,
    ) -> Result<(SopAttachment, Vec<u8>)> {
        self.ensure_sop_visible(actor, sop_id).await?;
        let attachment = self
            .storage
            .find_attachment(&actor.scope, sop_id, id)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Attachment not found: {}", id)))?;

        let bytes = match tokio::fs::read(self.path_for(&attachment.storage_key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Attachment {} has no file on disk", attachment.id);
                return Err(SopError::not_found(format!(
                    "Attachment file missing: {}",
                    id
                )));
            }
            Err(e) => return Err(e.into()),
        };
        Ok((attachment, bytes))
    }

    pub async fn delete(&self, actor: &Actor, sop_id: &str, id: &str) -> Result<()> {
        actor.require(Role::Manager)?;
        let attachment = self
            .storage
            .find_attachment(&actor.scope, sop_id, id)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Attachment not found: {}", id)))?;

        self.storage.delete_attachment(&actor.scope, id).await?;
        remove_file_quietly(&self.path_for(&attachment.storage_key)).await;

        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::ATTACHMENT_DELETED, "sop_attachment")
                    .resource(id)
                    .by(actor)
                    .metadata(json!({ "sop_id": sop_id })),
            )
            .await;
        Ok(())
    }

    /// 删除 SOP 前清理其附件文件（行由外键级联删除）
    pub async fn remove_files_for_sop(&self, scope: &RestaurantScope, sop_id: &str) -> Result<()> {
        for attachment in self.storage.list_attachments(scope, sop_id).await? {
            remove_file_quietly(&self.path_for(&attachment.storage_key)).await;
        }
        Ok(())
    }
}

async fn remove_file_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove attachment file {}: {}", path.display(), e),
    }
}
