//! SOP 附件上传与下载

use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::debug;

use crate::api::extractors::Authenticated;
use crate::errors::{Result, SopError};
use crate::services::{AttachmentService, UploadedFile};

use super::helpers::{created_response, success_response};
use super::types::MessageResponse;

/// 读取 multipart 中名为 `file` 的字段，超过 `max_bytes` 立即中止
async fn read_file_field(payload: &mut Multipart, max_bytes: u64) -> Result<UploadedFile> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| SopError::invalid_multipart(format!("Invalid multipart data: {}", e)))?;

        if field.name() != Some("file") {
            // 其他字段直接丢弃
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| SopError::invalid_multipart(e.to_string()))?;
            }
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("attachment")
            .to_string();
        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| SopError::invalid_multipart(format!("Failed to read file: {}", e)))?;
            if (bytes.len() + chunk.len()) as u64 > max_bytes {
                return Err(SopError::attachment_too_large(format!(
                    "Attachment exceeds {} bytes",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(SopError::invalid_multipart("Missing 'file' field"))
}

pub async fn upload_attachment(
    actor: Authenticated,
    path: web::Path<String>,
    mut payload: Multipart,
    attachments: web::Data<Arc<AttachmentService>>,
) -> Result<HttpResponse> {
    let sop_id = path.into_inner();
    // 无权上传时不读取请求体
    attachments.authorize_upload(&actor, &sop_id).await?;
    let file = read_file_field(&mut payload, attachments.max_bytes()).await?;
    debug!(
        "Upload for SOP {}: {} ({} bytes)",
        sop_id,
        file.file_name,
        file.bytes.len()
    );
    let attachment = attachments.upload(&actor, &sop_id, file).await?;
    Ok(created_response(attachment))
}

pub async fn list_attachments(
    actor: Authenticated,
    path: web::Path<String>,
    attachments: web::Data<Arc<AttachmentService>>,
) -> Result<HttpResponse> {
    Ok(success_response(attachments.list(&actor, &path).await?))
}

pub async fn download_attachment(
    actor: Authenticated,
    path: web::Path<(String, String)>,
    attachments: web::Data<Arc<AttachmentService>>,
) -> Result<HttpResponse> {
    let (sop_id, id) = path.into_inner();
    let (attachment, bytes) = attachments.read(&actor, &sop_id, &id).await?;

    Ok(HttpResponse::Ok()
        .content_type(attachment.content_type.clone())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(attachment.file_name)],
        })
        .insert_header((header::CACHE_CONTROL, "private, no-store"))
        .body(bytes))
}

pub async fn delete_attachment(
    actor: Authenticated,
    path: web::Path<(String, String)>,
    attachments: web::Data<Arc<AttachmentService>>,
) -> Result<HttpResponse> {
    let (sop_id, id) = path.into_inner();
    attachments.delete(&actor, &sop_id, &id).await?;
    Ok(success_response(MessageResponse {
        message: "Attachment deleted".to_string(),
    }))
}
