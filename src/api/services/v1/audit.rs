//! 审计日志查询

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use tracing::debug;

use crate::api::extractors::Authenticated;
use crate::errors::Result;
use crate::services::{AuditService, PageRequest};
use crate::storage::AuditFilter;

use super::helpers::{paginated_response, parse_datetime};
use super::types::AuditQuery;

pub async fn list_audit(
    actor: Authenticated,
    query: web::Query<AuditQuery>,
    audit: web::Data<Arc<AuditService>>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let filter = AuditFilter {
        action: query.action.filter(|a| !a.is_empty()),
        staff_id: query.staff_id.filter(|s| !s.is_empty()),
        from: parse_datetime(query.from.as_deref())?,
        to: parse_datetime(query.to.as_deref())?,
    };
    debug!("Audit query: {:?}", filter);
    let page = audit
        .list(&actor, &filter, PageRequest::new(query.page, query.page_size))
        .await?;
    Ok(paginated_response(page))
}
