//! 管理看板

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::api::extractors::Authenticated;
use crate::errors::Result;
use crate::services::AnalyticsService;

use super::helpers::success_response;

pub async fn dashboard(
    actor: Authenticated,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> Result<HttpResponse> {
    Ok(success_response(analytics.dashboard(&actor).await?))
}

pub async fn module_report(
    actor: Authenticated,
    path: web::Path<String>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> Result<HttpResponse> {
    Ok(success_response(
        analytics.module_report(&actor, &path).await?,
    ))
}
