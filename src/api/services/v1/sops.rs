//! SOP 分类与文档

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::api::extractors::Authenticated;
use crate::errors::Result;
use crate::services::{PageRequest, SopService};
use crate::storage::SopFilter;

use super::helpers::{created_response, paginated_response, success_response};
use super::types::{
    CategoryBody, CreateSopBody, MessageResponse, SopListQuery, SopStatusBody, UpdateSopBody,
};

// ============ Categories ============

pub async fn list_categories(
    actor: Authenticated,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    Ok(success_response(sops.list_categories(&actor).await?))
}

pub async fn create_category(
    actor: Authenticated,
    body: web::Json<CategoryBody>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    let category = sops
        .create_category(&actor, body.into_inner().into())
        .await?;
    Ok(created_response(category))
}

pub async fn get_category(
    actor: Authenticated,
    path: web::Path<String>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    Ok(success_response(sops.get_category(&actor, &path).await?))
}

pub async fn update_category(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<CategoryBody>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    let category = sops
        .update_category(&actor, &path, body.into_inner().into())
        .await?;
    Ok(success_response(category))
}

pub async fn delete_category(
    actor: Authenticated,
    path: web::Path<String>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    sops.delete_category(&actor, &path).await?;
    Ok(success_response(MessageResponse {
        message: "Category deleted".to_string(),
    }))
}

// ============ Documents ============

pub async fn list_sops(
    actor: Authenticated,
    query: web::Query<SopListQuery>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = PageRequest::new(query.page, query.page_size);
    let filter = SopFilter {
        category_id: query.category_id.filter(|c| !c.is_empty()),
        status: query.status,
        search: query.search,
    };
    Ok(paginated_response(sops.list(&actor, filter, page).await?))
}

pub async fn create_sop(
    actor: Authenticated,
    body: web::Json<CreateSopBody>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    let doc = sops.create(&actor, body.into_inner().into()).await?;
    Ok(created_response(doc))
}

pub async fn get_sop(
    actor: Authenticated,
    path: web::Path<String>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    Ok(success_response(sops.get(&actor, &path).await?))
}

pub async fn update_sop(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<UpdateSopBody>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    let doc = sops
        .update(&actor, &path, body.into_inner().into())
        .await?;
    Ok(success_response(doc))
}

pub async fn change_sop_status(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<SopStatusBody>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    let doc = sops.change_status(&actor, &path, body.status).await?;
    Ok(success_response(doc))
}

pub async fn delete_sop(
    actor: Authenticated,
    path: web::Path<String>,
    sops: web::Data<Arc<SopService>>,
) -> Result<HttpResponse> {
    sops.delete(&actor, &path).await?;
    Ok(success_response(MessageResponse {
        message: "SOP deleted".to_string(),
    }))
}
