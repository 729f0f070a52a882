//! 员工管理（admin）

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use tracing::trace;

use crate::api::extractors::Authenticated;
use crate::errors::Result;
use crate::services::StaffService;

use super::helpers::{created_response, success_response};
use super::types::{CreateStaffBody, MessageResponse, ResetPinBody, UpdateStaffBody};

pub async fn list_staff(
    actor: Authenticated,
    staff: web::Data<Arc<StaffService>>,
) -> Result<HttpResponse> {
    let members = staff.list(&actor).await?;
    trace!("Listing {} staff members", members.len());
    Ok(success_response(members))
}

pub async fn create_staff(
    actor: Authenticated,
    body: web::Json<CreateStaffBody>,
    staff: web::Data<Arc<StaffService>>,
) -> Result<HttpResponse> {
    let created = staff.create(&actor, body.into_inner().into()).await?;
    Ok(created_response(created))
}

pub async fn get_staff(
    actor: Authenticated,
    path: web::Path<String>,
    staff: web::Data<Arc<StaffService>>,
) -> Result<HttpResponse> {
    Ok(success_response(staff.get(&actor, &path).await?))
}

pub async fn update_staff(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<UpdateStaffBody>,
    staff: web::Data<Arc<StaffService>>,
) -> Result<HttpResponse> {
    let updated = staff
        .update(&actor, &path, body.into_inner().into())
        .await?;
    Ok(success_response(updated))
}

pub async fn reset_pin(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<ResetPinBody>,
    staff: web::Data<Arc<StaffService>>,
) -> Result<HttpResponse> {
    staff.reset_pin(&actor, &path, &body.pin).await?;
    Ok(success_response(MessageResponse {
        message: "PIN reset".to_string(),
    }))
}

pub async fn deactivate_staff(
    actor: Authenticated,
    path: web::Path<String>,
    staff: web::Data<Arc<StaffService>>,
) -> Result<HttpResponse> {
    staff.deactivate(&actor, &path).await?;
    Ok(success_response(MessageResponse {
        message: "Staff deactivated".to_string(),
    }))
}
