//! 员工管理（admin）与初始化

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::audit_service::{AuditEvent, AuditService, actions};
use super::context::Actor;
use crate::errors::{Result, SopError};
use crate::storage::{Restaurant, RestaurantScope, Role, SeaOrmStorage, Staff};
use crate::utils::new_id;
use crate::utils::pin::{hash_pin, validate_new_pin};

#[derive(Debug, Clone)]
pub struct CreateStaffRequest {
    pub email: String,
    pub full_name: String,
    pub full_name_th: Option<String>,
    pub role: Role,
    pub pin: String,
}

/// None 字段保持原值
#[derive(Debug, Clone, Default)]
pub struct UpdateStaffRequest {
    pub full_name: Option<String>,
    pub full_name_th: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BootstrapRequest {
    pub restaurant_name: String,
    pub restaurant_name_th: Option<String>,
    pub timezone: String,
    pub admin: CreateStaffRequest,
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !email.contains(char::is_whitespace);
    if !valid {
        return Err(SopError::validation(format!("Invalid email: {}", email)));
    }
    Ok(email)
}

fn require_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SopError::validation("Name must not be empty"));
    }
    Ok(name.to_string())
}

pub struct StaffService {
    storage: Arc<SeaOrmStorage>,
    audit: Arc<AuditService>,
}

impl StaffService {
    pub fn new(storage: Arc<SeaOrmStorage>, audit: Arc<AuditService>) -> Self {
        Self { storage, audit }
    }

    async fn build_staff(&self, scope: &RestaurantScope, req: CreateStaffRequest) -> Result<Staff> {
        let email = normalize_email(&req.email)?;
        let full_name = require_name(&req.full_name)?;
        validate_new_pin(&req.pin)?;

        if self.storage.find_staff_by_email(scope, &email).await?.is_some() {
            return Err(SopError::conflict(format!(
                "Staff with email {} already exists",
                email
            )));
        }

        let now = Utc::now();
        Ok(Staff {
            id: new_id(),
            restaurant_id: scope.restaurant_id().to_string(),
            email,
            full_name,
            full_name_th: req.full_name_th.filter(|s| !s.trim().is_empty()),
            role: req.role,
            pin_hash: hash_pin(&req.pin)?,
            failed_pin_attempts: 0,
            locked_until: None,
            last_login_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn create(&self, actor: &Actor, req: CreateStaffRequest) -> Result<Staff> {
        actor.require(Role::Admin)?;
        let staff = self.build_staff(&actor.scope, req).await?;
        self.storage.insert_staff(&actor.scope, &staff).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::STAFF_CREATED, "staff")
                    .resource(&staff.id)
                    .by(actor)
                    .metadata(json!({ "email": staff.email, "role": staff.role })),
            )
            .await;
        Ok(staff)
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Staff>> {
        actor.require(Role::Admin)?;
        self.storage.list_staff(&actor.scope).await
    }

    /// admin 可查看任意员工，其他角色只能查看自己
    pub async fn get(&self, actor: &Actor, id: &str) -> Result<Staff> {
        if id != actor.staff_id {
            actor.require(Role::Admin)?;
        }
        self.storage
            .find_staff(&actor.scope, id)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Staff not found: {}", id)))
    }

    pub async fn update(&self, actor: &Actor, id: &str, req: UpdateStaffRequest) -> Result<Staff> {
        actor.require(Role::Admin)?;
        let mut staff = self.get(actor, id).await?;

        if id == actor.staff_id
            && (req.is_active == Some(false) || req.role.is_some_and(|r| r != Role::Admin))
        {
            return Err(SopError::validation(
                "Admins cannot deactivate or demote themselves",
            ));
        }

        if let Some(name) = req.full_name {
            staff.full_name = require_name(&name)?;
        }
        if let Some(name_th) = req.full_name_th {
            staff.full_name_th = Some(name_th).filter(|s| !s.trim().is_empty());
        }
        if let Some(role) = req.role {
            staff.role = role;
        }
        if let Some(active) = req.is_active {
            staff.is_active = active;
        }
        staff.updated_at = Utc::now();

        self.storage.update_staff(&actor.scope, &staff).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::STAFF_UPDATED, "staff")
                    .resource(id)
                    .by(actor)
                    .metadata(json!({ "role": staff.role, "is_active": staff.is_active })),
            )
            .await;
        Ok(staff)
    }

    /// 重置 PIN 同时解除锁定
    pub async fn reset_pin(&self, actor: &Actor, id: &str, new_pin: &str) -> Result<()> {
        actor.require(Role::Admin)?;
        validate_new_pin(new_pin)?;
        let mut staff = self.get(actor, id).await?;
        staff.pin_hash = hash_pin(new_pin)?;
        staff.failed_pin_attempts = 0;
        staff.locked_until = None;
        staff.updated_at = Utc::now();
        self.storage.update_staff(&actor.scope, &staff).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::STAFF_PIN_RESET, "staff")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(())
    }

    pub async fn deactivate(&self, actor: &Actor, id: &str) -> Result<()> {
        actor.require(Role::Admin)?;
        if id == actor.staff_id {
            return Err(SopError::validation("Admins cannot deactivate themselves"));
        }
        let mut staff = self.get(actor, id).await?;
        staff.is_active = false;
        staff.updated_at = Utc::now();
        self.storage.update_staff(&actor.scope, &staff).await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::STAFF_DEACTIVATED, "staff")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(())
    }

    /// 创建餐厅与第一个管理员（CLI bootstrap 使用）
    pub async fn bootstrap(&self, req: BootstrapRequest) -> Result<(Restaurant, Staff)> {
        let restaurant = Restaurant {
            id: new_id(),
            name: require_name(&req.restaurant_name)?,
            name_th: req.restaurant_name_th.filter(|s| !s.trim().is_empty()),
            timezone: req.timezone,
            is_active: true,
            created_at: Utc::now(),
        };
        let scope = RestaurantScope::new(&restaurant.id);
        let admin = self
            .build_staff(
                &scope,
                CreateStaffRequest {
                    role: Role::Admin,
                    ..req.admin
                },
            )
            .await?;

        self.storage.insert_restaurant(&restaurant).await?;
        self.storage.insert_staff(&scope, &admin).await?;
        self.audit
            .record(
                &scope,
                AuditEvent::new(actions::STAFF_CREATED, "staff")
                    .resource(&admin.id)
                    .metadata(json!({ "email": admin.email, "bootstrap": true })),
            )
            .await;
        info!(
            "Bootstrapped restaurant {} with admin {}",
            restaurant.id, admin.email
        );
        Ok((restaurant, admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Chef@Example.COM ").unwrap(),
            "chef@example.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("a b@example.com").is_err());
    }
}
