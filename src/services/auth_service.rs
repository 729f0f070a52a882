//! PIN 登录
//!
//! 未知邮箱、停用账号与错误 PIN 返回同一条消息；
//! 连续错误达到阈值后锁定账号一段时间。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use super::audit_service::{AuditEvent, AuditService, actions};
use super::context::Actor;
use crate::config::AuthConfig;
use crate::errors::{Result, SopError};
use crate::storage::{RestaurantScope, SeaOrmStorage, Staff};
use crate::utils::pin::{validate_pin_format, verify_pin, verify_pin_decoy};

const INVALID_CREDENTIALS: &str = "Invalid email or PIN";

#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    pub max_pin_attempts: u32,
    pub lockout: Duration,
}

impl AuthPolicy {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            max_pin_attempts: auth.max_pin_attempts.max(1),
            lockout: Duration::minutes(auth.lockout_minutes as i64),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub restaurant_id: String,
    pub email: String,
    pub pin: String,
}

fn locked_error(until: DateTime<Utc>, now: DateTime<Utc>) -> SopError {
    let remaining = (until - now).num_seconds().max(1);
    SopError::account_locked(format!(
        "Account is locked, try again in {} seconds",
        remaining
    ))
}

pub struct AuthService {
    storage: Arc<SeaOrmStorage>,
    audit: Arc<AuditService>,
    policy: AuthPolicy,
}

impl AuthService {
    pub fn new(storage: Arc<SeaOrmStorage>, audit: Arc<AuditService>, policy: AuthPolicy) -> Self {
        Self {
            storage,
            audit,
            policy,
        }
    }

    /// 校验 (restaurant, email, PIN)，成功返回最新的员工信息
    pub async fn login(&self, req: &LoginRequest, ip: Option<String>) -> Result<Staff> {
        validate_pin_format(&req.pin)?;

        let restaurant = self.storage.find_restaurant(&req.restaurant_id).await?;
        if !restaurant.is_some_and(|r| r.is_active) {
            verify_pin_decoy(&req.pin);
            return Err(SopError::invalid_credentials(INVALID_CREDENTIALS));
        }

        let scope = RestaurantScope::new(&req.restaurant_id);
        let email = req.email.trim().to_lowercase();
        let now = Utc::now();

        let staff = match self.storage.find_staff_by_email(&scope, &email).await? {
            Some(s) if s.is_active => s,
            _ => {
                verify_pin_decoy(&req.pin);
                self.audit
                    .record(
                        &scope,
                        AuditEvent::new(actions::LOGIN_FAILED, "staff")
                            .ip(ip)
                            .metadata(json!({ "email": email, "reason": "unknown_or_inactive" })),
                    )
                    .await;
                return Err(SopError::invalid_credentials(INVALID_CREDENTIALS));
            }
        };

        if let Some(until) = staff.locked_until.filter(|u| *u > now) {
            self.audit
                .record(
                    &scope,
                    AuditEvent::new(actions::LOGIN_FAILED, "staff")
                        .resource(&staff.id)
                        .staff(Some(staff.id.clone()))
                        .ip(ip)
                        .metadata(json!({ "reason": "locked" })),
                )
                .await;
            return Err(locked_error(until, now));
        }

        if !verify_pin(&req.pin, &staff.pin_hash)? {
            let failure = self
                .storage
                .record_failed_pin(
                    &scope,
                    &staff.id,
                    self.policy.max_pin_attempts,
                    self.policy.lockout,
                    now,
                )
                .await?;

            if let Some(until) = failure.locked_until {
                warn!(
                    "Staff {} locked after {} failed PIN attempts",
                    staff.id, failure.attempts
                );
                self.audit
                    .record(
                        &scope,
                        AuditEvent::new(actions::ACCOUNT_LOCKED, "staff")
                            .resource(&staff.id)
                            .staff(Some(staff.id.clone()))
                            .ip(ip)
                            .metadata(json!({ "locked_until": until.to_rfc3339() })),
                    )
                    .await;
                return Err(locked_error(until, now));
            }

            self.audit
                .record(
                    &scope,
                    AuditEvent::new(actions::LOGIN_FAILED, "staff")
                        .resource(&staff.id)
                        .staff(Some(staff.id.clone()))
                        .ip(ip)
                        .metadata(json!({ "reason": "wrong_pin", "attempts": failure.attempts })),
                )
                .await;
            return Err(SopError::invalid_credentials(INVALID_CREDENTIALS));
        }

        self.storage
            .record_successful_login(&scope, &staff.id, now)
            .await?;
        self.audit
            .record(
                &scope,
                AuditEvent::new(actions::LOGIN_SUCCESS, "staff")
                    .resource(&staff.id)
                    .staff(Some(staff.id.clone()))
                    .ip(ip),
            )
            .await;
        info!("Staff {} logged in to {}", staff.id, scope.restaurant_id());

        Ok(Staff {
            failed_pin_attempts: 0,
            locked_until: None,
            last_login_at: Some(now),
            ..staff
        })
    }

    /// 当前会话对应的员工；账号被删除或停用时会话失效
    pub async fn session(&self, actor: &Actor) -> Result<Staff> {
        match self.storage.find_staff(&actor.scope, &actor.staff_id).await? {
            Some(staff) if staff.is_active => Ok(staff),
            _ => Err(SopError::unauthorized("Session is no longer valid")),
        }
    }

    pub async fn logout(&self, actor: &Actor) {
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::LOGOUT, "staff")
                    .resource(&actor.staff_id)
                    .by(actor),
            )
            .await;
    }
}
