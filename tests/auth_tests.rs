//! PIN login, lockout and staff lifecycle

mod common;

use common::{ADMIN_PIN, STAFF_PIN, setup, setup_with};
use sop_manager::errors::SopError;
use sop_manager::services::{LoginRequest, UpdateStaffRequest};
use sop_manager::storage::Role;

fn login_request(env: &common::TestEnv, email: &str, pin: &str) -> LoginRequest {
    LoginRequest {
        restaurant_id: env.restaurant_id.clone(),
        email: email.to_string(),
        pin: pin.to_string(),
    }
}

#[tokio::test]
async fn test_login_success_is_case_insensitive() {
    let env = setup().await;
    let staff = env
        .services
        .auth
        .login(&login_request(&env, "  OWNER@Baan.Example ", ADMIN_PIN), None)
        .await
        .unwrap();
    assert_eq!(staff.id, env.admin.id);
    assert_eq!(staff.role, Role::Admin);
    assert!(staff.last_login_at.is_some());
}

#[tokio::test]
async fn test_unknown_email_and_wrong_pin_share_message() {
    let env = setup().await;
    let unknown = env
        .services
        .auth
        .login(&login_request(&env, "ghost@baan.example", ADMIN_PIN), None)
        .await
        .unwrap_err();
    let wrong = env
        .services
        .auth
        .login(&login_request(&env, "owner@baan.example", "9999"), None)
        .await
        .unwrap_err();
    assert!(matches!(unknown, SopError::InvalidCredentials(_)));
    assert!(matches!(wrong, SopError::InvalidCredentials(_)));
    assert_eq!(unknown.message(), wrong.message());
}

#[tokio::test]
async fn test_unknown_email_costs_a_pin_hash() {
    use std::time::{Duration, Instant};

    let env = setup().await;
    let auth = &env.services.auth;
    // 预热诱饵哈希
    let _ = auth
        .login(&login_request(&env, "ghost@baan.example", "1111"), None)
        .await;

    let mut unknown = Duration::MAX;
    let mut wrong = Duration::MAX;
    for _ in 0..2 {
        let started = Instant::now();
        let _ = auth
            .login(&login_request(&env, "ghost@baan.example", "1111"), None)
            .await;
        unknown = unknown.min(started.elapsed());

        let started = Instant::now();
        let _ = auth
            .login(&login_request(&env, "owner@baan.example", "1111"), None)
            .await;
        wrong = wrong.min(started.elapsed());
    }
    // 两条路径都要做一次 Argon2 校验；只比较量级
    assert!(
        unknown * 4 >= wrong,
        "unknown email {:?} vs wrong PIN {:?}",
        unknown,
        wrong
    );
}

#[tokio::test]
async fn test_malformed_pin_is_validation_error() {
    let env = setup().await;
    let err = env
        .services
        .auth
        .login(&login_request(&env, "owner@baan.example", "12a4"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));
}

#[tokio::test]
async fn test_lockout_after_max_attempts() {
    let env = setup_with(|c| c.auth.max_pin_attempts = 3).await;
    let req = login_request(&env, "owner@baan.example", "0001");

    for _ in 0..2 {
        let err = env.services.auth.login(&req, None).await.unwrap_err();
        assert!(matches!(err, SopError::InvalidCredentials(_)));
    }
    // 第三次错误触发锁定
    let err = env.services.auth.login(&req, None).await.unwrap_err();
    assert!(matches!(err, SopError::AccountLocked(_)), "{:?}", err);

    // 锁定期间正确 PIN 也被拒绝
    let err = env
        .services
        .auth
        .login(&login_request(&env, "owner@baan.example", ADMIN_PIN), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::AccountLocked(_)));
}

#[tokio::test]
async fn test_successful_login_resets_failed_attempts() {
    let env = setup_with(|c| c.auth.max_pin_attempts = 3).await;
    let wrong = login_request(&env, "owner@baan.example", "0001");
    let right = login_request(&env, "owner@baan.example", ADMIN_PIN);

    for _ in 0..2 {
        assert!(env.services.auth.login(&wrong, None).await.is_err());
    }
    let staff = env.services.auth.login(&right, None).await.unwrap();
    assert_eq!(staff.failed_pin_attempts, 0);

    // 计数已清零，再错两次仍未锁定
    for _ in 0..2 {
        let err = env.services.auth.login(&wrong, None).await.unwrap_err();
        assert!(matches!(err, SopError::InvalidCredentials(_)));
    }
}

#[tokio::test]
async fn test_reset_pin_unlocks_account() {
    let env = setup_with(|c| c.auth.max_pin_attempts = 2).await;
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    let wrong = login_request(&env, "cook@baan.example", "0001");
    for _ in 0..2 {
        let _ = env.services.auth.login(&wrong, None).await;
    }
    assert!(matches!(
        env.services
            .auth
            .login(&login_request(&env, "cook@baan.example", STAFF_PIN), None)
            .await,
        Err(SopError::AccountLocked(_))
    ));

    env.services
        .staff
        .reset_pin(&env.admin_actor(), &cook.id, "5082")
        .await
        .unwrap();
    let staff = env
        .services
        .auth
        .login(&login_request(&env, "cook@baan.example", "5082"), None)
        .await
        .unwrap();
    assert_eq!(staff.id, cook.id);
}

#[tokio::test]
async fn test_weak_pin_rejected_on_reset() {
    let env = setup().await;
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    for pin in ["0000", "1234", "7777"] {
        let err = env
            .services
            .staff
            .reset_pin(&env.admin_actor(), &cook.id, pin)
            .await
            .unwrap_err();
        assert!(matches!(err, SopError::Validation(_)), "{}", pin);
    }
}

#[tokio::test]
async fn test_deactivated_staff_cannot_log_in() {
    let env = setup().await;
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    env.services
        .staff
        .deactivate(&env.admin_actor(), &cook.id)
        .await
        .unwrap();
    let err = env
        .services
        .auth
        .login(&login_request(&env, "cook@baan.example", STAFF_PIN), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::InvalidCredentials(_)));
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let env = setup().await;
    let err = env
        .services
        .staff
        .deactivate(&env.admin_actor(), &env.admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let env = setup().await;
    env.add_staff("cook@baan.example", Role::Staff).await;
    let err = env
        .services
        .staff
        .create(
            &env.admin_actor(),
            sop_manager::services::CreateStaffRequest {
                email: "COOK@baan.example".to_string(),
                full_name: "Another Cook".to_string(),
                full_name_th: None,
                role: Role::Staff,
                pin: STAFF_PIN.to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Conflict(_)), "{:?}", err);
}

#[tokio::test]
async fn test_staff_management_requires_admin() {
    let env = setup().await;
    let manager = env.add_staff("manager@baan.example", Role::Manager).await;
    let actor = env.actor_for(&manager);

    assert!(matches!(
        env.services.staff.list(&actor).await,
        Err(SopError::Forbidden(_))
    ));
    // 自己的资料可以读
    let me = env.services.staff.get(&actor, &manager.id).await.unwrap();
    assert_eq!(me.email, "manager@baan.example");
    assert!(matches!(
        env.services
            .staff
            .update(
                &actor,
                &manager.id,
                UpdateStaffRequest {
                    role: Some(Role::Admin),
                    ..Default::default()
                }
            )
            .await,
        Err(SopError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_login_is_scoped_to_restaurant() {
    let env = setup().await;
    let other = env.second_restaurant().await;
    // 第二家餐厅的 admin 不能用第一家的 restaurant_id 登录
    let err = env
        .services
        .auth
        .login(&login_request(&env, "owner@second.example", ADMIN_PIN), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::InvalidCredentials(_)));

    let staff = env
        .services
        .auth
        .login(
            &LoginRequest {
                restaurant_id: other.scope.restaurant_id().to_string(),
                email: "owner@second.example".to_string(),
                pin: ADMIN_PIN.to_string(),
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(staff.id, other.staff_id);
}
