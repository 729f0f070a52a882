//! Audit trail filters and manager reports

mod common;

use chrono::{Duration, Utc};

use common::{ADMIN_PIN, STAFF_PIN, TestEnv, setup};
use sop_manager::errors::SopError;
use sop_manager::services::{LoginRequest, ModuleInput, PageRequest, actions};
use sop_manager::storage::{AuditFilter, QuestionOption, Role, TrainingQuestion};

async fn login(env: &TestEnv, email: &str, pin: &str) -> Result<(), SopError> {
    env.services
        .auth
        .login(
            &LoginRequest {
                restaurant_id: env.restaurant_id.clone(),
                email: email.to_string(),
                pin: pin.to_string(),
            },
            Some("203.0.113.9".to_string()),
        )
        .await
        .map(|_| ())
}

fn yes_no(prompt: &str) -> TrainingQuestion {
    TrainingQuestion {
        prompt_en: prompt.to_string(),
        prompt_th: prompt.to_string(),
        options: vec![
            QuestionOption {
                text_en: "Yes".to_string(),
                text_th: "ใช่".to_string(),
            },
            QuestionOption {
                text_en: "No".to_string(),
                text_th: "ไม่ใช่".to_string(),
            },
        ],
        correct_index: 0,
    }
}

#[tokio::test]
async fn test_login_events_are_audited_and_filterable() {
    let env = setup().await;
    login(&env, "owner@baan.example", ADMIN_PIN).await.unwrap();
    assert!(login(&env, "owner@baan.example", "9999").await.is_err());

    let admin = env.admin_actor();
    let filter = AuditFilter {
        action: Some(actions::LOGIN_FAILED.to_string()),
        ..Default::default()
    };
    let page = env
        .services
        .audit
        .list(&admin, &filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].ip_address.as_deref(), Some("203.0.113.9"));

    let filter = AuditFilter {
        staff_id: Some(env.admin.id.clone()),
        action: Some(actions::LOGIN_SUCCESS.to_string()),
        ..Default::default()
    };
    let page = env
        .services
        .audit
        .list(&admin, &filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    // 未来的时间窗口里没有记录
    let filter = AuditFilter {
        from: Some(Utc::now() + Duration::hours(1)),
        ..Default::default()
    };
    let page = env
        .services
        .audit
        .list(&admin, &filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_audit_log_requires_admin() {
    let env = setup().await;
    let manager = env.add_staff("chef@baan.example", Role::Manager).await;
    let err = env
        .services
        .audit
        .list(
            &env.actor_for(&manager),
            &AuditFilter::default(),
            PageRequest::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Forbidden(_)));
}

#[tokio::test]
async fn test_dashboard_counts() {
    let env = setup().await;
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    login(&env, "cook@baan.example", STAFF_PIN).await.unwrap();

    let module = env
        .services
        .training
        .create_module(
            &env.admin_actor(),
            ModuleInput {
                sop_id: None,
                title_en: "Allergens".to_string(),
                title_th: "สารก่อภูมิแพ้".to_string(),
                description_en: None,
                description_th: None,
                questions: vec![yes_no("Peanuts are allergens?"), yes_no("Label every dish?")],
                passing_score: None,
                duration_minutes: None,
                certificate_valid_days: Some(20),
                is_active: None,
            },
        )
        .await
        .unwrap();
    env.services
        .training
        .submit_assessment(&env.actor_for(&cook), &module.id, &[0, 0])
        .await
        .unwrap();

    let dashboard = env
        .services
        .analytics
        .dashboard(&env.admin_actor())
        .await
        .unwrap();
    assert_eq!(dashboard.staff.active_staff, 2);
    assert_eq!(dashboard.staff.recent_logins, 1);
    assert_eq!(dashboard.training.total_modules, 1);
    assert_eq!(dashboard.training.enrollments, 1);
    assert_eq!(dashboard.training.completions, 1);
    assert_eq!(dashboard.training.completion_rate, 100.0);
    assert_eq!(dashboard.certificates.active, 1);
    // 有效期 20 天，落在 30 天提醒窗口内
    assert_eq!(dashboard.certificates.expiring_soon, 1);
    assert_eq!(dashboard.sops.total, 0);
}

#[tokio::test]
async fn test_module_report() {
    let env = setup().await;
    let pass = env.add_staff("a@baan.example", Role::Staff).await;
    let fail = env.add_staff("b@baan.example", Role::Staff).await;
    let idle = env.add_staff("c@baan.example", Role::Staff).await;

    let module = env
        .services
        .training
        .create_module(
            &env.admin_actor(),
            ModuleInput {
                sop_id: None,
                title_en: "Closing".to_string(),
                title_th: "ปิดร้าน".to_string(),
                description_en: None,
                description_th: None,
                questions: vec![yes_no("Lock the door?"), yes_no("Turn off gas?")],
                passing_score: Some(100),
                duration_minutes: None,
                certificate_valid_days: None,
                is_active: None,
            },
        )
        .await
        .unwrap();
    let training = &env.services.training;
    training
        .submit_assessment(&env.actor_for(&pass), &module.id, &[0, 0])
        .await
        .unwrap();
    training
        .submit_assessment(&env.actor_for(&fail), &module.id, &[0, 1])
        .await
        .unwrap();
    training
        .start_module(&env.actor_for(&idle), &module.id)
        .await
        .unwrap();

    let report = env
        .services
        .analytics
        .module_report(&env.admin_actor(), &module.id)
        .await
        .unwrap();
    assert_eq!(report.enrolled, 3);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.in_progress, 1);
    assert_eq!(report.completion_rate, 33.3);
    assert_eq!(report.pass_rate, 50.0);
    assert_eq!(report.average_score, Some(75.0));

    assert!(matches!(
        env.services
            .analytics
            .module_report(&env.actor_for(&idle), &module.id)
            .await,
        Err(SopError::Forbidden(_))
    ));
}
