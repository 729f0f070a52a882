//! Training modules, progress, assessments and certificates

mod common;

use common::{TestEnv, setup};
use sop_manager::errors::SopError;
use sop_manager::services::{Actor, ModuleInput};
use sop_manager::storage::{
    CertificateStatus, ProgressStatus, QuestionOption, Role, TrainingModule, TrainingQuestion,
};

fn question(prompt: &str, correct_index: usize) -> TrainingQuestion {
    TrainingQuestion {
        prompt_en: prompt.to_string(),
        prompt_th: format!("{} (TH)", prompt),
        options: ["A", "B", "C"]
            .iter()
            .map(|o| QuestionOption {
                text_en: o.to_string(),
                text_th: o.to_string(),
            })
            .collect(),
        correct_index,
    }
}

fn module_input() -> ModuleInput {
    ModuleInput {
        sop_id: None,
        title_en: "Food safety basics".to_string(),
        title_th: "ความปลอดภัยของอาหาร".to_string(),
        description_en: None,
        description_th: None,
        questions: vec![
            question("Fridge temperature?", 0),
            question("Hand washing time?", 1),
            question("Raw chicken shelf?", 2),
            question("Allergen label?", 0),
            question("Thawing method?", 1),
        ],
        passing_score: Some(80),
        duration_minutes: None,
        certificate_valid_days: Some(180),
        is_active: None,
    }
}

async fn create_module(env: &TestEnv) -> TrainingModule {
    env.services
        .training
        .create_module(&env.admin_actor(), module_input())
        .await
        .unwrap()
}

async fn cook(env: &TestEnv) -> Actor {
    let staff = env.add_staff("cook@baan.example", Role::Staff).await;
    env.actor_for(&staff)
}

const ALL_CORRECT: [usize; 5] = [0, 1, 2, 0, 1];
const TWO_CORRECT: [usize; 5] = [0, 1, 0, 1, 0];

#[tokio::test]
async fn test_module_defaults_and_validation() {
    let env = setup().await;
    let module = create_module(&env).await;
    assert_eq!(module.passing_score, 80);
    assert_eq!(module.duration_minutes, 30);
    assert_eq!(module.certificate_valid_days, 180);
    assert!(module.is_active);

    let mut bad = module_input();
    bad.questions[0].correct_index = 7;
    let err = env
        .services
        .training
        .create_module(&env.admin_actor(), bad)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));

    let mut bad = module_input();
    bad.sop_id = Some("missing-sop".to_string());
    assert!(
        env.services
            .training
            .create_module(&env.admin_actor(), bad)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_staff_cannot_manage_or_read_answers() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;

    assert!(matches!(
        env.services.training.create_module(&cook, module_input()).await,
        Err(SopError::Forbidden(_))
    ));
    assert!(matches!(
        env.services.training.get_module(&cook, &module.id).await,
        Err(SopError::Forbidden(_))
    ));

    let view = env
        .services
        .training
        .get_module_view(&cook, &module.id)
        .await
        .unwrap();
    assert_eq!(view.questions.len(), 5);
    let json = serde_json::to_value(&view).unwrap();
    assert!(json["questions"][0].get("correct_index").is_none());
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;

    // 未开始时不能更新进度
    let err = env
        .services
        .training
        .update_progress(&cook, &module.id, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));

    let started = env
        .services
        .training
        .start_module(&cook, &module.id)
        .await
        .unwrap();
    assert_eq!(started.status, ProgressStatus::InProgress);
    assert!(started.started_at.is_some());

    let p = env
        .services
        .training
        .update_progress(&cook, &module.id, 60)
        .await
        .unwrap();
    assert_eq!(p.progress_percent, 60);
    let p = env
        .services
        .training
        .update_progress(&cook, &module.id, 30)
        .await
        .unwrap();
    assert_eq!(p.progress_percent, 60);

    assert!(matches!(
        env.services
            .training
            .update_progress(&cook, &module.id, 101)
            .await,
        Err(SopError::Validation(_))
    ));
}

#[tokio::test]
async fn test_failed_then_passed_assessment() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;

    let err = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &[0, 1])
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::AssessmentMismatch(_)));

    let failed = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &TWO_CORRECT)
        .await
        .unwrap();
    assert_eq!(failed.score, 40);
    assert!(!failed.passed);
    assert!(failed.certificate.is_none());
    assert_eq!(failed.progress.status, ProgressStatus::Failed);
    assert_eq!(failed.progress.attempts, 1);

    let passed = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &ALL_CORRECT)
        .await
        .unwrap();
    assert_eq!(passed.score, 100);
    assert!(passed.passed);
    assert_eq!(passed.progress.status, ProgressStatus::Completed);
    assert_eq!(passed.progress.progress_percent, 100);
    assert_eq!(passed.progress.attempts, 2);
    assert_eq!(passed.progress.best_score, Some(100));

    let cert = passed.certificate.unwrap();
    assert!(cert.certificate_number.starts_with("CERT-"));
    assert_eq!((cert.expires_at - cert.issued_at).num_days(), 180);

    // 重考失败不会撤销完成状态
    let retake = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &TWO_CORRECT)
        .await
        .unwrap();
    assert_eq!(retake.progress.status, ProgressStatus::Completed);
    assert_eq!(retake.progress.best_score, Some(100));
}

#[tokio::test]
async fn test_new_certificate_supersedes_previous() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;

    let first = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &ALL_CORRECT)
        .await
        .unwrap()
        .certificate
        .unwrap();
    let second = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &ALL_CORRECT)
        .await
        .unwrap()
        .certificate
        .unwrap();

    let certs = env.services.training.my_certificates(&cook).await.unwrap();
    assert_eq!(certs.len(), 2);
    let old = certs.iter().find(|c| c.id == first.id).unwrap();
    let new = certs.iter().find(|c| c.id == second.id).unwrap();
    assert_eq!(old.status, CertificateStatus::Revoked);
    assert_eq!(new.status, CertificateStatus::Active);
}

#[tokio::test]
async fn test_verify_and_revoke_certificate() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;
    let cert = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &ALL_CORRECT)
        .await
        .unwrap()
        .certificate
        .unwrap();

    let check = env
        .services
        .training
        .verify_certificate(&cook, &cert.certificate_number)
        .await
        .unwrap();
    assert!(check.valid);

    assert!(matches!(
        env.services.training.revoke_certificate(&cook, &cert.id).await,
        Err(SopError::Forbidden(_))
    ));
    let revoked = env
        .services
        .training
        .revoke_certificate(&env.admin_actor(), &cert.id)
        .await
        .unwrap();
    assert_eq!(revoked.status, CertificateStatus::Revoked);
    // 重复撤销是幂等的
    env.services
        .training
        .revoke_certificate(&env.admin_actor(), &cert.id)
        .await
        .unwrap();

    let check = env
        .services
        .training
        .verify_certificate(&env.admin_actor(), &cert.certificate_number)
        .await
        .unwrap();
    assert!(!check.valid);

    // 其他餐厅查不到这张证书
    let other = env.second_restaurant().await;
    assert!(matches!(
        env.services
            .training
            .verify_certificate(&other, &cert.certificate_number)
            .await,
        Err(SopError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_inactive_module_hidden_from_staff() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;

    let mut input = module_input();
    input.is_active = Some(false);
    env.services
        .training
        .update_module(&env.admin_actor(), &module.id, input)
        .await
        .unwrap();

    assert!(
        env.services
            .training
            .list_module_views(&cook)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        env.services.training.start_module(&cook, &module.id).await,
        Err(SopError::NotFound(_))
    ));
    // manager 仍能看到
    assert_eq!(
        env.services
            .training
            .list_modules(&env.admin_actor())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_progress_listing_roles() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;
    env.services
        .training
        .start_module(&cook, &module.id)
        .await
        .unwrap();

    assert_eq!(env.services.training.my_progress(&cook).await.unwrap().len(), 1);
    assert!(matches!(
        env.services.training.list_progress(&cook, None, None).await,
        Err(SopError::Forbidden(_))
    ));
    let all = env
        .services
        .training
        .list_progress(&env.admin_actor(), None, Some(&module.id))
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].staff_id, cook.staff_id);
}

#[tokio::test]
async fn test_certificate_validity_is_bounded() {
    let env = setup().await;
    let mut input = module_input();
    input.certificate_valid_days = Some(100_000_000);
    let err = env
        .services
        .training
        .create_module(&env.admin_actor(), input)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));

    // 合法的模块在更新时也不能被改成超长有效期
    let module = create_module(&env).await;
    let mut input = module_input();
    input.certificate_valid_days = Some(u32::MAX);
    assert!(matches!(
        env.services
            .training
            .update_module(&env.admin_actor(), &module.id, input)
            .await,
        Err(SopError::Validation(_))
    ));

    let cook = cook(&env).await;
    let result = env
        .services
        .training
        .submit_assessment(&cook, &module.id, &ALL_CORRECT)
        .await
        .unwrap();
    assert!(result.passed);
}

#[tokio::test]
async fn test_concurrent_submissions_count_every_attempt() {
    let env = setup().await;
    let module = create_module(&env).await;
    let cook = cook(&env).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let training = env.services.training.clone();
            let cook = cook.clone();
            let module_id = module.id.clone();
            tokio::spawn(async move {
                training
                    .submit_assessment(&cook, &module_id, &TWO_CORRECT)
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 8);

    let progress = env.services.training.my_progress(&cook).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].attempts, succeeded);
    assert_eq!(progress[0].best_score, Some(40));
    assert_eq!(progress[0].status, ProgressStatus::Failed);
}
