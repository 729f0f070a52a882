//! Translation keys, value workflow, bundles and coverage

mod common;

use common::{TestEnv, setup};
use sop_manager::errors::SopError;
use sop_manager::services::KeyInput;
use sop_manager::storage::{Locale, Role, TranslationKey, TranslationStatus};

async fn create_key(env: &TestEnv, key: &str) -> TranslationKey {
    env.services
        .translations
        .create_key(
            &env.admin_actor(),
            KeyInput {
                key: key.to_string(),
                category: "Menu".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
}

/// draft → review → approved → published
async fn publish(env: &TestEnv, key_id: &str, locale: Locale, value: &str) {
    let admin = env.admin_actor();
    let t = &env.services.translations;
    t.upsert(&admin, key_id, locale, value).await.unwrap();
    for next in [
        TranslationStatus::Review,
        TranslationStatus::Approved,
        TranslationStatus::Published,
    ] {
        t.change_status(&admin, key_id, locale, next).await.unwrap();
    }
}

#[tokio::test]
async fn test_key_validation_and_uniqueness() {
    let env = setup().await;
    let key = create_key(&env, "menu.pad_thai").await;
    assert_eq!(key.key, "menu.pad_thai");
    assert_eq!(key.category, "menu");

    let admin = env.admin_actor();
    let err = env
        .services
        .translations
        .create_key(
            &admin,
            KeyInput {
                key: "Menu.PadThai".to_string(),
                category: "menu".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));

    let err = env
        .services
        .translations
        .create_key(
            &admin,
            KeyInput {
                key: "menu.pad_thai".to_string(),
                category: "menu".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Conflict(_)));
}

#[tokio::test]
async fn test_upsert_resets_to_draft_and_bumps_version() {
    let env = setup().await;
    let key = create_key(&env, "menu.green_curry").await;
    let admin = env.admin_actor();
    let t = &env.services.translations;

    let first = t
        .upsert(&admin, &key.id, Locale::En, "Green curry")
        .await
        .unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(first.status, TranslationStatus::Draft);

    t.change_status(&admin, &key.id, Locale::En, TranslationStatus::Review)
        .await
        .unwrap();
    let second = t
        .upsert(&admin, &key.id, Locale::En, "Green curry with chicken")
        .await
        .unwrap();
    assert_eq!(second.version, 2);
    assert_eq!(second.status, TranslationStatus::Draft);

    assert!(matches!(
        t.upsert(&admin, &key.id, Locale::En, "   ").await,
        Err(SopError::Validation(_))
    ));
    assert!(matches!(
        t.upsert(&admin, "no-such-key", Locale::En, "x").await,
        Err(SopError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_status_workflow_rejects_skips() {
    let env = setup().await;
    let key = create_key(&env, "kitchen.wash_hands").await;
    let admin = env.admin_actor();
    let t = &env.services.translations;
    t.upsert(&admin, &key.id, Locale::Th, "ล้างมือ").await.unwrap();

    let err = t
        .change_status(&admin, &key.id, Locale::Th, TranslationStatus::Published)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::TranslationTransition(_)));

    // review 可以退回 draft
    t.change_status(&admin, &key.id, Locale::Th, TranslationStatus::Review)
        .await
        .unwrap();
    let back = t
        .change_status(&admin, &key.id, Locale::Th, TranslationStatus::Draft)
        .await
        .unwrap();
    assert_eq!(back.status, TranslationStatus::Draft);

    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    assert!(matches!(
        t.change_status(
            &env.actor_for(&cook),
            &key.id,
            Locale::Th,
            TranslationStatus::Review
        )
        .await,
        Err(SopError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_bundle_contains_only_published_values() {
    let env = setup().await;
    let admin = env.admin_actor();
    let t = &env.services.translations;
    let soup = create_key(&env, "menu.tom_yum").await;
    let rice = create_key(&env, "menu.sticky_rice").await;

    // 先读一次，让空包进入缓存
    assert!(t.get_bundle(&admin, Locale::En, false).await.unwrap().is_empty());

    publish(&env, &soup.id, Locale::En, "Tom yum soup").await;
    t.upsert(&admin, &rice.id, Locale::En, "Sticky rice")
        .await
        .unwrap();

    let bundle = t.get_bundle(&admin, Locale::En, false).await.unwrap();
    assert_eq!(bundle.len(), 1);
    assert_eq!(bundle.get("menu.tom_yum").map(String::as_str), Some("Tom yum soup"));

    // 新草稿覆盖已发布值后，包里不再有它
    t.upsert(&admin, &soup.id, Locale::En, "Tom yum goong")
        .await
        .unwrap();
    let bundle = t.get_bundle(&admin, Locale::En, false).await.unwrap();
    assert!(bundle.get("menu.tom_yum").is_none());
}

#[tokio::test]
async fn test_thai_bundle_falls_back_to_english() {
    let env = setup().await;
    let admin = env.admin_actor();
    let t = &env.services.translations;
    let soup = create_key(&env, "menu.tom_yum").await;
    let rice = create_key(&env, "menu.sticky_rice").await;

    publish(&env, &soup.id, Locale::En, "Tom yum soup").await;
    publish(&env, &soup.id, Locale::Th, "ต้มยำ").await;
    publish(&env, &rice.id, Locale::En, "Sticky rice").await;

    let plain = t.get_bundle(&admin, Locale::Th, false).await.unwrap();
    assert_eq!(plain.len(), 1);

    let merged = t.get_bundle(&admin, Locale::Th, true).await.unwrap();
    assert_eq!(merged.get("menu.tom_yum").map(String::as_str), Some("ต้มยำ"));
    assert_eq!(
        merged.get("menu.sticky_rice").map(String::as_str),
        Some("Sticky rice")
    );

    // 任何员工都能读取译文包
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    assert!(t.get_bundle(&env.actor_for(&cook), Locale::En, false).await.is_ok());
}

#[tokio::test]
async fn test_history_and_coverage() {
    let env = setup().await;
    let admin = env.admin_actor();
    let t = &env.services.translations;
    let soup = create_key(&env, "menu.tom_yum").await;
    create_key(&env, "menu.sticky_rice").await;

    publish(&env, &soup.id, Locale::En, "Tom yum soup").await;
    t.upsert(&admin, &soup.id, Locale::En, "Tom yum goong")
        .await
        .unwrap();

    let history = t.history(&admin, &soup.id, Locale::En).await.unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].version, 2);
    assert_eq!(history[0].value, "Tom yum goong");
    assert!(
        history
            .iter()
            .any(|h| h.status == TranslationStatus::Published && h.version == 1)
    );

    publish(&env, &soup.id, Locale::En, "Tom yum goong").await;
    let coverage = t.coverage(&admin).await.unwrap();
    let en = coverage.iter().find(|c| c.locale == Locale::En).unwrap();
    let th = coverage.iter().find(|c| c.locale == Locale::Th).unwrap();
    assert_eq!(en.total_keys, 2);
    assert_eq!(en.published, 1);
    assert_eq!(en.percent, 50.0);
    assert_eq!(th.published, 0);
    assert_eq!(th.percent, 0.0);
}

#[tokio::test]
async fn test_deleting_key_drops_it_from_bundle() {
    let env = setup().await;
    let admin = env.admin_actor();
    let t = &env.services.translations;
    let soup = create_key(&env, "menu.tom_yum").await;
    publish(&env, &soup.id, Locale::En, "Tom yum soup").await;
    assert_eq!(t.get_bundle(&admin, Locale::En, false).await.unwrap().len(), 1);

    t.delete_key(&admin, &soup.id).await.unwrap();
    assert!(t.get_bundle(&admin, Locale::En, false).await.unwrap().is_empty());
    assert!(matches!(
        t.get_key(&admin, &soup.id).await,
        Err(SopError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_upserts_keep_every_version() {
    let env = setup().await;
    let key = create_key(&env, "menu.mango_rice").await;
    let admin = env.admin_actor();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let translations = env.services.translations.clone();
            let admin = admin.clone();
            let key_id = key.id.clone();
            tokio::spawn(async move {
                translations
                    .upsert(&admin, &key_id, Locale::En, &format!("Mango sticky rice #{}", i))
                    .await
            })
        })
        .collect();

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap().version);
    }
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2, 3, 4, 5, 6]);

    let t = &env.services.translations;
    let current = t.get_translation(&admin, &key.id, Locale::En).await.unwrap();
    assert_eq!(current.version, 6);
    let history = t.history(&admin, &key.id, Locale::En).await.unwrap();
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].version, 6);
}

#[tokio::test]
async fn test_concurrent_status_changes_apply_once() {
    let env = setup().await;
    let key = create_key(&env, "menu.som_tam").await;
    let admin = env.admin_actor();
    env.services
        .translations
        .upsert(&admin, &key.id, Locale::Th, "ส้มตำ")
        .await
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let translations = env.services.translations.clone();
            let admin = admin.clone();
            let key_id = key.id.clone();
            tokio::spawn(async move {
                translations
                    .change_status(&admin, &key_id, Locale::Th, TranslationStatus::Review)
                    .await
            })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(t) => {
                assert_eq!(t.status, TranslationStatus::Review);
                applied += 1;
            }
            Err(e) => assert!(matches!(e, SopError::TranslationTransition(_))),
        }
    }
    assert_eq!(applied, 1);

    let history = env
        .services
        .translations
        .history(&admin, &key.id, Locale::Th)
        .await
        .unwrap();
    // 一次写值 + 一次状态变化
    assert_eq!(history.len(), 2);
}
