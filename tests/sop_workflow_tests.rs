//! SOP categories, document lifecycle, visibility and search

mod common;

use common::{TestEnv, setup};
use sop_manager::errors::SopError;
use sop_manager::services::{
    Actor, CategoryInput, CreateSopRequest, PageRequest, UpdateSopRequest,
};
use sop_manager::storage::{Role, SopCategory, SopDocument, SopFilter, SopStatus, SopStep};

async fn kitchen_category(env: &TestEnv) -> SopCategory {
    env.services
        .sops
        .create_category(
            &env.admin_actor(),
            CategoryInput {
                code: "kitchen".to_string(),
                name_en: "Kitchen".to_string(),
                name_th: "ครัว".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

async fn create_sop(env: &TestEnv, actor: &Actor, category_id: &str, title: &str) -> SopDocument {
    env.services
        .sops
        .create(
            actor,
            CreateSopRequest {
                category_id: category_id.to_string(),
                title_en: title.to_string(),
                title_th: format!("{} (TH)", title),
                content_en: "Wash hands before handling food".to_string(),
                content_th: "ล้างมือก่อนจับอาหาร".to_string(),
                steps: vec![
                    SopStep {
                        order: 2,
                        text_en: "Rinse".to_string(),
                        text_th: "ล้าง".to_string(),
                    },
                    SopStep {
                        order: 1,
                        text_en: "Soap".to_string(),
                        text_th: "สบู่".to_string(),
                    },
                ],
                tags: vec!["Hygiene".to_string(), "hygiene ".to_string()],
            },
        )
        .await
        .unwrap()
}

async fn approve(env: &TestEnv, actor: &Actor, id: &str) -> SopDocument {
    env.services
        .sops
        .change_status(actor, id, SopStatus::Review)
        .await
        .unwrap();
    env.services
        .sops
        .change_status(actor, id, SopStatus::Approved)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_category_code_is_normalized() {
    let env = setup().await;
    let category = kitchen_category(&env).await;
    assert_eq!(category.code, "KITCHEN");

    let err = env
        .services
        .sops
        .create_category(
            &env.admin_actor(),
            CategoryInput {
                code: "kitchen".to_string(),
                name_en: "Kitchen again".to_string(),
                name_th: "ครัว".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Conflict(_)), "{:?}", err);
}

#[tokio::test]
async fn test_create_normalizes_steps_and_tags() {
    let env = setup().await;
    let category = kitchen_category(&env).await;
    let doc = create_sop(&env, &env.admin_actor(), &category.id, "Hand washing").await;

    assert_eq!(doc.status, SopStatus::Draft);
    assert_eq!(doc.version, 1);
    assert_eq!(
        doc.steps.iter().map(|s| s.order).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(doc.tags, vec!["hygiene".to_string()]);
}

#[tokio::test]
async fn test_unknown_category_rejected() {
    let env = setup().await;
    let err = env
        .services
        .sops
        .create(
            &env.admin_actor(),
            CreateSopRequest {
                category_id: "missing".to_string(),
                title_en: "x".to_string(),
                title_th: "x".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Validation(_)));
}

#[tokio::test]
async fn test_status_workflow() {
    let env = setup().await;
    let admin = env.admin_actor();
    let category = kitchen_category(&env).await;
    let doc = create_sop(&env, &admin, &category.id, "Opening checklist").await;

    // draft 不能直接批准
    let err = env
        .services
        .sops
        .change_status(&admin, &doc.id, SopStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::SopTransition(_)));

    let approved = approve(&env, &admin, &doc.id).await;
    assert_eq!(approved.status, SopStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some(admin.staff_id.as_str()));
    assert!(approved.approved_at.is_some());

    let archived = env
        .services
        .sops
        .change_status(&admin, &doc.id, SopStatus::Archived)
        .await
        .unwrap();
    assert_eq!(archived.status, SopStatus::Archived);

    // 归档后必须先恢复才能编辑
    let err = env
        .services
        .sops
        .update(
            &admin,
            &doc.id,
            UpdateSopRequest {
                title_en: Some("Changed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::SopTransition(_)));

    let restored = env
        .services
        .sops
        .change_status(&admin, &doc.id, SopStatus::Draft)
        .await
        .unwrap();
    assert_eq!(restored.status, SopStatus::Draft);
    assert!(restored.approved_by.is_none());
}

#[tokio::test]
async fn test_editing_approved_sop_bumps_version_and_returns_to_draft() {
    let env = setup().await;
    let admin = env.admin_actor();
    let category = kitchen_category(&env).await;
    let doc = create_sop(&env, &admin, &category.id, "Closing checklist").await;
    approve(&env, &admin, &doc.id).await;

    let updated = env
        .services
        .sops
        .update(
            &admin,
            &doc.id,
            UpdateSopRequest {
                content_en: Some("Turn off the gas first".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.status, SopStatus::Draft);
    assert!(updated.approved_at.is_none());

    // 无实际变化时版本不变
    let same = env
        .services
        .sops
        .update(
            &admin,
            &doc.id,
            UpdateSopRequest {
                content_en: Some("Turn off the gas first".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.version, 2);
}

#[tokio::test]
async fn test_staff_only_sees_approved() {
    let env = setup().await;
    let admin = env.admin_actor();
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    let cook = env.actor_for(&cook);
    let category = kitchen_category(&env).await;

    let draft = create_sop(&env, &admin, &category.id, "Draft SOP").await;
    let published = create_sop(&env, &admin, &category.id, "Approved SOP").await;
    approve(&env, &admin, &published.id).await;

    assert!(matches!(
        env.services.sops.get(&cook, &draft.id).await,
        Err(SopError::NotFound(_))
    ));
    assert!(env.services.sops.get(&cook, &published.id).await.is_ok());

    let page = env
        .services
        .sops
        .list(&cook, SopFilter::default(), PageRequest::new(None, None))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, published.id);

    // 请求 draft 状态时返回空页
    let page = env
        .services
        .sops
        .list(
            &cook,
            SopFilter {
                status: Some(SopStatus::Draft),
                ..Default::default()
            },
            PageRequest::new(None, None),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    assert!(matches!(
        create_sop_err(&env, &cook, &category.id).await,
        SopError::Forbidden(_)
    ));
}

async fn create_sop_err(env: &TestEnv, actor: &Actor, category_id: &str) -> SopError {
    env.services
        .sops
        .create(
            actor,
            CreateSopRequest {
                category_id: category_id.to_string(),
                title_en: "Nope".to_string(),
                title_th: "ไม่".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_search_and_pagination() {
    let env = setup().await;
    let admin = env.admin_actor();
    let category = kitchen_category(&env).await;
    for i in 0..5 {
        create_sop(&env, &admin, &category.id, &format!("Fryer cleaning {}", i)).await;
    }
    create_sop(&env, &admin, &category.id, "Cash counting").await;

    let page = env
        .services
        .sops
        .list(
            &admin,
            SopFilter {
                search: Some("FRYER".to_string()),
                ..Default::default()
            },
            PageRequest::new(Some(2), Some(2)),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages(), 3);

    let page = env
        .services
        .sops
        .list(
            &admin,
            SopFilter {
                category_id: Some(category.id.clone()),
                ..Default::default()
            },
            PageRequest::new(None, Some(1000)),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.page_size, 100);
}

#[tokio::test]
async fn test_category_in_use_cannot_be_deleted() {
    let env = setup().await;
    let admin = env.admin_actor();
    let category = kitchen_category(&env).await;
    let doc = create_sop(&env, &admin, &category.id, "Knife safety").await;

    let err = env
        .services
        .sops
        .delete_category(&admin, &category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SopError::Conflict(_)));

    env.services.sops.delete(&admin, &doc.id).await.unwrap();
    env.services
        .sops
        .delete_category(&admin, &category.id)
        .await
        .unwrap();
}
