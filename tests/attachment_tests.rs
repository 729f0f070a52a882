//! SOP attachments: upload limits, download, visibility and file cleanup

mod common;

use std::path::{Path, PathBuf};

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{App, test};
use serde_json::{Value, json};

use common::{ADMIN_PIN, STAFF_PIN, TestEnv, setup, setup_with};
use sop_manager::api::services::login_limiter_config;
use sop_manager::errors::SopError;
use sop_manager::services::{CategoryInput, CreateSopRequest, UploadedFile};
use sop_manager::storage::{Role, SopAttachment, SopDocument, SopStatus, SopStep};

const BOUNDARY: &str = "sop-test-boundary-7f3a";

macro_rules! init_app {
    ($env:expr) => {{
        let limiter = login_limiter_config(&$env.config.auth).expect("limiter config");
        let services = $env.services.clone();
        test::init_service(App::new().configure(move |cfg| services.configure(cfg, &limiter))).await
    }};
}

async fn create_sop(env: &TestEnv) -> SopDocument {
    let admin = env.admin_actor();
    let category = env
        .services
        .sops
        .create_category(
            &admin,
            CategoryInput {
                code: "kitchen".to_string(),
                name_en: "Kitchen".to_string(),
                name_th: "ครัว".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    env.services
        .sops
        .create(
            &admin,
            CreateSopRequest {
                category_id: category.id,
                title_en: "Fryer cleaning".to_string(),
                title_th: "ทำความสะอาดหม้อทอด".to_string(),
                content_en: "Drain the oil first".to_string(),
                content_th: "ถ่ายน้ำมันออกก่อน".to_string(),
                steps: vec![SopStep {
                    order: 1,
                    text_en: "Drain".to_string(),
                    text_th: "ถ่าย".to_string(),
                }],
                tags: vec![],
            },
        )
        .await
        .unwrap()
}

async fn approve(env: &TestEnv, sop_id: &str) {
    let admin = env.admin_actor();
    for next in [SopStatus::Review, SopStatus::Approved] {
        env.services
            .sops
            .change_status(&admin, sop_id, next)
            .await
            .unwrap();
    }
}

fn file(name: &str, content_type: &str, bytes: &[u8]) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        content_type: content_type.to_string(),
        bytes: bytes.to_vec(),
    }
}

fn stored_path(env: &TestEnv, attachment: &SopAttachment) -> PathBuf {
    Path::new(&env.config.storage.attachments_dir).join(&attachment.storage_key)
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, sop_id: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/v1/sops/{}/attachments", sop_id))
        .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

fn login_request(env: &TestEnv, email: &str, pin: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .peer_addr("127.0.0.1:40124".parse().unwrap())
        .set_json(json!({
            "restaurant_id": env.restaurant_id,
            "email": email,
            "pin": pin,
        }))
}

#[tokio::test]
async fn test_upload_read_and_delete() {
    let env = setup().await;
    let sop = create_sop(&env).await;
    let admin = env.admin_actor();
    let attachments = &env.services.attachments;

    let attachment = attachments
        .upload(
            &admin,
            &sop.id,
            file("../../etc/fryer-checklist.txt", "text/plain", b"1. drain oil"),
        )
        .await
        .unwrap();
    assert_eq!(attachment.file_name, "fryer-checklist.txt");
    assert_eq!(attachment.size_bytes, 12);
    assert!(attachment.storage_key.starts_with(&env.restaurant_id));
    let path = stored_path(&env, &attachment);
    assert!(path.exists());

    let (meta, bytes) = attachments
        .read(&admin, &sop.id, &attachment.id)
        .await
        .unwrap();
    assert_eq!(meta.content_type, "text/plain");
    assert_eq!(bytes, b"1. drain oil");
    assert_eq!(attachments.list(&admin, &sop.id).await.unwrap().len(), 1);

    attachments
        .delete(&admin, &sop.id, &attachment.id)
        .await
        .unwrap();
    assert!(!path.exists());
    assert!(attachments.list(&admin, &sop.id).await.unwrap().is_empty());
    assert!(matches!(
        attachments.read(&admin, &sop.id, &attachment.id).await,
        Err(SopError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_upload_size_and_content_rules() {
    let env = setup_with(|c| c.storage.max_attachment_bytes = 16).await;
    let sop = create_sop(&env).await;
    let admin = env.admin_actor();
    let attachments = &env.services.attachments;

    assert!(matches!(
        attachments
            .upload(&admin, &sop.id, file("big.bin", "", &[7u8; 17]))
            .await,
        Err(SopError::AttachmentTooLarge(_))
    ));
    assert!(matches!(
        attachments
            .upload(&admin, &sop.id, file("empty.txt", "text/plain", b""))
            .await,
        Err(SopError::Validation(_))
    ));
    assert!(matches!(
        attachments
            .upload(&admin, "missing-sop", file("a.txt", "text/plain", b"a"))
            .await,
        Err(SopError::NotFound(_))
    ));

    // 未声明类型时按二进制保存
    let exact = attachments
        .upload(&admin, &sop.id, file("exact.bin", "", &[1u8; 16]))
        .await
        .unwrap();
    assert_eq!(exact.content_type, "application/octet-stream");
}

#[tokio::test]
async fn test_staff_visibility_follows_sop_status() {
    let env = setup().await;
    let sop = create_sop(&env).await;
    let admin = env.admin_actor();
    let cook = env.add_staff("cook@baan.example", Role::Staff).await;
    let cook = env.actor_for(&cook);
    let attachments = &env.services.attachments;

    let attachment = attachments
        .upload(&admin, &sop.id, file("photo.jpg", "image/jpeg", b"\xff\xd8\xff"))
        .await
        .unwrap();

    assert!(matches!(
        attachments
            .upload(&cook, &sop.id, file("mine.jpg", "image/jpeg", b"x"))
            .await,
        Err(SopError::Forbidden(_))
    ));
    // 草稿 SOP 对员工不可见
    assert!(matches!(
        attachments.list(&cook, &sop.id).await,
        Err(SopError::NotFound(_))
    ));
    assert!(matches!(
        attachments.read(&cook, &sop.id, &attachment.id).await,
        Err(SopError::NotFound(_))
    ));

    approve(&env, &sop.id).await;
    let (_, bytes) = attachments
        .read(&cook, &sop.id, &attachment.id)
        .await
        .unwrap();
    assert_eq!(bytes, b"\xff\xd8\xff");
    assert!(matches!(
        attachments.delete(&cook, &sop.id, &attachment.id).await,
        Err(SopError::Forbidden(_))
    ));

    let other = env.second_restaurant().await;
    assert!(matches!(
        attachments.read(&other, &sop.id, &attachment.id).await,
        Err(SopError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_deleting_sop_removes_attachment_files() {
    let env = setup().await;
    let sop = create_sop(&env).await;
    let admin = env.admin_actor();

    let mut paths = Vec::new();
    for name in ["a.txt", "b.txt"] {
        let attachment = env
            .services
            .attachments
            .upload(&admin, &sop.id, file(name, "text/plain", name.as_bytes()))
            .await
            .unwrap();
        paths.push(stored_path(&env, &attachment));
    }
    assert!(paths.iter().all(|p| p.exists()));

    env.services.sops.delete(&admin, &sop.id).await.unwrap();
    assert!(paths.iter().all(|p| !p.exists()));
}

#[actix_web::test]
async fn test_attachment_roundtrip_over_http() {
    let env = setup().await;
    let sop = create_sop(&env).await;
    let app = init_app!(env);

    let body: Value =
        test::call_and_read_body_json(&app, login_request(&env, "owner@baan.example", ADMIN_PIN).to_request()).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let req = upload_request(
        &token,
        &sop.id,
        multipart_body("file", "temps.csv", "text/csv", b"time,temp\n09:00,175\n"),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["data"]["file_name"], "temps.csv");
    assert_eq!(created["data"]["size_bytes"], 20);
    assert!(created["data"].get("storage_key").is_none());
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sops/{}/attachments/{}", sop.id, id))
        .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
        "text/csv"
    );
    let disposition = resp
        .headers()
        .get(CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("temps.csv"));
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"time,temp\n09:00,175\n");

    // 缺少 file 字段
    let req = upload_request(
        &token,
        &sop.id,
        multipart_body("photo", "temps.csv", "text/csv", b"x"),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1020);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/sops/{}/attachments/{}", sop.id, id))
        .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sops/{}/attachments/{}", sop.id, id))
        .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_oversized_upload_is_rejected_over_http() {
    let env = setup_with(|c| c.storage.max_attachment_bytes = 32).await;
    let sop = create_sop(&env).await;
    let app = init_app!(env);

    let body: Value =
        test::call_and_read_body_json(&app, login_request(&env, "owner@baan.example", ADMIN_PIN).to_request()).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let req = upload_request(
        &token,
        &sop.id,
        multipart_body("file", "video.mp4", "video/mp4", &[0u8; 64]),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3001);

    let dir = Path::new(&env.config.storage.attachments_dir).join(&env.restaurant_id);
    assert!(!dir.exists() || std::fs::read_dir(&dir).unwrap().next().is_none());
}

#[actix_web::test]
async fn test_staff_upload_is_forbidden_over_http() {
    let env = setup().await;
    let sop = create_sop(&env).await;
    env.add_staff("cook@baan.example", Role::Staff).await;
    let app = init_app!(env);

    let body: Value =
        test::call_and_read_body_json(&app, login_request(&env, "cook@baan.example", STAFF_PIN).to_request()).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let req = upload_request(
        &token,
        &sop.id,
        multipart_body("file", "note.txt", "text/plain", b"hello"),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2006);
}
