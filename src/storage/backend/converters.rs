//! Entity Model <-> 领域模型转换
//!
//! 枚举列以 snake_case 字符串存储，JSON 列以 TEXT 存储。
//! 读出时解析失败视为数据损坏，返回 Serialization 错误。

use std::str::FromStr;

use crate::errors::{Result, SopError};
use crate::storage::models::{
    AuditEntry, Restaurant, SopAttachment, SopCategory, SopDocument, Staff, TrainingCertificate,
    TrainingModule, TrainingProgress, Translation, TranslationHistoryEntry, TranslationKey,
};
use migration::entities::{
    audit_log, restaurant, sop_attachment, sop_category, sop_document, staff,
    training_certificate, training_module, training_progress, translation, translation_history,
    translation_key,
};

fn parse_enum<T: FromStr>(column: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| SopError::serialization(format!("Unknown {} value in database: {}", column, raw)))
}

fn non_negative(v: i32) -> u32 {
    v.max(0) as u32
}

pub fn model_to_restaurant(model: restaurant::Model) -> Restaurant {
    Restaurant {
        id: model.id,
        name: model.name,
        name_th: model.name_th,
        timezone: model.timezone,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

pub fn model_to_staff(model: staff::Model) -> Result<Staff> {
    Ok(Staff {
        role: parse_enum("staff.role", &model.role)?,
        id: model.id,
        restaurant_id: model.restaurant_id,
        email: model.email,
        full_name: model.full_name,
        full_name_th: model.full_name_th,
        pin_hash: model.pin_hash,
        failed_pin_attempts: non_negative(model.failed_pin_attempts),
        locked_until: model.locked_until,
        last_login_at: model.last_login_at,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn model_to_category(model: sop_category::Model) -> SopCategory {
    SopCategory {
        id: model.id,
        restaurant_id: model.restaurant_id,
        code: model.code,
        name_en: model.name_en,
        name_th: model.name_th,
        description_en: model.description_en,
        description_th: model.description_th,
        sort_order: model.sort_order,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

pub fn model_to_sop(model: sop_document::Model) -> Result<SopDocument> {
    Ok(SopDocument {
        steps: serde_json::from_str(&model.steps)?,
        tags: serde_json::from_str(&model.tags)?,
        status: parse_enum("sop_documents.status", &model.status)?,
        id: model.id,
        restaurant_id: model.restaurant_id,
        category_id: model.category_id,
        title_en: model.title_en,
        title_th: model.title_th,
        content_en: model.content_en,
        content_th: model.content_th,
        version: model.version,
        created_by: model.created_by,
        updated_by: model.updated_by,
        approved_by: model.approved_by,
        approved_at: model.approved_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn model_to_attachment(model: sop_attachment::Model) -> SopAttachment {
    SopAttachment {
        id: model.id,
        restaurant_id: model.restaurant_id,
        sop_id: model.sop_id,
        file_name: model.file_name,
        content_type: model.content_type,
        size_bytes: model.size_bytes.max(0) as u64,
        storage_key: model.storage_key,
        uploaded_by: model.uploaded_by,
        created_at: model.created_at,
    }
}

pub fn model_to_training_module(model: training_module::Model) -> Result<TrainingModule> {
    Ok(TrainingModule {
        questions: serde_json::from_str(&model.questions)?,
        id: model.id,
        restaurant_id: model.restaurant_id,
        sop_id: model.sop_id,
        title_en: model.title_en,
        title_th: model.title_th,
        description_en: model.description_en,
        description_th: model.description_th,
        passing_score: non_negative(model.passing_score),
        duration_minutes: non_negative(model.duration_minutes),
        certificate_valid_days: non_negative(model.certificate_valid_days),
        is_active: model.is_active,
        created_by: model.created_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn model_to_progress(model: training_progress::Model) -> Result<TrainingProgress> {
    Ok(TrainingProgress {
        status: parse_enum("training_progress.status", &model.status)?,
        id: model.id,
        restaurant_id: model.restaurant_id,
        module_id: model.module_id,
        staff_id: model.staff_id,
        progress_percent: non_negative(model.progress_percent),
        attempts: non_negative(model.attempts),
        best_score: model.best_score.map(non_negative),
        started_at: model.started_at,
        completed_at: model.completed_at,
        updated_at: model.updated_at,
    })
}

pub fn model_to_certificate(model: training_certificate::Model) -> Result<TrainingCertificate> {
    Ok(TrainingCertificate {
        status: parse_enum("training_certificates.status", &model.status)?,
        id: model.id,
        restaurant_id: model.restaurant_id,
        module_id: model.module_id,
        staff_id: model.staff_id,
        certificate_number: model.certificate_number,
        score: non_negative(model.score),
        issued_at: model.issued_at,
        expires_at: model.expires_at,
    })
}

pub fn model_to_translation_key(model: translation_key::Model) -> TranslationKey {
    TranslationKey {
        id: model.id,
        restaurant_id: model.restaurant_id,
        key: model.key_name,
        category: model.category,
        description: model.description,
        created_at: model.created_at,
    }
}

pub fn model_to_translation(model: translation::Model) -> Result<Translation> {
    Ok(Translation {
        locale: parse_enum("translations.locale", &model.locale)?,
        status: parse_enum("translations.status", &model.status)?,
        id: model.id,
        restaurant_id: model.restaurant_id,
        key_id: model.key_id,
        value: model.value,
        version: model.version,
        updated_by: model.updated_by,
        updated_at: model.updated_at,
    })
}

pub fn model_to_history(model: translation_history::Model) -> Result<TranslationHistoryEntry> {
    Ok(TranslationHistoryEntry {
        status: parse_enum("translation_history.status", &model.status)?,
        translation_id: model.translation_id,
        version: model.version,
        value: model.value,
        changed_by: model.changed_by,
        changed_at: model.changed_at,
    })
}

pub fn model_to_audit(model: audit_log::Model) -> AuditEntry {
    // 元数据损坏不影响审计记录本身的读取
    let metadata = model
        .metadata
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok());
    AuditEntry {
        id: model.id,
        restaurant_id: model.restaurant_id,
        staff_id: model.staff_id,
        action: model.action,
        resource_type: model.resource_type,
        resource_id: model.resource_id,
        metadata,
        ip_address: model.ip_address,
        created_at: model.created_at,
    }
}

/// 把多个模型批量转换，遇到第一个错误即返回
pub fn collect_models<M, T>(models: Vec<M>, f: impl Fn(M) -> Result<T>) -> Result<Vec<T>> {
    models.into_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{Role, SopStatus};
    use chrono::Utc;

    fn sop_model(status: &str, steps: &str) -> sop_document::Model {
        let now = Utc::now();
        sop_document::Model {
            id: "doc-1".into(),
            restaurant_id: "rest-1".into(),
            category_id: "cat-1".into(),
            title_en: "Hand washing".into(),
            title_th: "การล้างมือ".into(),
            content_en: "Wash hands".into(),
            content_th: "ล้างมือ".into(),
            steps: steps.into(),
            tags: r#"["hygiene"]"#.into(),
            status: status.into(),
            version: 3,
            created_by: None,
            updated_by: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_to_sop_parses_json_columns() {
        let doc = model_to_sop(sop_model(
            "approved",
            r#"[{"order":1,"text_en":"Wet","text_th":"ทำให้เปียก"}]"#,
        ))
        .unwrap();
        assert_eq!(doc.status, SopStatus::Approved);
        assert_eq!(doc.steps.len(), 1);
        assert_eq!(doc.steps[0].text_th, "ทำให้เปียก");
        assert_eq!(doc.tags, vec!["hygiene".to_string()]);
    }

    #[test]
    fn test_unknown_status_is_serialization_error() {
        let err = model_to_sop(sop_model("published", "[]")).unwrap_err();
        assert!(matches!(err, SopError::Serialization(_)));
    }

    #[test]
    fn test_model_to_staff_clamps_negative_counter() {
        let now = Utc::now();
        let staff = model_to_staff(staff::Model {
            id: "s".into(),
            restaurant_id: "r".into(),
            email: "a@b.c".into(),
            full_name: "A".into(),
            full_name_th: None,
            role: "manager".into(),
            pin_hash: "h".into(),
            failed_pin_attempts: -2,
            locked_until: None,
            last_login_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
        assert_eq!(staff.role, Role::Manager);
        assert_eq!(staff.failed_pin_attempts, 0);
    }

    #[test]
    fn test_audit_tolerates_bad_metadata() {
        let entry = model_to_audit(audit_log::Model {
            id: 1,
            restaurant_id: "r".into(),
            staff_id: None,
            action: "login".into(),
            resource_type: "staff".into(),
            resource_id: None,
            metadata: Some("{not json".into()),
            ip_address: None,
            created_at: Utc::now(),
        });
        assert!(entry.metadata.is_none());
    }
}
