use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 员工角色，按权限排序：`Staff < Manager < Admin`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Staff,
    Manager,
    Admin,
}

impl Role {
    pub fn at_least(self, required: Role) -> bool {
        self >= required
    }
}

/// 内容语言；双语字段均为英文 + 泰文
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Locale {
    En,
    Th,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SopStatus {
    Draft,
    Review,
    Approved,
    Archived,
}

impl SopStatus {
    /// draft→review→approved→archived, review→draft (reject), archived→draft (restore)
    pub fn can_transition_to(self, next: SopStatus) -> bool {
        use SopStatus::*;
        matches!(
            (self, next),
            (Draft, Review) | (Review, Approved) | (Review, Draft) | (Approved, Archived) | (Archived, Draft)
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CertificateStatus {
    Active,
    Revoked,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TranslationStatus {
    Draft,
    Review,
    Approved,
    Published,
}

impl TranslationStatus {
    /// draft→review→approved→published, review→draft (reject)
    pub fn can_transition_to(self, next: TranslationStatus) -> bool {
        use TranslationStatus::*;
        matches!(
            (self, next),
            (Draft, Review) | (Review, Approved) | (Review, Draft) | (Approved, Published)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub name_th: Option<String>,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub restaurant_id: String,
    pub email: String,
    pub full_name: String,
    pub full_name_th: Option<String>,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub pin_hash: String,
    pub failed_pin_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SopCategory {
    pub id: String,
    pub restaurant_id: String,
    pub code: String,
    pub name_en: String,
    pub name_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SopStep {
    pub order: u32,
    pub text_en: String,
    pub text_th: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SopDocument {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub title_en: String,
    pub title_th: String,
    pub content_en: String,
    pub content_th: String,
    pub steps: Vec<SopStep>,
    pub tags: Vec<String>,
    pub status: SopStatus,
    pub version: i32,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SopAttachment {
    pub id: String,
    pub restaurant_id: String,
    pub sop_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(skip_serializing, default)]
    pub storage_key: String,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text_en: String,
    pub text_th: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingQuestion {
    pub prompt_en: String,
    pub prompt_th: String,
    pub options: Vec<QuestionOption>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingModule {
    pub id: String,
    pub restaurant_id: String,
    pub sop_id: Option<String>,
    pub title_en: String,
    pub title_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub questions: Vec<TrainingQuestion>,
    pub passing_score: u32,
    pub duration_minutes: u32,
    pub certificate_valid_days: u32,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgress {
    pub id: String,
    pub restaurant_id: String,
    pub module_id: String,
    pub staff_id: String,
    pub status: ProgressStatus,
    pub progress_percent: u32,
    pub attempts: u32,
    pub best_score: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingCertificate {
    pub id: String,
    pub restaurant_id: String,
    pub module_id: String,
    pub staff_id: String,
    pub certificate_number: String,
    pub score: u32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: CertificateStatus,
}

impl TrainingCertificate {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.status == CertificateStatus::Active && self.expires_at > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationKey {
    pub id: String,
    pub restaurant_id: String,
    pub key: String,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub id: String,
    pub restaurant_id: String,
    pub key_id: String,
    pub locale: Locale,
    pub value: String,
    pub status: TranslationStatus,
    pub version: i32,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationHistoryEntry {
    pub translation_id: String,
    pub version: i32,
    pub value: String,
    pub status: TranslationStatus,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub restaurant_id: String,
    pub staff_id: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// SOP 列表过滤条件
#[derive(Default, Clone, Debug)]
pub struct SopFilter {
    pub category_id: Option<String>,
    pub status: Option<SopStatus>,
    /// 模糊搜索中英文标题与正文（不区分大小写）
    pub search: Option<String>,
}

/// 审计日志过滤条件
#[derive(Default, Clone, Debug)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub staff_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageInfo {
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.at_least(Role::Manager));
        assert!(Role::Manager.at_least(Role::Manager));
        assert!(!Role::Staff.at_least(Role::Manager));
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(Role::Admin.as_ref(), "admin");
    }

    #[test]
    fn test_sop_transitions() {
        use SopStatus::*;
        assert!(Draft.can_transition_to(Review));
        assert!(Review.can_transition_to(Approved));
        assert!(Review.can_transition_to(Draft));
        assert!(Approved.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Draft));
    }

    #[test]
    fn test_translation_transitions() {
        use TranslationStatus::*;
        assert!(Draft.can_transition_to(Review));
        assert!(Approved.can_transition_to(Published));
        assert!(!Draft.can_transition_to(Published));
        assert!(!Published.can_transition_to(Draft));
    }

    #[test]
    fn test_progress_status_storage_names() {
        assert_eq!(ProgressStatus::NotStarted.as_ref(), "not_started");
        assert_eq!(
            "in_progress".parse::<ProgressStatus>().unwrap(),
            ProgressStatus::InProgress
        );
    }

    #[test]
    fn test_staff_lock_state() {
        let now = Utc::now();
        let mut staff = Staff {
            id: "s".into(),
            restaurant_id: "r".into(),
            email: "a@b.c".into(),
            full_name: "A".into(),
            full_name_th: None,
            role: Role::Staff,
            pin_hash: String::new(),
            failed_pin_attempts: 0,
            locked_until: None,
            last_login_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(!staff.is_locked(now));
        staff.locked_until = Some(now + chrono::Duration::minutes(5));
        assert!(staff.is_locked(now));
        staff.locked_until = Some(now - chrono::Duration::minutes(5));
        assert!(!staff.is_locked(now));
    }
}
