//! 请求 / 响应类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::{
    CategoryInput, CreateSopRequest, CreateStaffRequest, KeyInput, ModuleInput,
    UpdateSopRequest, UpdateStaffRequest,
};
use crate::storage::{
    Role, SopStatus, SopStep, Staff, TrainingQuestion, TranslationStatus,
};

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    /// 仅错误响应携带泰语提示
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_th: Option<String>,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

// ============ Auth ============

#[derive(Deserialize, Clone, Debug)]
pub struct LoginBody {
    pub restaurant_id: String,
    pub email: String,
    pub pin: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct SessionResponse {
    pub staff: Staff,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ============ Staff ============

#[derive(Deserialize, Clone, Debug)]
pub struct CreateStaffBody {
    pub email: String,
    pub full_name: String,
    pub full_name_th: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    pub pin: String,
}

fn default_role() -> Role {
    Role::Staff
}

impl From<CreateStaffBody> for CreateStaffRequest {
    fn from(body: CreateStaffBody) -> Self {
        Self {
            email: body.email,
            full_name: body.full_name,
            full_name_th: body.full_name_th,
            role: body.role,
            pin: body.pin,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UpdateStaffBody {
    pub full_name: Option<String>,
    pub full_name_th: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl From<UpdateStaffBody> for UpdateStaffRequest {
    fn from(body: UpdateStaffBody) -> Self {
        Self {
            full_name: body.full_name,
            full_name_th: body.full_name_th,
            role: body.role,
            is_active: body.is_active,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ResetPinBody {
    pub pin: String,
}

// ============ Categories & SOPs ============

#[derive(Deserialize, Clone, Debug)]
pub struct CategoryBody {
    pub code: String,
    pub name_en: String,
    pub name_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<CategoryBody> for CategoryInput {
    fn from(body: CategoryBody) -> Self {
        Self {
            code: body.code,
            name_en: body.name_en,
            name_th: body.name_th,
            description_en: body.description_en,
            description_th: body.description_th,
            sort_order: body.sort_order,
            is_active: body.is_active,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct CreateSopBody {
    pub category_id: String,
    pub title_en: String,
    pub title_th: String,
    #[serde(default)]
    pub content_en: String,
    #[serde(default)]
    pub content_th: String,
    #[serde(default)]
    pub steps: Vec<SopStep>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreateSopBody> for CreateSopRequest {
    fn from(body: CreateSopBody) -> Self {
        Self {
            category_id: body.category_id,
            title_en: body.title_en,
            title_th: body.title_th,
            content_en: body.content_en,
            content_th: body.content_th,
            steps: body.steps,
            tags: body.tags,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UpdateSopBody {
    pub category_id: Option<String>,
    pub title_en: Option<String>,
    pub title_th: Option<String>,
    pub content_en: Option<String>,
    pub content_th: Option<String>,
    pub steps: Option<Vec<SopStep>>,
    pub tags: Option<Vec<String>>,
}

impl From<UpdateSopBody> for UpdateSopRequest {
    fn from(body: UpdateSopBody) -> Self {
        Self {
            category_id: body.category_id,
            title_en: body.title_en,
            title_th: body.title_th,
            content_en: body.content_en,
            content_th: body.content_th,
            steps: body.steps,
            tags: body.tags,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SopStatusBody {
    pub status: SopStatus,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SopListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub category_id: Option<String>,
    pub status: Option<SopStatus>,
    pub search: Option<String>,
}

// ============ Training ============

#[derive(Deserialize, Clone, Debug)]
pub struct ModuleBody {
    pub sop_id: Option<String>,
    pub title_en: String,
    pub title_th: String,
    pub description_en: Option<String>,
    pub description_th: Option<String>,
    pub questions: Vec<TrainingQuestion>,
    pub passing_score: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub certificate_valid_days: Option<u32>,
    pub is_active: Option<bool>,
}

impl From<ModuleBody> for ModuleInput {
    fn from(body: ModuleBody) -> Self {
        Self {
            sop_id: body.sop_id,
            title_en: body.title_en,
            title_th: body.title_th,
            description_en: body.description_en,
            description_th: body.description_th,
            questions: body.questions,
            passing_score: body.passing_score,
            duration_minutes: body.duration_minutes,
            certificate_valid_days: body.certificate_valid_days,
            is_active: body.is_active,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ProgressBody {
    pub progress_percent: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SubmitBody {
    pub answers: Vec<usize>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ProgressQuery {
    pub staff_id: Option<String>,
    pub module_id: Option<String>,
    /// true 时只看自己的记录
    #[serde(default)]
    pub mine: bool,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct CertificateQuery {
    pub staff_id: Option<String>,
    #[serde(default)]
    pub mine: bool,
}

// ============ Translations ============

#[derive(Deserialize, Clone, Debug)]
pub struct KeyBody {
    pub key: String,
    pub category: String,
    pub description: Option<String>,
}

impl From<KeyBody> for KeyInput {
    fn from(body: KeyBody) -> Self {
        KeyInput {
            key: body.key,
            category: body.category,
            description: body.description,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UpdateKeyBody {
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct KeyListQuery {
    pub category: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TranslationValueBody {
    pub value: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TranslationStatusBody {
    pub status: TranslationStatus,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct BundleQuery {
    #[serde(default)]
    pub fallback: bool,
}

// ============ Audit ============

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AuditQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub action: Option<String>,
    pub staff_id: Option<String>,
    /// RFC3339
    pub from: Option<String>,
    pub to: Option<String>,
}
