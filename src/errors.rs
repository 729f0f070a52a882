use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum SopError {
    Validation(String),
    Unauthorized(String),
    InvalidCredentials(String),
    SessionExpired(String),
    AccountLocked(String),
    RateLimited(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    SopTransition(String),
    AssessmentMismatch(String),
    TranslationTransition(String),
    AttachmentTooLarge(String),
    InvalidMultipart(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    PasswordHash(String),
    Token(String),
    DateParse(String),
}

impl SopError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SopError::Validation(_) => "E001",
            SopError::Unauthorized(_) => "E002",
            SopError::InvalidCredentials(_) => "E003",
            SopError::SessionExpired(_) => "E004",
            SopError::AccountLocked(_) => "E005",
            SopError::RateLimited(_) => "E006",
            SopError::Forbidden(_) => "E007",
            SopError::NotFound(_) => "E008",
            SopError::Conflict(_) => "E009",
            SopError::SopTransition(_) => "E010",
            SopError::AssessmentMismatch(_) => "E011",
            SopError::TranslationTransition(_) => "E012",
            SopError::AttachmentTooLarge(_) => "E013",
            SopError::DatabaseConfig(_) => "E014",
            SopError::DatabaseConnection(_) => "E015",
            SopError::DatabaseOperation(_) => "E016",
            SopError::FileOperation(_) => "E017",
            SopError::Serialization(_) => "E018",
            SopError::PasswordHash(_) => "E019",
            SopError::Token(_) => "E020",
            SopError::DateParse(_) => "E021",
            SopError::InvalidMultipart(_) => "E022",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SopError::Validation(_) => "Validation Error",
            SopError::Unauthorized(_) => "Unauthorized",
            SopError::InvalidCredentials(_) => "Invalid Credentials",
            SopError::SessionExpired(_) => "Session Expired",
            SopError::AccountLocked(_) => "Account Locked",
            SopError::RateLimited(_) => "Rate Limited",
            SopError::Forbidden(_) => "Forbidden",
            SopError::NotFound(_) => "Resource Not Found",
            SopError::Conflict(_) => "Conflict",
            SopError::SopTransition(_) => "Invalid SOP Status Transition",
            SopError::AssessmentMismatch(_) => "Assessment Answer Mismatch",
            SopError::TranslationTransition(_) => "Invalid Translation Status Transition",
            SopError::AttachmentTooLarge(_) => "Attachment Too Large",
            SopError::InvalidMultipart(_) => "Invalid Multipart Data",
            SopError::DatabaseConfig(_) => "Database Configuration Error",
            SopError::DatabaseConnection(_) => "Database Connection Error",
            SopError::DatabaseOperation(_) => "Database Operation Error",
            SopError::FileOperation(_) => "File Operation Error",
            SopError::Serialization(_) => "Serialization Error",
            SopError::PasswordHash(_) => "PIN Hash Error",
            SopError::Token(_) => "Token Error",
            SopError::DateParse(_) => "Date Parse Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SopError::Validation(msg)
            | SopError::Unauthorized(msg)
            | SopError::InvalidCredentials(msg)
            | SopError::SessionExpired(msg)
            | SopError::AccountLocked(msg)
            | SopError::RateLimited(msg)
            | SopError::Forbidden(msg)
            | SopError::NotFound(msg)
            | SopError::Conflict(msg)
            | SopError::SopTransition(msg)
            | SopError::AssessmentMismatch(msg)
            | SopError::TranslationTransition(msg)
            | SopError::AttachmentTooLarge(msg)
            | SopError::InvalidMultipart(msg)
            | SopError::DatabaseConfig(msg)
            | SopError::DatabaseConnection(msg)
            | SopError::DatabaseOperation(msg)
            | SopError::FileOperation(msg)
            | SopError::Serialization(msg)
            | SopError::PasswordHash(msg)
            | SopError::Token(msg)
            | SopError::DateParse(msg) => msg,
        }
    }

    /// 平板上展示给员工的泰文提示
    ///
    /// 内部错误统一为一条通用提示，不向界面暴露存储细节。
    pub fn message_th(&self) -> &'static str {
        match self {
            SopError::Validation(_) => "ข้อมูลไม่ถูกต้อง",
            SopError::Unauthorized(_) => "กรุณาเข้าสู่ระบบ",
            SopError::InvalidCredentials(_) => "อีเมลหรือรหัส PIN ไม่ถูกต้อง",
            SopError::SessionExpired(_) => "เซสชันหมดอายุ กรุณาเข้าสู่ระบบใหม่",
            SopError::AccountLocked(_) => "บัญชีถูกล็อกชั่วคราว กรุณาลองใหม่ภายหลัง",
            SopError::RateLimited(_) => "มีการร้องขอมากเกินไป กรุณารอสักครู่",
            SopError::Forbidden(_) => "คุณไม่มีสิทธิ์ดำเนินการนี้",
            SopError::NotFound(_) => "ไม่พบข้อมูลที่ต้องการ",
            SopError::Conflict(_) => "ข้อมูลซ้ำหรือขัดแย้งกับข้อมูลที่มีอยู่",
            SopError::SopTransition(_) => "ไม่สามารถเปลี่ยนสถานะเอกสาร SOP ได้",
            SopError::AssessmentMismatch(_) => "จำนวนคำตอบไม่ตรงกับจำนวนคำถาม",
            SopError::TranslationTransition(_) => "ไม่สามารถเปลี่ยนสถานะคำแปลได้",
            SopError::AttachmentTooLarge(_) => "ไฟล์แนบมีขนาดใหญ่เกินไป",
            SopError::InvalidMultipart(_) => "ข้อมูลไฟล์ที่อัปโหลดไม่ถูกต้อง",
            SopError::DatabaseConfig(_)
            | SopError::DatabaseConnection(_)
            | SopError::DatabaseOperation(_)
            | SopError::FileOperation(_)
            | SopError::Serialization(_)
            | SopError::PasswordHash(_)
            | SopError::Token(_)
            | SopError::DateParse(_) => "เกิดข้อผิดพลาดในระบบ กรุณาลองใหม่อีกครั้ง",
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            SopError::Validation(_)
            | SopError::SopTransition(_)
            | SopError::AssessmentMismatch(_)
            | SopError::TranslationTransition(_)
            | SopError::DateParse(_) => StatusCode::BAD_REQUEST,
            SopError::Unauthorized(_)
            | SopError::InvalidCredentials(_)
            | SopError::SessionExpired(_)
            | SopError::Token(_) => StatusCode::UNAUTHORIZED,
            SopError::AccountLocked(_) => StatusCode::LOCKED,
            SopError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            SopError::Forbidden(_) => StatusCode::FORBIDDEN,
            SopError::NotFound(_) => StatusCode::NOT_FOUND,
            SopError::Conflict(_) => StatusCode::CONFLICT,
            SopError::AttachmentTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            SopError::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            SopError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            SopError::DatabaseConfig(_)
            | SopError::DatabaseOperation(_)
            | SopError::FileOperation(_)
            | SopError::Serialization(_)
            | SopError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为内部错误（不应把细节返回给客户端）
    pub fn is_internal(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SopError {}

// 便捷的构造函数
impl SopError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SopError::Validation(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        SopError::Unauthorized(msg.into())
    }

    pub fn invalid_credentials<T: Into<String>>(msg: T) -> Self {
        SopError::InvalidCredentials(msg.into())
    }

    pub fn session_expired<T: Into<String>>(msg: T) -> Self {
        SopError::SessionExpired(msg.into())
    }

    pub fn account_locked<T: Into<String>>(msg: T) -> Self {
        SopError::AccountLocked(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        SopError::RateLimited(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        SopError::Forbidden(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SopError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        SopError::Conflict(msg.into())
    }

    pub fn sop_transition<T: Into<String>>(msg: T) -> Self {
        SopError::SopTransition(msg.into())
    }

    pub fn assessment_mismatch<T: Into<String>>(msg: T) -> Self {
        SopError::AssessmentMismatch(msg.into())
    }

    pub fn translation_transition<T: Into<String>>(msg: T) -> Self {
        SopError::TranslationTransition(msg.into())
    }

    pub fn attachment_too_large<T: Into<String>>(msg: T) -> Self {
        SopError::AttachmentTooLarge(msg.into())
    }

    pub fn invalid_multipart<T: Into<String>>(msg: T) -> Self {
        SopError::InvalidMultipart(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SopError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        SopError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        SopError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        SopError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SopError::Serialization(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        SopError::PasswordHash(msg.into())
    }

    pub fn token<T: Into<String>>(msg: T) -> Self {
        SopError::Token(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        SopError::DateParse(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for SopError {
    fn from(err: sea_orm::DbErr) -> Self {
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
            return SopError::Conflict(msg);
        }
        match err {
            sea_orm::DbErr::RecordNotFound(msg) => SopError::NotFound(msg),
            sea_orm::DbErr::ConnectionAcquire(e) => SopError::DatabaseConnection(e.to_string()),
            other => SopError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for SopError {
    fn from(err: std::io::Error) -> Self {
        SopError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SopError {
    fn from(err: serde_json::Error) -> Self {
        SopError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for SopError {
    fn from(err: chrono::ParseError) -> Self {
        SopError::DateParse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for SopError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                SopError::SessionExpired("Session has expired".to_string())
            }
            _ => SopError::Token(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SopError>;
