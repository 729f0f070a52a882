//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::SopError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证与权限
/// - 3000-3099: SOP 文档与附件
/// - 4000-4099: 培训
/// - 5000-5099: 翻译
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    ValidationFailed = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    DatabaseError = 1006,
    Conflict = 1009,
    InvalidDateFormat = 1012,
    InvalidMultipartData = 1020,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    Unauthorized = 2000,
    InvalidCredentials = 2001,
    SessionExpired = 2002,
    TokenInvalid = 2003,
    RateLimitExceeded = 2004,
    AccountLocked = 2005,
    Forbidden = 2006,

    // SOP 3000-3099
    SopInvalidTransition = 3000,
    AttachmentTooLarge = 3001,

    // 培训 4000-4099
    AssessmentMismatch = 4000,

    // 翻译 5000-5099
    TranslationInvalidTransition = 5000,
}

impl From<&SopError> for ErrorCode {
    fn from(err: &SopError) -> Self {
        match err {
            SopError::Validation(_) => ErrorCode::ValidationFailed,
            SopError::Unauthorized(_) => ErrorCode::Unauthorized,
            SopError::InvalidCredentials(_) => ErrorCode::InvalidCredentials,
            SopError::SessionExpired(_) => ErrorCode::SessionExpired,
            SopError::Token(_) => ErrorCode::TokenInvalid,
            SopError::AccountLocked(_) => ErrorCode::AccountLocked,
            SopError::RateLimited(_) => ErrorCode::RateLimitExceeded,
            SopError::Forbidden(_) => ErrorCode::Forbidden,
            SopError::NotFound(_) => ErrorCode::NotFound,
            SopError::Conflict(_) => ErrorCode::Conflict,
            SopError::SopTransition(_) => ErrorCode::SopInvalidTransition,
            SopError::AttachmentTooLarge(_) => ErrorCode::AttachmentTooLarge,
            SopError::InvalidMultipart(_) => ErrorCode::InvalidMultipartData,
            SopError::AssessmentMismatch(_) => ErrorCode::AssessmentMismatch,
            SopError::TranslationTransition(_) => ErrorCode::TranslationInvalidTransition,
            SopError::DateParse(_) => ErrorCode::InvalidDateFormat,
            SopError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            SopError::DatabaseConfig(_) | SopError::DatabaseOperation(_) => {
                ErrorCode::DatabaseError
            }
            SopError::FileOperation(_)
            | SopError::Serialization(_)
            | SopError::PasswordHash(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::AccountLocked).unwrap(),
            "2005"
        );
        let code: ErrorCode = serde_json::from_str("3000").unwrap();
        assert_eq!(code, ErrorCode::SopInvalidTransition);
    }

    #[test]
    fn test_domain_errors_land_in_their_block() {
        let cases = [
            (SopError::sop_transition("x"), 3000..3100),
            (SopError::assessment_mismatch("x"), 4000..4100),
            (SopError::translation_transition("x"), 5000..5100),
            (SopError::account_locked("x"), 2000..2100),
            (SopError::validation("x"), 1000..1100),
        ];
        for (err, range) in cases {
            let code = ErrorCode::from(&err) as i32;
            assert!(range.contains(&code), "{:?} -> {}", err, code);
        }
    }
}
