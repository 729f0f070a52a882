use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AuthConfig;
use crate::errors::{Result, SopError};
use crate::storage::{Role, Staff};

/// 会话 Token Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// staff id
    pub sub: String,
    pub restaurant_id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// 已签发的会话
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 会话签发与校验
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_hours: i64,
}

impl JwtService {
    pub fn new(secret: &str, session_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_hours: session_hours as i64,
        }
    }

    /// secret 为空时生成随机值（重启后所有会话失效）
    pub fn from_config(auth: &AuthConfig) -> Self {
        let secret = if auth.jwt_secret.is_empty() {
            warn!("auth.jwt_secret is not configured, generating a random secret");
            (0..4)
                .map(|_| format!("{:016x}", rand::random::<u64>()))
                .collect::<String>()
        } else {
            auth.jwt_secret.clone()
        };
        Self::new(&secret, auth.session_hours)
    }

    pub fn issue(&self, staff: &Staff) -> Result<IssuedSession> {
        self.issue_at(staff, Utc::now())
    }

    pub fn issue_at(&self, staff: &Staff, now: DateTime<Utc>) -> Result<IssuedSession> {
        let expires_at = now + Duration::hours(self.session_hours);
        let claims = SessionClaims {
            sub: staff.id.clone(),
            restaurant_id: staff.restaurant_id.clone(),
            role: staff.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedSession { token, expires_at })
    }

    /// 过期 -> SessionExpired，签名错误或格式错误 -> Token
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

impl SessionClaims {
    pub fn expires_at(&self) -> Result<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .ok_or_else(|| SopError::token("Invalid exp claim"))
    }
}
