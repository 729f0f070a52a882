//! 员工 PIN 校验与哈希
//!
//! PIN 为 4 位 ASCII 数字，使用 Argon2id 哈希存储。

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::{Result, SopError};

pub const PIN_LENGTH: usize = 4;

/// 登录时的格式校验：恰好 4 位数字
pub fn validate_pin_format(pin: &str) -> Result<()> {
    if pin.len() != PIN_LENGTH || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SopError::validation("PIN must be exactly 4 digits"));
    }
    Ok(())
}

/// 设置新 PIN 时额外拒绝弱 PIN（0000、全相同数字、1234）
pub fn validate_new_pin(pin: &str) -> Result<()> {
    validate_pin_format(pin)?;
    let bytes = pin.as_bytes();
    if bytes.iter().all(|b| *b == bytes[0]) || pin == "1234" {
        return Err(SopError::validation("PIN is too easy to guess"));
    }
    Ok(())
}

pub fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SopError::password_hash(e.to_string()))
}

/// 哈希格式损坏返回错误，PIN 不匹配返回 `Ok(false)`
pub fn verify_pin(pin: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| SopError::password_hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok())
}

/// 永远不会匹配任何 4 位 PIN 的哈希
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_pin("decoy-never-a-pin").ok())
        .as_deref()
}

/// 账号不存在时也跑一次完整的 Argon2 校验，使响应耗时与 PIN 错误一致
pub fn verify_pin_decoy(pin: &str) -> bool {
    decoy_hash().is_some_and(|hash| verify_pin(pin, hash).unwrap_or(false))
}
