pub mod ip;
pub mod pin;

use chrono::{DateTime, Utc};

/// 新记录主键（UUID v4）
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 证书编号：`CERT-<YYYYMMDD>-<8 位大写十六进制>`
pub fn generate_certificate_number(issued_at: DateTime<Utc>) -> String {
    format!(
        "CERT-{}-{:08X}",
        issued_at.format("%Y%m%d"),
        rand::random::<u32>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_certificate_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        let number = generate_certificate_number(at);
        assert_eq!(number.len(), "CERT-20260305-".len() + 8);
        assert!(number.starts_with("CERT-20260305-"));
        let suffix = &number["CERT-20260305-".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_new_id_is_uuid() {
        assert!(uuid::Uuid::parse_str(&new_id()).is_ok());
    }
}
