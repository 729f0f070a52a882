//! SeaORM storage backend
//!
//! SQLite, MySQL/MariaDB and PostgreSQL through one `SeaOrmStorage`.
//! Every method on a tenant-owned table takes a [`RestaurantScope`]
//! and filters through `storage::scope`.
//!
//! [`RestaurantScope`]: crate::storage::scope::RestaurantScope

mod attachments;
mod audit;
mod categories;
mod connection;
mod converters;
mod restaurants;
pub mod retry;
mod sops;
mod staff;
mod training;
mod translations;

use std::future::Future;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use tracing::{info, warn};

use crate::errors::{Result, SopError};
use crate::storage::models::StorageInfo;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use staff::{PinFailure, StaffActivity};
pub use training::TrainingSummary;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(SopError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(SopError::database_config("database_url is empty"));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config.database.pool_size).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        };

        run_migrations(&storage.db).await?;

        info!("{} storage initialized", storage.backend_name.to_uppercase());
        Ok(storage)
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn storage_info(&self) -> StorageInfo {
        StorageInfo {
            backend: self.backend_name.clone(),
        }
    }

    /// 数据库连通性检查（readiness 探针使用）
    pub async fn ping(&self) -> Result<()> {
        let backend = self.db.get_database_backend();
        self.db
            .execute_raw(Statement::from_string(backend, "SELECT 1"))
            .await
            .map(|_| ())
            .map_err(|e| SopError::database_connection(format!("Database ping failed: {}", e)))
    }

    /// 关闭连接池；所有 clone 共享同一个池
    pub async fn close(&self) {
        if let Err(e) = self.db.clone().close().await {
            warn!("Failed to close database pool: {}", e);
        }
    }

    /// 带重试执行单条读/写
    async fn retrying<T, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, DbErr>>,
    {
        retry::with_retry(operation_name, self.retry_config, operation)
            .await
            .map_err(SopError::from)
    }
}

/// `INSERT ... ON CONFLICT DO NOTHING` 的结果；行已存在返回 `Ok(false)`
pub(crate) fn insert_if_absent<T>(result: std::result::Result<T, DbErr>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => {
            // 部分后端 do_nothing 时报 "no rows" 而不是 RecordNotInserted
            let message = e.to_string().to_lowercase();
            if message.contains("no rows") || message.contains("record not inserted") {
                Ok(false)
            } else {
                Err(e.into())
            }
        }
    }
}

/// SQL LIKE 模式转义（`%` `_` `\`）
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://data.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("sop.sqlite").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("mariadb://u@h/db").unwrap(), "mysql");
        assert_eq!(
            infer_backend_from_url("postgresql://u@h/db").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Fry"), "%fry%");
        assert_eq!(like_pattern("100%_x"), "%100\\%\\_x%");
    }
}
