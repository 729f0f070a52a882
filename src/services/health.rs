//! 存活 / 就绪 / 完整健康检查
//!
//! 直接探测数据库，不经过业务服务；k8s probe 需要快速返回。

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseCheck {
    pub status: &'static str,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub database: DatabaseCheck,
    pub response_time_ms: u64,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

pub struct HealthService {
    storage: Arc<SeaOrmStorage>,
    started_at: DateTime<Utc>,
}

impl HealthService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            storage,
            started_at: Utc::now(),
        }
    }

    /// 数据库能在超时内响应 `SELECT 1`
    pub async fn ready(&self) -> bool {
        matches!(
            tokio::time::timeout(PING_TIMEOUT, self.storage.ping()).await,
            Ok(Ok(()))
        )
    }

    pub async fn report(&self) -> HealthReport {
        let start = Instant::now();
        trace!("Running health check");

        let backend = self.storage.backend_name().to_string();
        let database = match tokio::time::timeout(PING_TIMEOUT, self.storage.ping()).await {
            Ok(Ok(())) => DatabaseCheck {
                status: "healthy",
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Database health check failed: {}", e);
                DatabaseCheck {
                    status: "unhealthy",
                    backend,
                    error: Some(e.message().to_string()),
                }
            }
            Err(_) => {
                error!("Database health check timed out");
                DatabaseCheck {
                    status: "unhealthy",
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        };

        let now = Utc::now();
        HealthReport {
            status: database.status,
            timestamp: now,
            uptime_secs: (now - self.started_at).num_seconds().max(0) as u64,
            database,
            response_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}
