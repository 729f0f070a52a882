use actix_web::dev::ServerHandle;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

use crate::storage::SeaOrmStorage;
use crate::system::shutdown::wait_for_shutdown_signal;

/// 等待连接排空的上限（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 收到 SIGINT/SIGTERM 后优雅停止 HTTP 服务器
pub async fn listen_for_shutdown(handle: ServerHandle) {
    wait_for_shutdown_signal().await;
    info!("Shutdown signal received, draining connections...");

    if timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), handle.stop(true))
        .await
        .is_err()
    {
        error!(
            "Server did not stop within {} seconds, forcing shutdown",
            SHUTDOWN_TIMEOUT_SECS
        );
        handle.stop(false).await;
    }
}

/// 服务器退出后关闭连接池
pub async fn close_storage(storage: &SeaOrmStorage) {
    storage.close().await;
    info!("Database pool closed");
}
