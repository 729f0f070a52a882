//! Server mode
//!
//! Builds the services once, then starts the actix-web server with CORS,
//! compression and request IDs, and stops it gracefully on SIGINT/SIGTERM.

use actix_cors::Cors;
use actix_web::http::{Method, header};
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::login_limiter_config;
use crate::config::{ServerConfig, get_config};
use crate::runtime::lifetime::{self, AppServices};
use crate::storage::StorageFactory;

/// 启动时检查一次 CORS 配置
fn validate_cors_config(server: &ServerConfig) {
    if server.cors_allowed_origins.is_empty() {
        info!("CORS: no allowed origins configured, same-origin only");
    } else if server.cors_allowed_origins.iter().any(|o| o == "*") {
        warn!(
            "CORS allows any origin. Session cookies are not sent cross-origin in this mode; \
             list origins explicitly to allow credentialed requests."
        );
    }
}

/// 构建 CORS 中间件
fn build_cors_middleware(server: &ServerConfig) -> Cors {
    let origins = &server.cors_allowed_origins;
    if origins.is_empty() {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
        .max_age(3600);

    // any origin + credentials 会让任意站点携带会话，故只在显式列表时开启
    if origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
    }
    cors
}

/// Run the HTTP server
///
/// Logging must be initialized before calling this function.
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    let services = AppServices::build(storage.clone(), &config);
    let login_limiter = login_limiter_config(&config.auth)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Invalid login rate limit settings")?;

    validate_cors_config(&config.server);
    if config.auth.trusted_proxies.is_empty() {
        info!("No trusted proxies configured; client IP is the peer address");
    } else {
        warn!(
            "Trusting X-Forwarded-For from proxies: {:?}",
            config.auth.trusted_proxies
        );
    }

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    let server_config = config.server.clone();
    let bind_address = format!("{}:{}", server_config.host, server_config.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&server_config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Cache-Control", "no-store")),
            )
            .configure(|cfg| services.configure(cfg, &login_limiter))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    warn!(
        "Starting server at http://{} with {} workers",
        bind_address, cpu_count
    );

    let handle = server.handle();
    tokio::spawn(lifetime::shutdown::listen_for_shutdown(handle));

    let result = server.await;
    if let Err(ref e) = result {
        error!("Server exited with error: {}", e);
    }
    lifetime::shutdown::close_storage(&storage).await;
    result.context("HTTP server failed")?;
    info!("Server stopped");
    Ok(())
}
