pub mod health;
pub mod v1;

pub use health::health_routes;
pub use v1::{LoginLimiterConfig, login_limiter_config, v1_routes};
