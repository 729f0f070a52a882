pub mod auth;
pub mod request_id;

pub use auth::SessionAuth;
pub use request_id::{RequestId, RequestIdMiddleware};
