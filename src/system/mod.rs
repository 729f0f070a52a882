//! System-level modules
//!
//! - `logging`: tracing subscriber setup
//! - `shutdown`: OS signal handling for graceful stop

pub mod logging;
pub mod shutdown;
