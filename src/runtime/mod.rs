//! Application lifecycle: service wiring, server mode and CLI commands

pub mod lifetime;
pub mod modes;
