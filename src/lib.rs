//! SOP Manager - multi-tenant restaurant operations service
//!
//! Bilingual (English / Thai) standard operating procedures, PIN-based staff
//! login, training modules with certificates, a translation workflow with
//! cached bundles, and manager dashboards. Every tenant-owned row is scoped
//! to one restaurant.
//!
//! # Architecture
//! - `storage`: SeaORM backend and restaurant row isolation
//! - `services`: business rules and role checks
//! - `cache`: translation bundle cache
//! - `api`: HTTP routes, middleware and JWT sessions
//! - `config`: TOML + environment configuration
//! - `runtime`: service wiring, server mode and maintenance commands
//! - `system`: logging and signal handling

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
