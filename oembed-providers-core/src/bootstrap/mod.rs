//! Bootstrap module for wiring the provider registry
//!
//! This module handles:
//! - Configuration loading
//! - Cache, store and repository construction

pub mod config;
pub mod services;

pub use config::load_config;
pub use services::{init_services, Services};
