//! Pictor Core Library
//!
//! This crate provides the error type, configuration, and shared domain models
//! used by the pictor storage and processing crates.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use error::{AppError, AppResult};
pub use models::style::{validate_style_name, StyleRecord};
