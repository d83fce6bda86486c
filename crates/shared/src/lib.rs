//! Shared types, errors, and configuration for FreightLedger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management, including the accounting settings object

pub mod config;
pub mod error;
pub mod types;

pub use config::{AccountingSettings, AppConfig, DefaultAccounts, PostingPolicy, SettingsHandle};
pub use error::{AppError, AppResult};
