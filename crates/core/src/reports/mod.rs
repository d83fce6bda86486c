//! Ledger reports.
//!
//! This module provides pure business logic for:
//! - Trial Balance, rolled up over the account tree
//! - General Ledger with running balance

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
