//! Chart of accounts.
//!
//! Accounts form a self-referencing tree per chart year. The rules enforced
//! here:
//! - an account is never its own ancestor
//! - a child has the same type as its parent
//! - an account with children is a group account and is not postable

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::{ChartError, ChartRule};
pub use service::ChartService;
pub use types::{Account, AccountType};
