//! Double-entry journals.
//!
//! A journal is created unposted with its lines in one step, and becomes
//! immutable once posted. This module validates lines, totals and the
//! posting preconditions; the db crate runs them inside its transactions.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::LedgerService;
pub use types::*;
