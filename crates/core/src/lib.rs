//! Core ledger logic for FreightLedger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the `db`
//! crate feeds it rows and persists what it decides.
//!
//! # Modules
//!
//! - `chart` - Chart of accounts tree and its invariants
//! - `numbering` - Document number templates and periodic reset
//! - `fiscal` - Year/month periods and the posting policy
//! - `ledger` - Double-entry journal validation and posting rules
//! - `reports` - Trial balance and general ledger

pub mod chart;
pub mod fiscal;
pub mod ledger;
pub mod numbering;
pub mod reports;
