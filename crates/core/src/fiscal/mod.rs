//! Accounting periods and the posting gate.

pub mod period;

pub use period::{PeriodService, YearMonth};
