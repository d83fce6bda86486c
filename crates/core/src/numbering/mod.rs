//! Document numbering.
//!
//! A sequence is a counter per `(scope, code)` with a template such as
//! `{prefix}-{month:02d}{yy:02d}-{seq:04d}` and a reset policy. This module
//! holds the pure parts: parsing and rendering templates, and advancing a
//! counter for a given date. Locking the stored row is the db crate's job.

pub mod error;
pub mod sequence;
pub mod template;

#[cfg(test)]
mod template_props;

pub use error::SequenceFormatError;
pub use sequence::{
    Allocation, ClosedPeriod, Counters, NumberingService, PeriodKey, PeriodPosition, ResetPolicy,
    SequenceConfig, SequenceState,
};
pub use template::{DEFAULT_FORMAT, SequenceTemplate, Token};
