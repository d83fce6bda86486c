//! `SeaORM` entity definitions.

pub mod accounts;
pub mod journal_lines;
pub mod journals;
pub mod number_sequence_periods;
pub mod number_sequences;
pub mod period_locks;
