//! Repository abstractions for data access.
//!
//! Repositories run the pure rules from `freightledger-core` inside database
//! transactions and hide the `SeaORM` details from the rest of the application.
//! Every repository error converts into [`AppError`] for collaborators.

pub mod account;
pub mod invoice;
pub mod journal;
pub mod period_lock;
pub mod report;
pub mod sequence;

pub use account::{
    AccountError, AccountRepository, CreateAccountInput, ResolvedDefaultAccounts,
    UpdateAccountInput,
};
pub use invoice::{InvoicePostingService, SalesInvoice};
pub use journal::{
    JournalError, JournalRepository, JournalWithLines, create_journal_in, find_by_source_in,
    get_journal_in, post_journal_in,
};
pub use period_lock::{PeriodLockError, PeriodLockRepository, is_locked_in};
pub use report::{ReportQueryError, ReportRepository};
pub use sequence::{SequenceError, SequenceRepository, allocate_number, with_sequence_lock};

use freightledger_shared::AppError;

/// Maps a core error onto the boundary error by its HTTP status.
pub(crate) fn classify(status: u16, message: String) -> AppError {
    match status {
        400 => AppError::Validation(message),
        404 => AppError::NotFound(message),
        409 => AppError::Conflict(message),
        422 => AppError::BusinessRule(message),
        _ => AppError::Internal(message),
    }
}
