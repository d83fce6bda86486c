//! Ledger error types for journal validation and posting.

use rust_decimal::Decimal;
use thiserror::Error;

use freightledger_shared::types::{AccountId, JournalId, JournalLineId};

use crate::fiscal::YearMonth;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal debits and credits differ.
    #[error("Journal not balanced: debit={debit} credit={credit}")]
    UnbalancedJournal {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Debit or credit is negative.
    #[error("Debit/Credit cannot be negative")]
    NegativeAmount,

    /// A line carries both a debit and a credit.
    #[error("Journal line cannot have both debit and credit")]
    DebitAndCredit,

    /// Amount has more than two decimal places or does not fit the column.
    #[error("Amount {0} must have at most 2 decimal places and 14 integer digits")]
    AmountPrecision(Decimal),

    /// A text field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length.
        max: usize,
    },

    /// Currency is not a three-letter ISO code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Month outside 1-12.
    #[error("Invalid period {year}-{month}: month must be between 1 and 12")]
    InvalidPeriod {
        /// Year.
        year: i32,
        /// Rejected month.
        month: u32,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account is a group account.
    #[error("Account {0} is not postable")]
    AccountNotPostable(AccountId),

    // ========== Journal State Errors ==========
    /// Journal's period is locked.
    #[error("Period {0} is locked. Cannot post journal.")]
    PeriodLocked(YearMonth),

    /// Journal is posted and can no longer change.
    #[error("Posted journal {0} is locked and cannot be modified")]
    PostedJournalLocked(JournalId),

    /// Journal not found.
    #[error("Journal not found: {0}")]
    JournalNotFound(JournalId),

    /// Journal line not found.
    #[error("Journal line not found: {0}")]
    LineNotFound(JournalLineId),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnbalancedJournal { .. } => "UNBALANCED_JOURNAL",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::DebitAndCredit => "DEBIT_AND_CREDIT",
            Self::AmountPrecision(_) => "AMOUNT_PRECISION",
            Self::FieldTooLong { .. } => "FIELD_TOO_LONG",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountNotPostable(_) => "ACCOUNT_NOT_POSTABLE",
            Self::PeriodLocked(_) => "PERIOD_LOCKED",
            Self::PostedJournalLocked(_) => "POSTED_JOURNAL_LOCKED",
            Self::JournalNotFound(_) => "JOURNAL_NOT_FOUND",
            Self::LineNotFound(_) => "JOURNAL_LINE_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::UnbalancedJournal { .. }
            | Self::NegativeAmount
            | Self::DebitAndCredit
            | Self::AmountPrecision(_)
            | Self::FieldTooLong { .. }
            | Self::InvalidCurrency(_)
            | Self::InvalidPeriod { .. }
            | Self::AccountInactive(_)
            | Self::AccountNotPostable(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::JournalNotFound(_) | Self::LineNotFound(_) => 404,

            // 409 Conflict - state errors
            Self::PeriodLocked(_) | Self::PostedJournalLocked(_) => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::UnbalancedJournal {
                debit: Decimal::new(100, 2),
                credit: Decimal::new(50, 2),
            }
            .error_code(),
            "UNBALANCED_JOURNAL"
        );
        assert_eq!(LedgerError::NegativeAmount.error_code(), "NEGATIVE_AMOUNT");
        assert_eq!(
            LedgerError::PostedJournalLocked(JournalId::new()).error_code(),
            "POSTED_JOURNAL_LOCKED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::DebitAndCredit.http_status_code(), 400);
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).http_status_code(),
            404
        );
        let period = YearMonth::new(2026, 2).unwrap();
        assert_eq!(LedgerError::PeriodLocked(period).http_status_code(), 409);
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::UnbalancedJournal {
            debit: Decimal::new(100_000_000, 2),
            credit: Decimal::new(90_000_000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Journal not balanced: debit=1000000.00 credit=900000.00"
        );
        assert_eq!(
            LedgerError::DebitAndCredit.to_string(),
            "Journal line cannot have both debit and credit"
        );
    }
}
