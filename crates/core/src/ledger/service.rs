//! Ledger service for journal validation and posting rules.
//!
//! Pure business logic; the db crate supplies stored accounts and line
//! totals and runs these checks inside its transactions.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use freightledger_shared::types::{AccountId, JournalId};

use super::error::LedgerError;
use super::types::{
    CreateJournalInput, JournalHeaderUpdate, JournalLineInput, JournalTotals, LABEL_MAX_LEN,
    NUMBER_MAX_LEN, REFERENCE_MAX_LEN, SOURCE_REF_MAX_LEN, SOURCE_TYPE_MAX_LEN,
};
use crate::chart::Account;
use crate::fiscal::YearMonth;

/// Smallest amount that no longer fits a `(16, 2)` column.
const AMOUNT_LIMIT: i64 = 100_000_000_000_000;

/// Ledger service for journal validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates every line and the balance of a new journal.
    ///
    /// # Arguments
    ///
    /// * `lines` - Lines to validate
    /// * `account_validator` - Returns the stored account for an ID
    ///
    /// # Returns
    ///
    /// The journal totals on success.
    ///
    /// # Errors
    ///
    /// Returns the first line error, or `UnbalancedJournal` if debits and
    /// credits differ.
    pub fn validate_lines<A>(
        lines: &[JournalLineInput],
        account_validator: A,
    ) -> Result<JournalTotals, LedgerError>
    where
        A: Fn(AccountId) -> Result<Account, LedgerError>,
    {
        for line in lines {
            Self::validate_line(line, &account_validator)?;
        }

        let totals = Self::calculate_totals(lines);
        if !totals.is_balanced {
            return Err(LedgerError::UnbalancedJournal {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        Ok(totals)
    }

    /// Validates one line: label, amounts, and the target account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the line or its account is unusable.
    pub fn validate_line<A>(line: &JournalLineInput, account_validator: &A) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Result<Account, LedgerError>,
    {
        check_len("label", &line.label, LABEL_MAX_LEN)?;
        Self::validate_amounts(line.debit, line.credit)?;

        let account = account_validator(line.account_id)?;
        if !account.is_active {
            return Err(LedgerError::AccountInactive(line.account_id));
        }
        if !account.is_postable {
            return Err(LedgerError::AccountNotPostable(line.account_id));
        }

        Ok(())
    }

    /// Validates a debit/credit pair.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount`, `DebitAndCredit`, or `AmountPrecision`.
    pub fn validate_amounts(debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
        if debit < Decimal::ZERO || credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if debit > Decimal::ZERO && credit > Decimal::ZERO {
            return Err(LedgerError::DebitAndCredit);
        }
        for amount in [debit, credit] {
            if amount.normalize().scale() > 2 || amount >= Decimal::from(AMOUNT_LIMIT) {
                return Err(LedgerError::AmountPrecision(amount));
            }
        }
        Ok(())
    }

    /// Validates header field lengths and the currency code.
    ///
    /// # Errors
    ///
    /// Returns `FieldTooLong` or `InvalidCurrency`.
    pub fn validate_header(input: &CreateJournalInput) -> Result<(), LedgerError> {
        if let Some(number) = &input.number {
            check_len("number", number, NUMBER_MAX_LEN)?;
        }
        check_len("reference", &input.reference, REFERENCE_MAX_LEN)?;
        if let Some(source_type) = &input.source_type {
            check_len("source_type", source_type, SOURCE_TYPE_MAX_LEN)?;
        }
        if let Some(source_ref) = &input.source_ref {
            check_len("source_ref", source_ref, SOURCE_REF_MAX_LEN)?;
        }
        if let Some(currency) = &input.currency {
            check_currency(currency)?;
        }
        Ok(())
    }

    /// Validates a header update.
    ///
    /// # Errors
    ///
    /// Returns `FieldTooLong` or `InvalidCurrency`.
    pub fn validate_header_update(update: &JournalHeaderUpdate) -> Result<(), LedgerError> {
        if let Some(reference) = &update.reference {
            check_len("reference", reference, REFERENCE_MAX_LEN)?;
        }
        if let Some(Some(source_type)) = &update.source_type {
            check_len("source_type", source_type, SOURCE_TYPE_MAX_LEN)?;
        }
        if let Some(Some(source_ref)) = &update.source_ref {
            check_len("source_ref", source_ref, SOURCE_REF_MAX_LEN)?;
        }
        if let Some(Some(currency)) = &update.currency {
            check_currency(currency)?;
        }
        Ok(())
    }

    /// Calculate journal totals from line inputs.
    #[must_use]
    pub fn calculate_totals(lines: &[JournalLineInput]) -> JournalTotals {
        JournalTotals::from_amounts(lines.iter().map(|l| (l.debit, l.credit)))
    }

    /// Validate that a journal can be modified or deleted.
    ///
    /// # Errors
    ///
    /// Returns `PostedJournalLocked` if the journal is posted.
    pub fn validate_can_modify(journal_id: JournalId, posted: bool) -> Result<(), LedgerError> {
        if posted {
            return Err(LedgerError::PostedJournalLocked(journal_id));
        }
        Ok(())
    }

    /// Validate that a journal can be posted.
    ///
    /// Checks, in order: not already posted, period open, stored lines balanced.
    ///
    /// # Errors
    ///
    /// Returns `PostedJournalLocked`, `PeriodLocked`, or `UnbalancedJournal`.
    pub fn validate_for_posting(
        journal_id: JournalId,
        posted: bool,
        date: NaiveDate,
        period_locked: bool,
        totals: &JournalTotals,
    ) -> Result<(), LedgerError> {
        Self::validate_can_modify(journal_id, posted)?;

        if period_locked {
            return Err(LedgerError::PeriodLocked(YearMonth::from_date(date)));
        }

        if !totals.is_balanced {
            return Err(LedgerError::UnbalancedJournal {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        Ok(())
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), LedgerError> {
    if value.chars().count() > max {
        return Err(LedgerError::FieldTooLong { field, max });
    }
    Ok(())
}

fn check_currency(code: &str) -> Result<(), LedgerError> {
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(LedgerError::InvalidCurrency(code.to_string()))
    }
}
