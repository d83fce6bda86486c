//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightledger_shared::types::{AccountId, JournalId, JournalLineId};

use super::error::ReportError;
use crate::chart::AccountType;

/// Date range and posting filter shared by all reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// First date included.
    pub date_from: NaiveDate,
    /// Last date included.
    pub date_to: NaiveDate,
    /// Only count lines of posted journals.
    pub posted_only: bool,
}

impl ReportPeriod {
    /// Creates a period, validating the range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `date_from` is after `date_to`.
    pub fn new(date_from: NaiveDate, date_to: NaiveDate, posted_only: bool) -> Result<Self, ReportError> {
        if date_from > date_to {
            return Err(ReportError::InvalidDateRange {
                start: date_from,
                end: date_to,
            });
        }
        Ok(Self {
            date_from,
            date_to,
            posted_only,
        })
    }

    /// Returns true if `date` is inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_from <= date && date <= self.date_to
    }

    /// Returns true if a line with this posting state is counted.
    #[must_use]
    pub const fn counts(&self, posted: bool) -> bool {
        posted || !self.posted_only
    }
}

/// One journal line as read for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Owning journal.
    pub journal_id: JournalId,
    /// Line ID.
    pub line_id: JournalLineId,
    /// Account the line posts to.
    pub account_id: AccountId,
    /// Journal date.
    pub date: NaiveDate,
    /// Journal number.
    pub journal_number: String,
    /// Line label.
    pub label: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Whether the journal is posted.
    pub posted: bool,
}

/// Debit and credit sums of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl AccountActivity {
    /// Adds a debit/credit pair.
    pub fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit += debit;
        self.credit += credit;
    }

    /// Debit minus credit.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Trial balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Depth in the tree; roots are 0.
    pub level: usize,
    /// Whether the account is a leaf.
    pub is_postable: bool,
    /// Debit, including descendants.
    pub debit: Decimal,
    /// Credit, including descendants.
    pub credit: Decimal,
    /// Debit minus credit.
    pub balance: Decimal,
}

/// Trial balance rows of one account type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceSection {
    /// Account type.
    pub account_type: AccountType,
    /// Section label.
    pub label: String,
    /// Rows in tree pre-order.
    pub rows: Vec<TrialBalanceRow>,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Total debit minus total credit.
    pub difference: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Reported range.
    pub period: ReportPeriod,
    /// Sections in account type order, empty types omitted.
    pub sections: Vec<TrialBalanceSection>,
    /// Totals over root accounts.
    pub totals: TrialBalanceTotals,
}

impl TrialBalanceReport {
    /// All rows in report order.
    pub fn rows(&self) -> impl Iterator<Item = &TrialBalanceRow> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }

    /// Finds the row for an account code.
    #[must_use]
    pub fn row(&self, code: &str) -> Option<&TrialBalanceRow> {
        self.rows().find(|r| r.code == code)
    }
}

/// General ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLedgerRow {
    /// Journal ID.
    pub journal_id: JournalId,
    /// Line ID.
    pub line_id: JournalLineId,
    /// Journal date.
    pub date: NaiveDate,
    /// Journal number.
    pub reference: String,
    /// Line label.
    pub label: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Running balance after this row.
    pub balance: Decimal,
}

/// General ledger for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLedgerReport {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Reported range.
    pub period: ReportPeriod,
    /// Net of lines before `date_from`.
    pub opening_balance: Decimal,
    /// Rows in (date, journal, line) order.
    pub rows: Vec<GeneralLedgerRow>,
    /// Sum of debits in range.
    pub total_debit: Decimal,
    /// Sum of credits in range.
    pub total_credit: Decimal,
    /// Balance after the last row.
    pub closing_balance: Decimal,
}
