//! Ledger domain types for journal creation and posting.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightledger_shared::types::AccountId;

use crate::numbering::{ResetPolicy, SequenceConfig};

/// Numbering scope for journal sequences.
pub const ACCOUNTING_SCOPE: &str = "accounting";

/// Maximum journal number length.
pub const NUMBER_MAX_LEN: usize = 30;
/// Maximum reference length.
pub const REFERENCE_MAX_LEN: usize = 50;
/// Maximum source type length.
pub const SOURCE_TYPE_MAX_LEN: usize = 20;
/// Maximum source reference length.
pub const SOURCE_REF_MAX_LEN: usize = 50;
/// Maximum line label length.
pub const LABEL_MAX_LEN: usize = 200;

/// Journal classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalKind {
    /// Opening balances.
    #[serde(rename = "OPEN")]
    Opening,
    /// General journal.
    #[default]
    #[serde(rename = "GJ")]
    General,
}

impl JournalKind {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "OPEN",
            Self::General => "GJ",
        }
    }

    /// Returns the display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Opening => "Opening Balance",
            Self::General => "General Journal",
        }
    }

    /// Sequence code journals of this kind are numbered from.
    #[must_use]
    pub const fn sequence_code(&self) -> &'static str {
        match self {
            Self::Opening => "JOURNAL_OPEN",
            Self::General => "JOURNAL_JV",
        }
    }

    /// Settings for the sequence when it is first created.
    #[must_use]
    pub fn sequence_defaults(&self) -> SequenceConfig {
        match self {
            Self::Opening => {
                SequenceConfig::new("OPEN", "{prefix}-{year}-{seq:04d}", ResetPolicy::Yearly)
            }
            Self::General => SequenceConfig {
                prefix: "JV".to_string(),
                ..SequenceConfig::default()
            },
        }
    }
}

impl std::fmt::Display for JournalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JournalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Opening),
            "GJ" => Ok(Self::General),
            other => Err(format!("Unknown journal kind: {other}")),
        }
    }
}

/// One line of a journal to be created.
///
/// Exactly one of `debit`/`credit` should be non-zero; both zero is accepted
/// as a placeholder line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// Postable, active account.
    pub account_id: AccountId,
    /// Line description.
    pub label: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

impl JournalLineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, label: impl Into<String>) -> Self {
        Self {
            account_id,
            label: label.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, label: impl Into<String>) -> Self {
        Self {
            account_id,
            label: label.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// Input for creating a journal with its lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJournalInput {
    /// Explicit number; allocated from the kind's sequence when `None`.
    pub number: Option<String>,
    /// Journal kind.
    pub kind: JournalKind,
    /// Journal date; decides the period.
    pub date: NaiveDate,
    /// External reference.
    pub reference: String,
    /// Description.
    pub description: String,
    /// Originating document type (e.g. `INV`).
    pub source_type: Option<String>,
    /// Originating document reference.
    pub source_ref: Option<String>,
    /// ISO currency code.
    pub currency: Option<String>,
    /// Lines.
    pub lines: Vec<JournalLineInput>,
}

impl CreateJournalInput {
    /// A general journal with the given lines.
    #[must_use]
    pub fn new(date: NaiveDate, description: impl Into<String>, lines: Vec<JournalLineInput>) -> Self {
        Self {
            date,
            description: description.into(),
            lines,
            ..Default::default()
        }
    }
}

/// Header changes for an unposted journal. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalHeaderUpdate {
    /// New date.
    pub date: Option<NaiveDate>,
    /// New reference.
    pub reference: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New source type; `Some(None)` clears it.
    pub source_type: Option<Option<String>>,
    /// New source reference; `Some(None)` clears it.
    pub source_ref: Option<Option<String>>,
    /// New currency; `Some(None)` clears it.
    pub currency: Option<Option<String>>,
}

/// Journal totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

impl JournalTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Sums `(debit, credit)` pairs.
    #[must_use]
    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let (debit, credit) = amounts
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), (debit, credit)| {
                (d + debit, c + credit)
            });
        Self::new(debit, credit)
    }

    /// Returns debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}
