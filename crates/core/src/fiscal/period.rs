//! Year/month accounting periods.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use freightledger_shared::PostingPolicy;

use crate::ledger::LedgerError;

/// A calendar month used as an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a period, validating the month.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidPeriod` if `month` is not 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month number (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

/// Period lock rules.
pub struct PeriodService;

impl PeriodService {
    /// Resolves whether a period is locked.
    ///
    /// `stored` is the lock flag of the period row, or `None` when the month
    /// has no row; the policy decides what a missing row means.
    #[must_use]
    pub const fn is_locked(stored: Option<bool>, policy: PostingPolicy) -> bool {
        match stored {
            Some(locked) => locked,
            None => matches!(policy, PostingPolicy::StrictRequire),
        }
    }
}
