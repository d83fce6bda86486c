//! Chart of accounts domain types.

use serde::{Deserialize, Serialize};

use freightledger_shared::types::AccountId;

use super::error::ChartError;

/// Maximum length of an account code.
pub const ACCOUNT_CODE_MAX_LEN: usize = 20;

/// Maximum length of an account name.
pub const ACCOUNT_NAME_MAX_LEN: usize = 120;

/// Account classification.
///
/// The declaration order is the order report sections are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Things the business owns.
    Asset,
    /// Things the business owes.
    Liability,
    /// Owner's interest.
    Equity,
    /// Revenue.
    Income,
    /// Costs and operating expenses.
    Expense,
}

impl AccountType {
    /// All account types in report order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
    ];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Returns the human-readable section label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Asset => "Asset",
            Self::Liability => "Liability",
            Self::Equity => "Equity",
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(ChartError::UnknownAccountType(other.to_string())),
        }
    }
}

/// A ledger account in one chart year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Account code, unique within the chart year.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Parent group account, if any.
    pub parent_id: Option<AccountId>,
    /// Fiscal year this chart belongs to.
    pub chart_year: i32,
    /// Whether journal lines may be posted directly to this account.
    pub is_postable: bool,
    /// Inactive accounts stay in the chart but reject new lines.
    pub is_active: bool,
}

impl Account {
    /// Creates an active, postable root account.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        chart_year: i32,
    ) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            account_type,
            parent_id: None,
            chart_year,
            is_postable: true,
            is_active: true,
        }
    }

    /// Returns a copy of this account placed under `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: AccountId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Returns true if journal lines may reference this account.
    #[must_use]
    pub const fn accepts_postings(&self) -> bool {
        self.is_active && self.is_postable
    }
}
