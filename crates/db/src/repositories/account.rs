//! Account repository for chart of accounts database operations.
//!
//! Tree rules come from [`ChartService`]; this repository loads the chart for
//! the account's fiscal year, validates against it, and persists the result
//! together with any parent demotion in one transaction.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};

use freightledger_core::chart::{Account, AccountType, ChartError, ChartRule, ChartService};
use freightledger_shared::{AccountingSettings, AppError, types::AccountId};

use super::classify;
use crate::entities::accounts;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account code already exists in the chart year.
    #[error("Account code '{code}' already exists in chart {chart_year}")]
    DuplicateCode {
        /// Chart year.
        chart_year: i32,
        /// Offending code.
        code: String,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No account with this code in the chart year.
    #[error("Account code '{code}' not found in chart {chart_year}")]
    AccountCodeNotFound {
        /// Chart year.
        chart_year: i32,
        /// Requested code.
        code: String,
    },

    /// A tree rule or field rule was broken.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// A configured default account cannot be used.
    #[error("Default account '{mapping}' ({code}): {reason}")]
    DefaultAccount {
        /// Mapping name (ar, sales, tax, cash, pph).
        mapping: &'static str,
        /// Configured account code.
        code: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A default account mapping is required but not configured.
    #[error("Default account '{0}' is not configured")]
    DefaultAccountMissing(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateCode { .. } => Self::Conflict(err.to_string()),
            AccountError::AccountNotFound(_) | AccountError::AccountCodeNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            AccountError::Chart(inner) => classify(inner.http_status_code(), inner.to_string()),
            AccountError::DefaultAccount { .. } | AccountError::DefaultAccountMissing(_) => {
                Self::Configuration(err.to_string())
            }
            AccountError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Fiscal year of the chart.
    pub chart_year: i32,
    /// Account code (unique within the chart year).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Parent group account.
    pub parent_id: Option<AccountId>,
    /// Whether lines may be posted to the account.
    pub is_postable: bool,
    /// Whether the account is active.
    pub is_active: bool,
}

impl CreateAccountInput {
    /// Input for an active, postable root account.
    #[must_use]
    pub fn new(
        chart_year: i32,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            chart_year,
            code: code.into(),
            name: name.into(),
            account_type,
            parent_id: None,
            is_postable: true,
            is_active: true,
        }
    }

    /// Places the new account under `parent`.
    #[must_use]
    pub fn under(mut self, parent: AccountId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Marks the new account as a non-postable group.
    #[must_use]
    pub fn group(mut self) -> Self {
        self.is_postable = false;
        self
    }
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Account code.
    pub code: Option<String>,
    /// Account name.
    pub name: Option<String>,
    /// Account type.
    pub account_type: Option<AccountType>,
    /// Parent account ID.
    pub parent_id: Option<Option<AccountId>>,
    /// Whether lines may be posted to the account.
    pub is_postable: Option<bool>,
    /// Whether the account is active.
    pub is_active: Option<bool>,
}

/// Default accounts resolved against the active chart.
#[derive(Debug, Clone, Default)]
pub struct ResolvedDefaultAccounts {
    accounts: HashMap<&'static str, Account>,
}

impl ResolvedDefaultAccounts {
    /// Returns the account for a mapping, if one is configured.
    #[must_use]
    pub fn get(&self, mapping: &str) -> Option<&Account> {
        self.accounts.get(mapping)
    }

    /// Returns the account for a mapping.
    ///
    /// # Errors
    ///
    /// Returns `DefaultAccountMissing` if the mapping is not configured.
    pub fn require(&self, mapping: &'static str) -> Result<&Account, AccountError> {
        self.get(mapping)
            .ok_or(AccountError::DefaultAccountMissing(mapping))
    }

    /// Number of resolved mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if no mapping is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Account repository for chart of accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account and demotes its parent to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The code already exists in the chart year
    /// - A field is missing or too long
    /// - The parent is missing, would form a cycle, or has another type
    #[instrument(skip(self, input), fields(chart_year = input.chart_year, code = %input.code))]
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account, AccountError> {
        let txn = self.db.begin().await?;

        let account = Account {
            parent_id: input.parent_id,
            is_postable: input.is_postable,
            is_active: input.is_active,
            ..Account::new(input.code, input.name, input.account_type, input.chart_year)
        };
        ChartService::validate_fields(&account)?;
        ensure_code_free(&txn, account.chart_year, &account.code, None).await?;

        let chart = load_chart(&txn, account.chart_year).await?;
        ChartService::validate(&account, false, |id| chart.get(&id).cloned())?;

        let now = chrono::Utc::now().into();
        accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            chart_year: Set(account.chart_year),
            code: Set(account.code.clone()),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.as_str().to_string()),
            parent_id: Set(account.parent_id.map(AccountId::into_inner)),
            is_postable: Set(account.is_postable),
            is_active: Set(account.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if let Some(parent) = account.parent_id.and_then(|id| chart.get(&id)) {
            demote_parent(&txn, parent).await?;
        }

        txn.commit().await?;

        info!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// Updates an account, revalidating it against the stored chart.
    ///
    /// A new parent is demoted to a group in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not found or the change breaks a
    /// chart rule.
    #[instrument(skip(self, input))]
    pub async fn update_account(
        &self,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<Account, AccountError> {
        let txn = self.db.begin().await?;

        let chart_year = accounts::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(AccountError::AccountNotFound(id))?
            .chart_year;
        let chart = load_chart(&txn, chart_year).await?;
        let current = chart.get(&id).cloned().ok_or(AccountError::AccountNotFound(id))?;

        let mut updated = current.clone();
        if let Some(code) = input.code {
            updated.code = code;
        }
        if let Some(name) = input.name {
            updated.name = name;
        }
        if let Some(account_type) = input.account_type {
            updated.account_type = account_type;
        }
        if let Some(parent_id) = input.parent_id {
            updated.parent_id = parent_id;
        }
        if let Some(is_postable) = input.is_postable {
            updated.is_postable = is_postable;
        }
        if let Some(is_active) = input.is_active {
            updated.is_active = is_active;
        }

        ChartService::validate_fields(&updated)?;
        if updated.code != current.code {
            ensure_code_free(&txn, chart_year, &updated.code, Some(id)).await?;
        }

        let has_children = chart.values().any(|a| a.parent_id == Some(id));
        if has_children && updated.account_type != current.account_type {
            return Err(ChartError::from(ChartRule::TypeMismatch).into());
        }
        ChartService::validate(&updated, has_children, |aid| chart.get(&aid).cloned())?;

        save(&txn, &updated).await?;
        if updated.parent_id != current.parent_id {
            if let Some(parent) = updated.parent_id.and_then(|pid| chart.get(&pid)) {
                demote_parent(&txn, parent).await?;
            }
        }

        txn.commit().await?;
        Ok(updated)
    }

    /// Places `child` under `parent` and demotes the parent.
    ///
    /// Returns `(parent, child)` as persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if either account is missing or the move breaks a
    /// chart rule.
    #[instrument(skip(self))]
    pub async fn attach_child(
        &self,
        parent_id: AccountId,
        child_id: AccountId,
    ) -> Result<(Account, Account), AccountError> {
        let txn = self.db.begin().await?;

        let child_year = accounts::Entity::find_by_id(child_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(AccountError::AccountNotFound(child_id))?
            .chart_year;
        let chart = load_chart(&txn, child_year).await?;

        let child = chart
            .get(&child_id)
            .ok_or(AccountError::AccountNotFound(child_id))?;
        let parent = chart
            .get(&parent_id)
            .cloned()
            .ok_or_else(|| ChartError::from(ChartRule::ParentNotFound))?;
        let child_has_children = chart.values().any(|a| a.parent_id == Some(child_id));

        let (parent_after, child_after) =
            ChartService::attach_child(&parent, child, child_has_children, |id| {
                chart.get(&id).cloned()
            })?;

        save(&txn, &child_after).await?;
        if parent_after != parent {
            save(&txn, &parent_after).await?;
        }

        txn.commit().await?;

        info!(%parent_id, %child_id, "child account attached");
        Ok((parent_after, child_after))
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Account, AccountError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(AccountError::AccountNotFound(id))?;
        Ok(model.to_domain()?)
    }

    /// Finds an account by code within a chart year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_code(
        &self,
        chart_year: i32,
        code: &str,
    ) -> Result<Option<Account>, AccountError> {
        find_code(&self.db, chart_year, code).await
    }

    /// Lists the whole chart for a year, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_chart(&self, chart_year: i32) -> Result<Vec<Account>, AccountError> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::ChartYear.eq(chart_year))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?;

        models
            .iter()
            .map(|m| m.to_domain().map_err(AccountError::from))
            .collect()
    }

    /// Lists active postable accounts for a year, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_postable(
        &self,
        chart_year: i32,
        account_type: Option<AccountType>,
    ) -> Result<Vec<Account>, AccountError> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::ChartYear.eq(chart_year))
            .filter(accounts::Column::IsActive.eq(true))
            .filter(accounts::Column::IsPostable.eq(true));

        if let Some(account_type) = account_type {
            query = query.filter(accounts::Column::AccountType.eq(account_type.as_str()));
        }

        let models = query
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?;

        models
            .iter()
            .map(|m| m.to_domain().map_err(AccountError::from))
            .collect()
    }

    /// Returns true if any account exists for the chart year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn chart_exists(&self, chart_year: i32) -> Result<bool, AccountError> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::ChartYear.eq(chart_year))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Resolves the configured default accounts against the active chart.
    ///
    /// Every configured code must exist in the active fiscal year and be
    /// active and postable.
    ///
    /// # Errors
    ///
    /// Returns `DefaultAccount` naming the first unusable mapping.
    #[instrument(skip_all, fields(chart_year = settings.active_fiscal_year))]
    pub async fn resolve_default_accounts(
        &self,
        settings: &AccountingSettings,
    ) -> Result<ResolvedDefaultAccounts, AccountError> {
        let mut resolved = ResolvedDefaultAccounts::default();

        for (mapping, code) in settings.default_accounts.configured() {
            let reject = |reason| AccountError::DefaultAccount {
                mapping,
                code: code.to_string(),
                reason,
            };

            let account = find_code(&self.db, settings.active_fiscal_year, code)
                .await?
                .ok_or_else(|| reject("not found in the active chart"))?;
            if !account.is_active {
                return Err(reject("account is inactive"));
            }
            if !account.is_postable {
                return Err(reject("account is not postable"));
            }

            resolved.accounts.insert(mapping, account);
        }

        Ok(resolved)
    }
}

async fn find_code<C: ConnectionTrait>(
    conn: &C,
    chart_year: i32,
    code: &str,
) -> Result<Option<Account>, AccountError> {
    let model = accounts::Entity::find()
        .filter(accounts::Column::ChartYear.eq(chart_year))
        .filter(accounts::Column::Code.eq(code))
        .one(conn)
        .await?;

    Ok(model.map(|m| m.to_domain()).transpose()?)
}

async fn ensure_code_free<C: ConnectionTrait>(
    conn: &C,
    chart_year: i32,
    code: &str,
    except: Option<AccountId>,
) -> Result<(), AccountError> {
    let mut query = accounts::Entity::find()
        .filter(accounts::Column::ChartYear.eq(chart_year))
        .filter(accounts::Column::Code.eq(code));
    if let Some(id) = except {
        query = query.filter(accounts::Column::Id.ne(id.into_inner()));
    }

    if query.one(conn).await?.is_some() {
        return Err(AccountError::DuplicateCode {
            chart_year,
            code: code.to_string(),
        });
    }
    Ok(())
}

/// Loads a chart year keyed by ID.
pub(crate) async fn load_chart<C: ConnectionTrait>(
    conn: &C,
    chart_year: i32,
) -> Result<HashMap<AccountId, Account>, AccountError> {
    let models = accounts::Entity::find()
        .filter(accounts::Column::ChartYear.eq(chart_year))
        .all(conn)
        .await?;

    models
        .iter()
        .map(|m| Ok((AccountId::from_uuid(m.id), m.to_domain()?)))
        .collect()
}

async fn demote_parent<C: ConnectionTrait>(conn: &C, parent: &Account) -> Result<(), DbErr> {
    if let Some(group) = ChartService::demote(parent) {
        save(conn, &group).await?;
        info!(account_id = %group.id, code = %group.code, "parent demoted to group account");
    }
    Ok(())
}

async fn save<C: ConnectionTrait>(conn: &C, account: &Account) -> Result<(), DbErr> {
    accounts::ActiveModel {
        id: Unchanged(account.id.into_inner()),
        chart_year: Set(account.chart_year),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.as_str().to_string()),
        parent_id: Set(account.parent_id.map(AccountId::into_inner)),
        is_postable: Set(account.is_postable),
        is_active: Set(account.is_active),
        updated_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}
