//! Report repository for ledger reports.
//!
//! Loads journal lines joined with their journal headers and hands them to
//! [`ReportService`]; all aggregation happens in the core.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use freightledger_core::chart::{Account, ChartError};
use freightledger_core::reports::{
    GeneralLedgerReport, LedgerEntry, ReportError, ReportPeriod, ReportService, TrialBalanceReport,
};
use freightledger_shared::{
    AppError,
    types::{AccountId, JournalId, JournalLineId},
};

use super::classify;
use crate::entities::{accounts, journal_lines, journals};

/// Error types for report queries.
#[derive(Debug, thiserror::Error)]
pub enum ReportQueryError {
    /// Report rule violation.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// A stored account could not be read.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReportQueryError> for AppError {
    fn from(err: ReportQueryError) -> Self {
        match err {
            ReportQueryError::Report(inner) => classify(inner.http_status_code(), inner.to_string()),
            ReportQueryError::Chart(inner) => Self::Internal(inner.to_string()),
            ReportQueryError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

/// Journal line joined with its journal header.
#[derive(Debug, FromQueryResult)]
struct LineRow {
    line_id: Uuid,
    journal_id: Uuid,
    account_id: Uuid,
    label: String,
    debit: Decimal,
    credit: Decimal,
    date: NaiveDate,
    number: String,
    posted: bool,
}

impl From<LineRow> for LedgerEntry {
    fn from(row: LineRow) -> Self {
        Self {
            journal_id: JournalId::from_uuid(row.journal_id),
            line_id: JournalLineId::from_uuid(row.line_id),
            account_id: AccountId::from_uuid(row.account_id),
            date: row.date,
            journal_number: row.number,
            label: row.label,
            debit: row.debit,
            credit: row.credit,
            posted: row.posted,
        }
    }
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Generates a trial balance over one chart year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(skip(self))]
    pub async fn trial_balance(
        &self,
        chart_year: i32,
        period: ReportPeriod,
    ) -> Result<TrialBalanceReport, ReportQueryError> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::ChartYear.eq(chart_year))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?;
        let chart = models
            .iter()
            .map(accounts::Model::to_domain)
            .collect::<Result<Vec<Account>, _>>()?;

        let account_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let entries = self
            .load_entries(&account_ids, Some(period.date_from), period.date_to)
            .await?;

        Ok(ReportService::generate_trial_balance(period, &chart, &entries))
    }

    /// Generates the general ledger of one account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    #[instrument(skip(self))]
    pub async fn general_ledger(
        &self,
        account_id: AccountId,
        period: ReportPeriod,
    ) -> Result<GeneralLedgerReport, ReportQueryError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(ReportError::AccountNotFound(account_id))?
            .to_domain()?;

        let entries = self
            .load_entries(&[account_id.into_inner()], None, period.date_to)
            .await?;

        Ok(ReportService::generate_general_ledger(&account, period, entries))
    }

    /// Loads lines of the given accounts dated up to `date_to`, and from
    /// `date_from` when given.
    async fn load_entries(
        &self,
        account_ids: &[Uuid],
        date_from: Option<NaiveDate>,
        date_to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, DbErr> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = journal_lines::Entity::find()
            .select_only()
            .column_as(journal_lines::Column::Id, "line_id")
            .column(journal_lines::Column::JournalId)
            .column(journal_lines::Column::AccountId)
            .column(journal_lines::Column::Label)
            .column(journal_lines::Column::Debit)
            .column(journal_lines::Column::Credit)
            .column(journals::Column::Date)
            .column(journals::Column::Number)
            .column(journals::Column::Posted)
            .join(JoinType::InnerJoin, journal_lines::Relation::Journals.def())
            .filter(journal_lines::Column::AccountId.is_in(account_ids.iter().copied()))
            .filter(journals::Column::Date.lte(date_to));

        if let Some(date_from) = date_from {
            query = query.filter(journals::Column::Date.gte(date_from));
        }

        let rows = query
            .order_by_asc(journals::Column::Date)
            .order_by_asc(journal_lines::Column::JournalId)
            .order_by_asc(journal_lines::Column::Id)
            .into_model::<LineRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }
}
