//! Journal repository: the posting engine.
//!
//! This is the only write path for journals and journal lines. A journal is
//! created unposted, balanced, and numbered in one transaction; posting
//! re-checks the stored lines and the period lock, after which the journal and
//! its lines are immutable.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use freightledger_core::chart::{Account, ChartError};
use freightledger_core::ledger::{
    ACCOUNTING_SCOPE, CreateJournalInput, JournalHeaderUpdate, JournalLineInput, JournalTotals,
    LedgerError, LedgerService, NUMBER_MAX_LEN,
};
use freightledger_shared::{
    AppError, PostingPolicy, SettingsHandle,
    types::{AccountId, JournalId, JournalLineId},
};

use super::classify;
use super::period_lock::is_locked_in;
use super::sequence::{SequenceError, allocate_number};
use crate::entities::{accounts, journal_lines, journals};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Ledger rule violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Number allocation failed.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// A stored account could not be read.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Journal number already used.
    #[error("Journal number '{0}' already exists")]
    DuplicateNumber(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Ledger(
                ref inner @ (LedgerError::UnbalancedJournal { .. }
                | LedgerError::PeriodLocked(_)
                | LedgerError::PostedJournalLocked(_)),
            ) => Self::BusinessRule(inner.to_string()),
            JournalError::Ledger(inner) => classify(inner.http_status_code(), inner.to_string()),
            JournalError::Sequence(inner) => inner.into(),
            JournalError::Chart(inner) => Self::Internal(inner.to_string()),
            JournalError::DuplicateNumber(_) => Self::Conflict(err.to_string()),
            JournalError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

/// A journal with its lines and totals.
#[derive(Debug, Clone)]
pub struct JournalWithLines {
    /// Journal header.
    pub journal: journals::Model,
    /// Lines in creation order.
    pub lines: Vec<journal_lines::Model>,
    /// Totals of the lines.
    pub totals: JournalTotals,
}

impl JournalWithLines {
    fn new(journal: journals::Model, lines: Vec<journal_lines::Model>) -> Self {
        let totals = JournalTotals::from_amounts(lines.iter().map(|l| (l.debit, l.credit)));
        Self {
            journal,
            lines,
            totals,
        }
    }

    /// Journal ID.
    #[must_use]
    pub fn id(&self) -> JournalId {
        JournalId::from_uuid(self.journal.id)
    }
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    settings: SettingsHandle,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: SettingsHandle) -> Self {
        Self { db, settings }
    }

    /// Creates an unposted journal with its lines.
    ///
    /// See [`create_journal_in`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A header field is invalid
    /// - A line is invalid or targets a missing, inactive, or group account
    /// - Debits and credits differ (`UnbalancedJournal`)
    /// - The number already exists
    pub async fn create_journal(
        &self,
        input: CreateJournalInput,
    ) -> Result<JournalWithLines, JournalError> {
        create_journal_in(&self.db, input).await
    }

    /// Posts a journal under the current posting policy.
    ///
    /// See [`post_journal_in`].
    ///
    /// # Errors
    ///
    /// Returns `PostedJournalLocked`, `PeriodLocked`, `UnbalancedJournal`,
    /// or `JournalNotFound`.
    pub async fn post_journal(&self, journal_id: JournalId) -> Result<JournalWithLines, JournalError> {
        let policy = self.settings.current().posting_policy;
        post_journal_in(&self.db, journal_id, policy).await
    }

    /// Gets a journal with its lines.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound` if it does not exist.
    pub async fn get_journal(&self, journal_id: JournalId) -> Result<JournalWithLines, JournalError> {
        get_journal_in(&self.db, journal_id).await
    }

    /// Finds a journal by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_number(&self, number: &str) -> Result<Option<JournalWithLines>, JournalError> {
        let Some(journal) = journals::Entity::find()
            .filter(journals::Column::Number.eq(number))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let lines = find_lines(&self.db, JournalId::from_uuid(journal.id)).await?;
        Ok(Some(JournalWithLines::new(journal, lines)))
    }

    /// Lists journals created from a source document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_source(
        &self,
        source_type: &str,
        source_ref: &str,
    ) -> Result<Vec<journals::Model>, JournalError> {
        Ok(find_by_source_in(&self.db, source_type, source_ref).await?)
    }

    /// Updates the header of an unposted journal.
    ///
    /// # Errors
    ///
    /// Returns `PostedJournalLocked` if the journal is posted, or a
    /// validation error for the new values.
    #[instrument(skip(self, update))]
    pub async fn update_journal(
        &self,
        journal_id: JournalId,
        update: JournalHeaderUpdate,
    ) -> Result<journals::Model, JournalError> {
        let txn = self.db.begin().await?;

        let journal = find_journal(&txn, journal_id, true).await?;
        LedgerService::validate_can_modify(journal_id, journal.posted)?;
        LedgerService::validate_header_update(&update)?;

        let mut active: journals::ActiveModel = journal.into();
        if let Some(date) = update.date {
            active.date = Set(date);
        }
        if let Some(reference) = update.reference {
            active.reference = Set(reference);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(source_type) = update.source_type {
            active.source_type = Set(source_type);
        }
        if let Some(source_ref) = update.source_ref {
            active.source_ref = Set(source_ref);
        }
        if let Some(currency) = update.currency {
            active.currency = Set(currency);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let journal = active.update(&txn).await?;

        txn.commit().await?;
        Ok(journal)
    }

    /// Adds a line to an unposted journal.
    ///
    /// Balance is not enforced until the journal is posted.
    ///
    /// # Errors
    ///
    /// Returns `PostedJournalLocked` if the journal is posted, or a line
    /// validation error.
    #[instrument(skip(self, line))]
    pub async fn add_line(
        &self,
        journal_id: JournalId,
        line: JournalLineInput,
    ) -> Result<journal_lines::Model, JournalError> {
        let txn = self.db.begin().await?;

        let journal = find_journal(&txn, journal_id, true).await?;
        LedgerService::validate_can_modify(journal_id, journal.posted)?;
        validate_line(&txn, &line).await?;

        let model = insert_line(&txn, journal_id, line).await?;
        touch(&txn, journal).await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Replaces a line of an unposted journal.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound`, `PostedJournalLocked`, or a line validation
    /// error.
    #[instrument(skip(self, line))]
    pub async fn update_line(
        &self,
        line_id: JournalLineId,
        line: JournalLineInput,
    ) -> Result<journal_lines::Model, JournalError> {
        let txn = self.db.begin().await?;

        let (journal, existing) = find_line_with_journal(&txn, line_id).await?;
        LedgerService::validate_can_modify(JournalId::from_uuid(journal.id), journal.posted)?;
        validate_line(&txn, &line).await?;

        let mut active: journal_lines::ActiveModel = existing.into();
        active.account_id = Set(line.account_id.into_inner());
        active.label = Set(line.label);
        active.debit = Set(line.debit);
        active.credit = Set(line.credit);
        let model = active.update(&txn).await?;
        touch(&txn, journal).await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Deletes a line of an unposted journal.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` or `PostedJournalLocked`.
    #[instrument(skip(self))]
    pub async fn delete_line(&self, line_id: JournalLineId) -> Result<(), JournalError> {
        let txn = self.db.begin().await?;

        let (journal, existing) = find_line_with_journal(&txn, line_id).await?;
        LedgerService::validate_can_modify(JournalId::from_uuid(journal.id), journal.posted)?;

        existing.delete(&txn).await?;
        touch(&txn, journal).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Deletes an unposted journal and its lines.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotFound` or `PostedJournalLocked`.
    #[instrument(skip(self))]
    pub async fn delete_journal(&self, journal_id: JournalId) -> Result<(), JournalError> {
        let txn = self.db.begin().await?;

        let journal = find_journal(&txn, journal_id, true).await?;
        LedgerService::validate_can_modify(journal_id, journal.posted)?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalId.eq(journal_id.into_inner()))
            .exec(&txn)
            .await?;
        journal.delete(&txn).await?;

        txn.commit().await?;

        info!(%journal_id, "journal deleted");
        Ok(())
    }
}

/// Creates an unposted journal with its lines, using `conn`.
///
/// The number is allocated from the kind's sequence when not supplied.
/// Runs in its own transaction, or a savepoint when `conn` is one; nothing is
/// persisted (and no number consumed) if any check fails.
///
/// # Errors
///
/// See [`JournalRepository::create_journal`].
#[instrument(skip(conn, input), fields(date = %input.date, kind = %input.kind, lines = input.lines.len()))]
pub async fn create_journal_in<C: TransactionTrait>(
    conn: &C,
    input: CreateJournalInput,
) -> Result<JournalWithLines, JournalError> {
    LedgerService::validate_header(&input)?;

    let txn = conn.begin().await?;

    let accounts = load_accounts(&txn, input.lines.iter().map(|l| l.account_id)).await?;
    let totals = LedgerService::validate_lines(&input.lines, |id| {
        accounts.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
    })?;

    let number = match input.number {
        Some(number) => {
            ensure_number_free(&txn, &number).await?;
            number
        }
        None => {
            let allocation = allocate_number(
                &txn,
                ACCOUNTING_SCOPE,
                input.kind.sequence_code(),
                input.date,
                &input.kind.sequence_defaults(),
            )
            .await?;
            if allocation.number.chars().count() > NUMBER_MAX_LEN {
                return Err(LedgerError::FieldTooLong {
                    field: "number",
                    max: NUMBER_MAX_LEN,
                }
                .into());
            }
            allocation.number
        }
    };

    let journal_id = JournalId::new();
    let now = chrono::Utc::now().into();
    let journal = journals::ActiveModel {
        id: Set(journal_id.into_inner()),
        number: Set(number.clone()),
        kind: Set(input.kind.as_str().to_string()),
        date: Set(input.date),
        reference: Set(input.reference),
        description: Set(input.description),
        source_type: Set(input.source_type),
        source_ref: Set(input.source_ref),
        currency: Set(input.currency),
        posted: Set(false),
        posted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => JournalError::DuplicateNumber(number),
        _ => err.into(),
    })?;

    let mut lines = Vec::with_capacity(input.lines.len());
    for line in input.lines {
        lines.push(insert_line(&txn, journal_id, line).await?);
    }

    txn.commit().await?;

    info!(
        %journal_id,
        number = %journal.number,
        debit = %totals.debit,
        credit = %totals.credit,
        "journal created"
    );
    Ok(JournalWithLines::new(journal, lines))
}

/// Posts a journal using `conn`.
///
/// Checks, in order: not already posted, period open under `policy`, stored
/// lines balanced.
///
/// # Errors
///
/// See [`JournalRepository::post_journal`].
#[instrument(skip(conn))]
pub async fn post_journal_in<C: TransactionTrait>(
    conn: &C,
    journal_id: JournalId,
    policy: PostingPolicy,
) -> Result<JournalWithLines, JournalError> {
    let txn = conn.begin().await?;

    let journal = find_journal(&txn, journal_id, true).await?;
    let lines = find_lines(&txn, journal_id).await?;
    let totals = JournalTotals::from_amounts(lines.iter().map(|l| (l.debit, l.credit)));

    let period_locked = is_locked_in(&txn, journal.date, policy).await?;
    LedgerService::validate_for_posting(
        journal_id,
        journal.posted,
        journal.date,
        period_locked,
        &totals,
    )?;

    let now = chrono::Utc::now().into();
    let mut active: journals::ActiveModel = journal.into();
    active.posted = Set(true);
    active.posted_at = Set(Some(now));
    active.updated_at = Set(now);
    let journal = active.update(&txn).await?;

    txn.commit().await?;

    info!(%journal_id, number = %journal.number, amount = %totals.debit, "journal posted");
    Ok(JournalWithLines { journal, lines, totals })
}

/// Loads a journal with its lines, using `conn`.
///
/// # Errors
///
/// Returns `JournalNotFound` if it does not exist.
pub async fn get_journal_in<C: ConnectionTrait>(
    conn: &C,
    journal_id: JournalId,
) -> Result<JournalWithLines, JournalError> {
    let journal = find_journal(conn, journal_id, false).await?;
    let lines = find_lines(conn, journal_id).await?;
    Ok(JournalWithLines::new(journal, lines))
}

/// Lists journals created from a source document, oldest first, using `conn`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_by_source_in<C: ConnectionTrait>(
    conn: &C,
    source_type: &str,
    source_ref: &str,
) -> Result<Vec<journals::Model>, DbErr> {
    journals::Entity::find()
        .filter(journals::Column::SourceType.eq(source_type))
        .filter(journals::Column::SourceRef.eq(source_ref))
        .order_by_asc(journals::Column::Date)
        .order_by_asc(journals::Column::Id)
        .all(conn)
        .await
}

async fn find_journal<C: ConnectionTrait>(
    conn: &C,
    journal_id: JournalId,
    for_update: bool,
) -> Result<journals::Model, JournalError> {
    let mut query = journals::Entity::find_by_id(journal_id.into_inner());
    if for_update {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await?
        .ok_or(JournalError::Ledger(LedgerError::JournalNotFound(journal_id)))
}

async fn find_lines<C: ConnectionTrait>(
    conn: &C,
    journal_id: JournalId,
) -> Result<Vec<journal_lines::Model>, DbErr> {
    journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalId.eq(journal_id.into_inner()))
        .order_by_asc(journal_lines::Column::Id)
        .all(conn)
        .await
}

async fn find_line_with_journal<C: ConnectionTrait>(
    conn: &C,
    line_id: JournalLineId,
) -> Result<(journals::Model, journal_lines::Model), JournalError> {
    let line = journal_lines::Entity::find_by_id(line_id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::LineNotFound(line_id))?;
    let journal = find_journal(conn, JournalId::from_uuid(line.journal_id), true).await?;
    Ok((journal, line))
}

async fn ensure_number_free<C: ConnectionTrait>(conn: &C, number: &str) -> Result<(), JournalError> {
    let existing = journals::Entity::find()
        .filter(journals::Column::Number.eq(number))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Err(JournalError::DuplicateNumber(number.to_string()));
    }
    Ok(())
}

async fn load_accounts<C, I>(conn: &C, ids: I) -> Result<HashMap<AccountId, Account>, JournalError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = AccountId>,
{
    let ids: HashSet<Uuid> = ids.into_iter().map(AccountId::into_inner).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    models
        .iter()
        .map(|m| Ok((AccountId::from_uuid(m.id), m.to_domain()?)))
        .collect()
}

async fn validate_line<C: ConnectionTrait>(
    conn: &C,
    line: &JournalLineInput,
) -> Result<(), JournalError> {
    let accounts = load_accounts(conn, [line.account_id]).await?;
    LedgerService::validate_line(line, &|id| {
        accounts.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
    })?;
    Ok(())
}

async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    journal_id: JournalId,
    line: JournalLineInput,
) -> Result<journal_lines::Model, DbErr> {
    journal_lines::ActiveModel {
        id: Set(JournalLineId::new().into_inner()),
        journal_id: Set(journal_id.into_inner()),
        account_id: Set(line.account_id.into_inner()),
        label: Set(line.label),
        debit: Set(line.debit),
        credit: Set(line.credit),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(conn)
    .await
}

async fn touch<C: ConnectionTrait>(conn: &C, journal: journals::Model) -> Result<(), DbErr> {
    let mut active: journals::ActiveModel = journal.into();
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(conn).await?;
    Ok(())
}
