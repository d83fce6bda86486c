//! Period lock repository.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use freightledger_core::fiscal::{PeriodService, YearMonth};
use freightledger_core::ledger::LedgerError;
use freightledger_shared::{AppError, PostingPolicy};

use super::classify;
use crate::entities::period_locks;

/// Error types for period lock operations.
#[derive(Debug, thiserror::Error)]
pub enum PeriodLockError {
    /// Invalid period.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PeriodLockError> for AppError {
    fn from(err: PeriodLockError) -> Self {
        match err {
            PeriodLockError::Ledger(inner) => classify(inner.http_status_code(), inner.to_string()),
            PeriodLockError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

async fn find_row<C: ConnectionTrait>(
    conn: &C,
    period: YearMonth,
) -> Result<Option<period_locks::Model>, DbErr> {
    period_locks::Entity::find()
        .filter(period_locks::Column::Year.eq(period.year()))
        .filter(period_locks::Column::Month.eq(month_column(period)))
        .one(conn)
        .await
}

fn month_column(period: YearMonth) -> i32 {
    i32::try_from(period.month()).unwrap_or_default()
}

/// Resolves whether the period of `date` is locked, using `conn`.
///
/// A missing row is resolved by `policy`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn is_locked_in<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    policy: PostingPolicy,
) -> Result<bool, DbErr> {
    let stored = find_row(conn, YearMonth::from_date(date))
        .await?
        .map(|row| row.is_locked);
    Ok(PeriodService::is_locked(stored, policy))
}

/// Period lock repository.
#[derive(Debug, Clone)]
pub struct PeriodLockRepository {
    db: DatabaseConnection,
}

impl PeriodLockRepository {
    /// Creates a new period lock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the lock row for a month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if the month is outside 1-12.
    pub async fn find(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Option<period_locks::Model>, PeriodLockError> {
        let period = YearMonth::new(year, month)?;
        Ok(find_row(&self.db, period).await?)
    }

    /// Returns true if journals dated `date` cannot be posted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_locked(
        &self,
        date: NaiveDate,
        policy: PostingPolicy,
    ) -> Result<bool, PeriodLockError> {
        Ok(is_locked_in(&self.db, date, policy).await?)
    }

    /// Creates or updates the lock row for a month.
    ///
    /// Locking stamps `locked_at`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if the month is outside 1-12.
    #[instrument(skip(self))]
    pub async fn set_lock(
        &self,
        year: i32,
        month: u32,
        locked: bool,
    ) -> Result<period_locks::Model, PeriodLockError> {
        let period = YearMonth::new(year, month)?;
        let txn = self.db.begin().await?;
        let model = upsert(&txn, period, |_| locked).await?;
        txn.commit().await?;

        info!(%period, locked = model.is_locked, "period lock set");
        Ok(model)
    }

    /// Flips the lock of a month; a month without a row becomes locked.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if the month is outside 1-12.
    #[instrument(skip(self))]
    pub async fn toggle(&self, year: i32, month: u32) -> Result<period_locks::Model, PeriodLockError> {
        let period = YearMonth::new(year, month)?;
        let txn = self.db.begin().await?;
        let model = upsert(&txn, period, |current| current.is_none_or(|locked| !locked)).await?;
        txn.commit().await?;

        info!(%period, locked = model.is_locked, "period lock toggled");
        Ok(model)
    }

    /// Lists all lock rows, newest period first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<period_locks::Model>, PeriodLockError> {
        Ok(period_locks::Entity::find()
            .order_by_desc(period_locks::Column::Year)
            .order_by_desc(period_locks::Column::Month)
            .all(&self.db)
            .await?)
    }
}

/// Writes the lock flag chosen by `decide` from the current flag.
async fn upsert<C, F>(conn: &C, period: YearMonth, decide: F) -> Result<period_locks::Model, DbErr>
where
    C: ConnectionTrait,
    F: FnOnce(Option<bool>) -> bool,
{
    let now = chrono::Utc::now().into();

    match find_row(conn, period).await? {
        Some(row) => {
            let locked = decide(Some(row.is_locked));
            let mut active: period_locks::ActiveModel = row.into();
            active.is_locked = Set(locked);
            if locked {
                active.locked_at = Set(Some(now));
            }
            active.updated_at = Set(now);
            active.update(conn).await
        }
        None => {
            let locked = decide(None);
            period_locks::ActiveModel {
                id: Set(Uuid::now_v7()),
                year: Set(period.year()),
                month: Set(month_column(period)),
                is_locked: Set(locked),
                locked_at: Set(locked.then_some(now)),
                updated_at: Set(now),
            }
            .insert(conn)
            .await
        }
    }
}
