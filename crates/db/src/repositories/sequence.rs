//! Number sequence repository.
//!
//! Allocation runs under [`with_sequence_lock`], the only explicit row lock in
//! the ledger. It takes `SELECT ... FOR UPDATE` on the `(scope, code)` row, so
//! callers of the same key queue up while other keys proceed. Allocating inside
//! an outer transaction (journal creation) nests as a savepoint, so a rolled
//! back journal also rolls back its number.
//!
//! A reset moves the counter of the period being left into
//! `number_sequence_periods`; back-dated documents continue from there.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait, sea_query::OnConflict,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use freightledger_core::numbering::{
    Allocation, ClosedPeriod, Counters, NumberingService, PeriodKey, PeriodPosition, ResetPolicy,
    SequenceConfig, SequenceFormatError, SequenceState,
};
use freightledger_shared::AppError;

use super::classify;
use crate::entities::{number_sequence_periods, number_sequences};

/// Error types for sequence operations.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// Sequence configuration rejected.
    #[error(transparent)]
    Format(#[from] SequenceFormatError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SequenceError> for AppError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::Format(inner) => classify(inner.http_status_code(), inner.to_string()),
            SequenceError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

/// Runs `update` against the locked `(scope, code)` row and persists the
/// counters it returns.
///
/// The row is created from `defaults` (period = `as_of`) if it does not exist.
/// When `as_of` falls in a period the sequence has already moved past, the
/// stored counter of that period is loaded into [`Counters::closed`].
/// `conn` may be a connection or an open transaction.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn with_sequence_lock<C, T, F>(
    conn: &C,
    scope: &str,
    code: &str,
    as_of: NaiveDate,
    defaults: &SequenceConfig,
    update: F,
) -> Result<T, SequenceError>
where
    C: TransactionTrait,
    F: FnOnce(&SequenceConfig, &Counters) -> (Counters, T),
{
    let txn = conn.begin().await?;

    let starting = SequenceState::starting(as_of);
    number_sequences::Entity::insert(number_sequences::ActiveModel {
        id: Set(Uuid::now_v7()),
        scope: Set(scope.to_string()),
        code: Set(code.to_string()),
        name: Set(code.to_string()),
        prefix: Set(defaults.prefix.clone()),
        format: Set(defaults.format.clone()),
        reset: Set(defaults.reset.as_str().to_string()),
        padding: Set(defaults.padding),
        last_number: Set(0),
        period_year: Set(starting.period_year),
        period_month: Set(starting.period_month.and_then(|m| i32::try_from(m).ok())),
        updated_at: Set(chrono::Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([number_sequences::Column::Scope, number_sequences::Column::Code])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    let row = number_sequences::Entity::find()
        .filter(number_sequences::Column::Scope.eq(scope))
        .filter(number_sequences::Column::Code.eq(code))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("number sequence {scope}/{code}")))?;

    let (config, counters) = load_counters(&txn, &row, as_of).await?;
    let (next, out) = update(&config, &counters);

    if next.current != counters.current {
        number_sequences::ActiveModel {
            id: Unchanged(row.id),
            last_number: Set(next.current.last_number),
            period_year: Set(next.current.period_year),
            period_month: Set(next.current.period_month.and_then(|m| i32::try_from(m).ok())),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .update(&txn)
        .await?;
    }
    if let Some(closed) = next.closed.filter(|closed| Some(*closed) != counters.closed) {
        save_closed_period(&txn, row.id, closed).await?;
    }

    txn.commit().await?;
    Ok(out)
}

/// Allocates the next number of a sequence.
///
/// A stored template that no longer parses is replaced by the default
/// template; the allocation still succeeds and a warning is logged.
///
/// # Errors
///
/// Returns an error if the database fails.
#[instrument(skip(conn, defaults))]
pub async fn allocate_number<C: TransactionTrait>(
    conn: &C,
    scope: &str,
    code: &str,
    as_of: NaiveDate,
    defaults: &SequenceConfig,
) -> Result<Allocation, SequenceError> {
    let allocation = with_sequence_lock(conn, scope, code, as_of, defaults, |config, counters| {
        let allocation = NumberingService::advance(config, counters, as_of);
        (allocation.counters, allocation)
    })
    .await?;

    if let Some(err) = &allocation.fallback {
        warn!(scope, code, error = %err, "invalid sequence format, using default template");
    }
    info!(scope, code, number = %allocation.number, "number allocated");

    Ok(allocation)
}

fn to_domain(row: &number_sequences::Model) -> (SequenceConfig, SequenceState) {
    let reset = row.reset.parse::<ResetPolicy>().unwrap_or_else(|err| {
        warn!(scope = %row.scope, code = %row.code, %err, "unknown reset policy, using monthly");
        ResetPolicy::default()
    });

    let config = SequenceConfig {
        prefix: row.prefix.clone(),
        format: row.format.clone(),
        reset,
        padding: row.padding,
    };
    let state = SequenceState {
        last_number: row.last_number,
        period_year: row.period_year,
        period_month: row.period_month.and_then(|m| u32::try_from(m).ok()),
    };
    (config, state)
}

/// Reads the counters an allocation on `as_of` would use.
async fn load_counters<C: ConnectionTrait>(
    conn: &C,
    row: &number_sequences::Model,
    as_of: NaiveDate,
) -> Result<(SequenceConfig, Counters), DbErr> {
    let (config, current) = to_domain(row);

    let closed = match (config.reset.position(&current, as_of), config.reset.period_key(as_of)) {
        (PeriodPosition::Earlier, Some(key)) => find_closed_period(conn, row.id, key)
            .await?
            .map(|period| ClosedPeriod {
                key,
                last_number: period.last_number,
            }),
        _ => None,
    };

    Ok((config, Counters { current, closed }))
}

fn month_column(key: PeriodKey) -> i32 {
    key.month.and_then(|m| i32::try_from(m).ok()).unwrap_or(0)
}

async fn find_closed_period<C: ConnectionTrait>(
    conn: &C,
    sequence_id: Uuid,
    key: PeriodKey,
) -> Result<Option<number_sequence_periods::Model>, DbErr> {
    number_sequence_periods::Entity::find()
        .filter(number_sequence_periods::Column::SequenceId.eq(sequence_id))
        .filter(number_sequence_periods::Column::PeriodYear.eq(key.year))
        .filter(number_sequence_periods::Column::PeriodMonth.eq(month_column(key)))
        .one(conn)
        .await
}

async fn save_closed_period<C: ConnectionTrait>(
    conn: &C,
    sequence_id: Uuid,
    closed: ClosedPeriod,
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().into();

    match find_closed_period(conn, sequence_id, closed.key).await? {
        Some(row) => {
            let mut active: number_sequence_periods::ActiveModel = row.into();
            active.last_number = Set(closed.last_number);
            active.updated_at = Set(now);
            active.update(conn).await?;
        }
        None => {
            number_sequence_periods::ActiveModel {
                id: Set(Uuid::now_v7()),
                sequence_id: Set(sequence_id),
                period_year: Set(closed.key.year),
                period_month: Set(month_column(closed.key)),
                last_number: Set(closed.last_number),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

/// Number sequence repository.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Allocates the next number, creating the sequence with the default
    /// settings on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn next_number(
        &self,
        scope: &str,
        code: &str,
        as_of: NaiveDate,
    ) -> Result<String, SequenceError> {
        self.next_number_with_defaults(scope, code, as_of, &SequenceConfig::default())
            .await
    }

    /// Allocates the next number, creating the sequence from `defaults` on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn next_number_with_defaults(
        &self,
        scope: &str,
        code: &str,
        as_of: NaiveDate,
        defaults: &SequenceConfig,
    ) -> Result<String, SequenceError> {
        let allocation = allocate_number(&self.db, scope, code, as_of, defaults).await?;
        Ok(allocation.number)
    }

    /// Creates or reconfigures a sequence.
    ///
    /// The counter is left alone; a new row starts at zero with no period, so
    /// its first allocation opens a period.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Format` if the configuration does not validate.
    #[instrument(skip(self, config), fields(format = %config.format))]
    pub async fn configure(
        &self,
        scope: &str,
        code: &str,
        name: &str,
        config: &SequenceConfig,
    ) -> Result<number_sequences::Model, SequenceError> {
        config.validate()?;

        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        let existing = number_sequences::Entity::find()
            .filter(number_sequences::Column::Scope.eq(scope))
            .filter(number_sequences::Column::Code.eq(code))
            .lock_exclusive()
            .one(&txn)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut active: number_sequences::ActiveModel = row.into();
                active.name = Set(name.to_string());
                active.prefix = Set(config.prefix.clone());
                active.format = Set(config.format.clone());
                active.reset = Set(config.reset.as_str().to_string());
                active.padding = Set(config.padding);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                number_sequences::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    scope: Set(scope.to_string()),
                    code: Set(code.to_string()),
                    name: Set(name.to_string()),
                    prefix: Set(config.prefix.clone()),
                    format: Set(config.format.clone()),
                    reset: Set(config.reset.as_str().to_string()),
                    padding: Set(config.padding),
                    last_number: Set(0),
                    period_year: Set(None),
                    period_month: Set(None),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;

        info!(scope, code, "sequence configured");
        Ok(model)
    }

    /// Renders the number the next allocation would produce, without
    /// advancing the counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn peek_next(
        &self,
        scope: &str,
        code: &str,
        as_of: NaiveDate,
    ) -> Result<String, SequenceError> {
        let (config, counters) = match self.find(scope, code).await? {
            Some(row) => load_counters(&self.db, &row, as_of).await?,
            None => (SequenceConfig::default(), SequenceState::starting(as_of).into()),
        };
        Ok(NumberingService::advance(&config, &counters, as_of).number)
    }

    /// Renders a sample number for a configuration.
    ///
    /// # Errors
    ///
    /// Returns `SequenceFormatError` if the configuration does not validate.
    pub fn preview(
        config: &SequenceConfig,
        as_of: NaiveDate,
        seq: i64,
    ) -> Result<String, SequenceFormatError> {
        NumberingService::preview(config, as_of, seq)
    }

    /// Finds a sequence row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find(
        &self,
        scope: &str,
        code: &str,
    ) -> Result<Option<number_sequences::Model>, SequenceError> {
        Ok(number_sequences::Entity::find()
            .filter(number_sequences::Column::Scope.eq(scope))
            .filter(number_sequences::Column::Code.eq(code))
            .one(&self.db)
            .await?)
    }

    /// Current counter of a sequence for the period of `as_of`: the stored
    /// counter of that period, or zero if the sequence does not exist or
    /// would reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn current_value(
        &self,
        scope: &str,
        code: &str,
        as_of: NaiveDate,
    ) -> Result<i64, SequenceError> {
        let Some(row) = self.find(scope, code).await? else {
            return Ok(0);
        };
        let (config, counters) = load_counters(&self.db, &row, as_of).await?;

        Ok(match config.reset.position(&counters.current, as_of) {
            PeriodPosition::Current => counters.current.last_number,
            PeriodPosition::Later => 0,
            PeriodPosition::Earlier => counters.closed.map_or(0, |closed| closed.last_number),
        })
    }
}
