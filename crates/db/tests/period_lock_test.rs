//! Period lock integration tests.

mod common;

use rust_decimal_macros::dec;

use common::{cash_and_revenue, date, settings, setup_db, transfer};
use freightledger_core::ledger::LedgerError;
use freightledger_db::repositories::{
    JournalError, JournalRepository, PeriodLockError, PeriodLockRepository,
};
use freightledger_shared::{AccountingSettings, AppError, PostingPolicy};

#[tokio::test]
async fn test_missing_row_follows_policy() {
    let db = setup_db().await;
    let locks = PeriodLockRepository::new(db);
    let on = date(2026, 2, 10);

    assert!(!locks.is_locked(on, PostingPolicy::OpenIfMissing).await.unwrap());
    assert!(locks.is_locked(on, PostingPolicy::StrictRequire).await.unwrap());

    locks.set_lock(2026, 2, false).await.unwrap();
    assert!(!locks.is_locked(on, PostingPolicy::OpenIfMissing).await.unwrap());
    assert!(!locks.is_locked(on, PostingPolicy::StrictRequire).await.unwrap());

    locks.set_lock(2026, 2, true).await.unwrap();
    assert!(locks.is_locked(on, PostingPolicy::OpenIfMissing).await.unwrap());
}

#[tokio::test]
async fn test_set_lock_upserts() {
    let db = setup_db().await;
    let locks = PeriodLockRepository::new(db);

    let created = locks.set_lock(2026, 3, true).await.unwrap();
    assert!(created.is_locked);
    assert!(created.locked_at.is_some());

    let opened = locks.set_lock(2026, 3, false).await.unwrap();
    assert_eq!(opened.id, created.id);
    assert!(!opened.is_locked);

    let found = locks.find(2026, 3).await.unwrap().unwrap();
    assert!(!found.is_locked);
    assert!(locks.find(2026, 4).await.unwrap().is_none());
}

#[tokio::test]
async fn test_toggle() {
    let db = setup_db().await;
    let locks = PeriodLockRepository::new(db);

    let first = locks.toggle(2026, 5).await.unwrap();
    assert!(first.is_locked);

    let second = locks.toggle(2026, 5).await.unwrap();
    assert!(!second.is_locked);
    assert_eq!(second.id, first.id);

    let third = locks.toggle(2026, 5).await.unwrap();
    assert!(third.is_locked);
}

#[tokio::test]
async fn test_list_newest_first() {
    let db = setup_db().await;
    let locks = PeriodLockRepository::new(db);

    locks.set_lock(2025, 12, true).await.unwrap();
    locks.set_lock(2026, 2, true).await.unwrap();
    locks.set_lock(2026, 1, false).await.unwrap();

    let periods: Vec<(i32, i32)> = locks
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.year, row.month))
        .collect();
    assert_eq!(periods, vec![(2026, 2), (2026, 1), (2025, 12)]);
}

#[tokio::test]
async fn test_invalid_month_rejected() {
    let db = setup_db().await;
    let locks = PeriodLockRepository::new(db);

    for month in [0, 13] {
        let err = locks.set_lock(2026, month, true).await.unwrap_err();
        assert!(matches!(
            err,
            PeriodLockError::Ledger(LedgerError::InvalidPeriod { year: 2026, .. })
        ));
    }
    let err = locks.toggle(2026, 13).await.unwrap_err();
    assert!(matches!(AppError::from(err), AppError::Validation(_)));
    assert!(locks.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_posting_into_locked_period_fails() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let locks = PeriodLockRepository::new(db.clone());
    let journals = JournalRepository::new(db.clone(), settings(PostingPolicy::OpenIfMissing));

    let created = journals
        .create_journal(transfer(date(2026, 2, 10), &cash, &revenue, dec!(1000)))
        .await
        .unwrap();
    locks.set_lock(2026, 2, true).await.unwrap();

    let err = journals.post_journal(created.id()).await.unwrap_err();
    assert_eq!(err.to_string(), "Period 2026-02 is locked. Cannot post journal.");
    assert!(matches!(
        err,
        JournalError::Ledger(LedgerError::PeriodLocked(p)) if p.year() == 2026 && p.month() == 2
    ));
    assert!(!journals.get_journal(created.id()).await.unwrap().journal.posted);

    locks.toggle(2026, 2).await.unwrap();
    let posted = journals.post_journal(created.id()).await.unwrap();
    assert!(posted.journal.posted);
}

#[tokio::test]
async fn test_strict_policy_follows_settings_reload() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let handle = settings(PostingPolicy::StrictRequire);
    let journals = JournalRepository::new(db.clone(), handle.clone());

    let created = journals
        .create_journal(transfer(date(2026, 6, 1), &cash, &revenue, dec!(75)))
        .await
        .unwrap();

    let err = journals.post_journal(created.id()).await.unwrap_err();
    assert!(matches!(AppError::from(err), AppError::BusinessRule(_)));

    handle.replace(AccountingSettings {
        posting_policy: PostingPolicy::OpenIfMissing,
        ..(*handle.current()).clone()
    });

    let posted = journals.post_journal(created.id()).await.unwrap();
    assert!(posted.journal.posted);
}
