//! Ledger report integration tests.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{YEAR, account, date, post_transfer, settings, setup_db, transfer};
use freightledger_core::chart::{Account, AccountType};
use freightledger_core::reports::{ReportError, ReportPeriod};
use freightledger_db::repositories::{
    AccountRepository, JournalRepository, ReportQueryError, ReportRepository,
};
use freightledger_shared::{PostingPolicy, types::AccountId};
use sea_orm::DatabaseConnection;

struct Chart {
    assets: Account,
    cash: Account,
    bank: Account,
    revenue: Account,
    cogs: Account,
}

async fn freight_chart(db: &DatabaseConnection) -> Chart {
    let repo = AccountRepository::new(db.clone());
    let assets = account(&repo, "1000", "Assets", AccountType::Asset, None).await;
    let cash = account(&repo, "1101", "Cash - Petty Cash", AccountType::Asset, Some(&assets)).await;
    let bank = account(&repo, "1102", "Cash - Bank", AccountType::Asset, Some(&assets)).await;
    let income = account(&repo, "4000", "Revenue", AccountType::Income, None).await;
    let revenue = account(
        &repo,
        "4101",
        "Revenue - Ocean Freight",
        AccountType::Income,
        Some(&income),
    )
    .await;
    let cogs = account(
        &repo,
        "5101",
        "COGS - Ocean Freight Cost",
        AccountType::Expense,
        None,
    )
    .await;
    Chart {
        assets,
        cash,
        bank,
        revenue,
        cogs,
    }
}

fn february(posted_only: bool) -> ReportPeriod {
    ReportPeriod::new(date(2026, 2, 1), date(2026, 2, 28), posted_only).unwrap()
}

#[tokio::test]
async fn test_trial_balance_rolls_up_and_balances() {
    let db = setup_db().await;
    let chart = freight_chart(&db).await;
    let journals = JournalRepository::new(db.clone(), settings(PostingPolicy::OpenIfMissing));
    let reports = ReportRepository::new(db);

    post_transfer(&journals, date(2026, 2, 3), &chart.cash, &chart.revenue, dec!(1000000)).await;
    post_transfer(&journals, date(2026, 2, 9), &chart.cogs, &chart.bank, dec!(250000)).await;

    let report = reports.trial_balance(YEAR, february(true)).await.unwrap();

    let types: Vec<AccountType> = report.sections.iter().map(|s| s.account_type).collect();
    assert_eq!(
        types,
        vec![AccountType::Asset, AccountType::Income, AccountType::Expense]
    );

    let assets = report.row("1000").unwrap();
    assert_eq!(assets.account_id, chart.assets.id);
    assert_eq!(assets.level, 0);
    assert!(!assets.is_postable);
    assert_eq!(assets.debit, dec!(1000000));
    assert_eq!(assets.credit, dec!(250000));
    assert_eq!(assets.balance, dec!(750000));

    let cash = report.row("1101").unwrap();
    assert_eq!(cash.level, 1);
    assert_eq!(cash.balance, dec!(1000000));
    assert_eq!(report.row("1102").unwrap().balance, dec!(-250000));
    assert_eq!(report.row("4000").unwrap().balance, dec!(-1000000));
    assert_eq!(report.row("5101").unwrap().balance, dec!(250000));

    let codes: Vec<&str> = report.sections[0].rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["1000", "1101", "1102"]);

    assert_eq!(report.totals.total_debit, dec!(1250000));
    assert_eq!(report.totals.total_credit, dec!(1250000));
    assert_eq!(report.totals.difference, Decimal::ZERO);
    assert!(report.totals.is_balanced);

    let root_sum: Decimal = report
        .rows()
        .filter(|r| r.level == 0)
        .map(|r| r.balance)
        .sum();
    assert_eq!(root_sum, Decimal::ZERO);
}

#[tokio::test]
async fn test_trial_balance_posted_only_and_range() {
    let db = setup_db().await;
    let chart = freight_chart(&db).await;
    let journals = JournalRepository::new(db.clone(), settings(PostingPolicy::OpenIfMissing));
    let reports = ReportRepository::new(db);

    post_transfer(&journals, date(2026, 2, 3), &chart.cash, &chart.revenue, dec!(100)).await;
    post_transfer(&journals, date(2026, 3, 3), &chart.cash, &chart.revenue, dec!(40)).await;
    journals
        .create_journal(transfer(date(2026, 2, 20), &chart.cash, &chart.revenue, dec!(7)))
        .await
        .unwrap();

    let posted = reports.trial_balance(YEAR, february(true)).await.unwrap();
    assert_eq!(posted.row("1101").unwrap().debit, dec!(100));

    let all = reports.trial_balance(YEAR, february(false)).await.unwrap();
    assert_eq!(all.row("1101").unwrap().debit, dec!(107));
    assert!(all.totals.is_balanced);

    let other_year = reports.trial_balance(YEAR + 1, february(false)).await.unwrap();
    assert!(other_year.sections.is_empty());
    assert!(other_year.totals.is_balanced);
}

#[tokio::test]
async fn test_general_ledger_running_balance() {
    let db = setup_db().await;
    let chart = freight_chart(&db).await;
    let journals = JournalRepository::new(db.clone(), settings(PostingPolicy::OpenIfMissing));
    let reports = ReportRepository::new(db);

    post_transfer(&journals, date(2026, 1, 15), &chart.cash, &chart.revenue, dec!(500)).await;
    let first = post_transfer(&journals, date(2026, 2, 2), &chart.cash, &chart.revenue, dec!(300)).await;
    post_transfer(&journals, date(2026, 2, 5), &chart.cogs, &chart.cash, dec!(120)).await;
    post_transfer(&journals, date(2026, 3, 1), &chart.cash, &chart.revenue, dec!(999)).await;

    let ledger = reports
        .general_ledger(chart.cash.id, february(true))
        .await
        .unwrap();

    assert_eq!(ledger.code, "1101");
    assert_eq!(ledger.opening_balance, dec!(500));
    assert_eq!(ledger.rows.len(), 2);
    assert_eq!(ledger.rows[0].reference, first.journal.number);
    assert_eq!(ledger.rows[0].balance, dec!(800));
    assert_eq!(ledger.rows[1].credit, dec!(120));
    assert_eq!(ledger.rows[1].balance, dec!(680));
    assert_eq!(ledger.total_debit, dec!(300));
    assert_eq!(ledger.total_credit, dec!(120));
    assert_eq!(
        ledger.closing_balance,
        ledger.opening_balance + ledger.total_debit - ledger.total_credit
    );
}

#[tokio::test]
async fn test_general_ledger_unknown_account() {
    let db = setup_db().await;
    let reports = ReportRepository::new(db);

    let missing = AccountId::new();
    let err = reports
        .general_ledger(missing, february(false))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReportQueryError::Report(ReportError::AccountNotFound(id)) if id == missing
    ));
}
