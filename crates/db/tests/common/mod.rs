//! Shared fixtures for database integration tests.
//!
//! Every test gets its own in-memory SQLite database with all migrations
//! applied.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};

use freightledger_core::chart::{Account, AccountType};
use freightledger_core::ledger::{CreateJournalInput, JournalLineInput};
use freightledger_db::migration::{Migrator, MigratorTrait};
use freightledger_db::repositories::{
    AccountRepository, CreateAccountInput, JournalRepository, JournalWithLines,
};
use freightledger_shared::{AccountingSettings, PostingPolicy, SettingsHandle};

/// Chart year used by the fixtures.
pub const YEAR: i32 = 2026;

/// Connects to a fresh in-memory database and runs the migrations.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn settings(policy: PostingPolicy) -> SettingsHandle {
    SettingsHandle::new(AccountingSettings {
        active_fiscal_year: YEAR,
        posting_policy: policy,
        ..Default::default()
    })
}

/// Creates an active account in the fixture chart year.
pub async fn account(
    repo: &AccountRepository,
    code: &str,
    name: &str,
    account_type: AccountType,
    parent: Option<&Account>,
) -> Account {
    let mut input = CreateAccountInput::new(YEAR, code, name, account_type);
    if let Some(parent) = parent {
        input = input.under(parent.id);
    }
    repo.create_account(input)
        .await
        .expect("Failed to create account")
}

/// Cash 1101 (asset) and Revenue 4101 (income).
pub async fn cash_and_revenue(db: &DatabaseConnection) -> (Account, Account) {
    let repo = AccountRepository::new(db.clone());
    let cash = account(&repo, "1101", "Cash - Petty Cash", AccountType::Asset, None).await;
    let revenue = account(
        &repo,
        "4101",
        "Revenue - Ocean Freight",
        AccountType::Income,
        None,
    )
    .await;
    (cash, revenue)
}

/// A two-line journal moving `amount` from `credit` to `debit`.
pub fn transfer(
    on: NaiveDate,
    debit: &Account,
    credit: &Account,
    amount: Decimal,
) -> CreateJournalInput {
    CreateJournalInput::new(
        on,
        format!("{} / {}", debit.code, credit.code),
        vec![
            JournalLineInput::debit(debit.id, amount, ""),
            JournalLineInput::credit(credit.id, amount, ""),
        ],
    )
}

/// Creates and posts a two-line journal.
pub async fn post_transfer(
    journals: &JournalRepository,
    on: NaiveDate,
    debit: &Account,
    credit: &Account,
    amount: Decimal,
) -> JournalWithLines {
    let created = journals
        .create_journal(transfer(on, debit, credit, amount))
        .await
        .expect("Failed to create journal");
    journals
        .post_journal(created.id())
        .await
        .expect("Failed to post journal")
}
