//! Sales-invoice posting integration tests.

mod common;

use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

use common::{YEAR, account, date, setup_db, transfer};
use freightledger_core::chart::AccountType;
use freightledger_core::ledger::{ACCOUNTING_SCOPE, JournalKind};
use freightledger_db::repositories::{
    AccountRepository, InvoicePostingService, JournalRepository, PeriodLockRepository,
    SalesInvoice, SequenceRepository,
};
use freightledger_shared::{
    AccountingSettings, AppError, DefaultAccounts, PostingPolicy, SettingsHandle,
};

async fn seed(db: &DatabaseConnection) {
    let repo = AccountRepository::new(db.clone());
    let receivables = account(&repo, "1200", "Receivables", AccountType::Asset, None).await;
    account(&repo, "1201", "AR - Customers", AccountType::Asset, Some(&receivables)).await;
    account(&repo, "2301", "VAT Output", AccountType::Liability, None).await;
    account(&repo, "4101", "Revenue - Ocean Freight", AccountType::Income, None).await;
}

fn handle(ar: Option<&str>) -> SettingsHandle {
    SettingsHandle::new(AccountingSettings {
        active_fiscal_year: YEAR,
        posting_policy: PostingPolicy::OpenIfMissing,
        default_accounts: DefaultAccounts {
            ar: ar.map(str::to_string),
            sales: Some("4101".to_string()),
            tax: Some("2301".to_string()),
            ..Default::default()
        },
    })
}

fn invoice(number: &str, tax: rust_decimal::Decimal) -> SalesInvoice {
    SalesInvoice {
        number: number.to_string(),
        date: date(2026, 2, 14),
        subtotal: dec!(1000000),
        tax,
        currency: Some("IDR".to_string()),
    }
}

#[tokio::test]
async fn test_invoice_with_tax_posts_three_lines() {
    let db = setup_db().await;
    seed(&db).await;
    let service = InvoicePostingService::new(db.clone(), handle(Some("1201")));

    let posted = service
        .post_sales_invoice(&invoice("INV-0226-0001", dec!(110000)))
        .await
        .unwrap();

    assert!(posted.journal.posted);
    assert_eq!(posted.journal.source_type.as_deref(), Some("INV"));
    assert_eq!(posted.journal.source_ref.as_deref(), Some("INV-0226-0001"));
    assert_eq!(posted.journal.reference, "INV-0226-0001");
    assert_eq!(posted.journal.number, "JV-0226-0001");
    assert_eq!(posted.lines.len(), 3);
    assert_eq!(posted.lines[0].debit, dec!(1110000));
    assert_eq!(posted.lines[1].credit, dec!(1000000));
    assert_eq!(posted.lines[2].credit, dec!(110000));
    assert_eq!(posted.totals.debit, dec!(1110000));
    assert!(posted.totals.is_balanced);

    let journals = JournalRepository::new(db, handle(Some("1201")));
    let by_source = journals.find_by_source("INV", "INV-0226-0001").await.unwrap();
    assert_eq!(by_source.len(), 1);
    assert_eq!(by_source[0].id, posted.journal.id);
}

#[tokio::test]
async fn test_invoice_without_tax_skips_tax_line() {
    let db = setup_db().await;
    seed(&db).await;
    let service = InvoicePostingService::new(db, handle(Some("1201")));

    let posted = service
        .post_sales_invoice(&invoice("INV-0226-0002", dec!(0)))
        .await
        .unwrap();

    assert_eq!(posted.lines.len(), 2);
    assert_eq!(posted.totals.debit, dec!(1000000));
}

#[tokio::test]
async fn test_invoice_requires_usable_ar_account() {
    let db = setup_db().await;
    seed(&db).await;

    let missing = InvoicePostingService::new(db.clone(), handle(None));
    let err = missing
        .post_sales_invoice(&invoice("INV-1", dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));

    let group = InvoicePostingService::new(db, handle(Some("1200")));
    let err = group
        .post_sales_invoice(&invoice("INV-2", dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Configuration(ref msg) if msg.contains("not postable")));
}

#[tokio::test]
async fn test_invoice_in_locked_period_leaves_nothing_behind() {
    let db = setup_db().await;
    seed(&db).await;
    let locks = PeriodLockRepository::new(db.clone());
    locks.set_lock(2026, 2, true).await.unwrap();
    let service = InvoicePostingService::new(db.clone(), handle(Some("1201")));

    let err = service
        .post_sales_invoice(&invoice("INV-3", dec!(110000)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(ref msg) if msg.contains("2026-02")));

    let journals = JournalRepository::new(db, handle(Some("1201")));
    assert!(journals.find_by_source("INV", "INV-3").await.unwrap().is_empty());

    // Rolled back together with the journal, so the number is reused.
    locks.set_lock(2026, 2, false).await.unwrap();
    let posted = service
        .post_sales_invoice(&invoice("INV-3", dec!(110000)))
        .await
        .unwrap();
    assert_eq!(posted.journal.number, "JV-0226-0001");
    assert_eq!(journals.find_by_source("INV", "INV-3").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reposting_invoice_returns_existing_journal() {
    let db = setup_db().await;
    seed(&db).await;
    let service = InvoicePostingService::new(db.clone(), handle(Some("1201")));
    let inv = invoice("INV-0226-0007", dec!(110000));

    let first = service.post_sales_invoice(&inv).await.unwrap();
    let second = service.post_sales_invoice(&inv).await.unwrap();

    assert_eq!(second.journal.id, first.journal.id);
    assert_eq!(second.journal.number, "JV-0226-0001");
    assert_eq!(second.lines.len(), 3);

    let journals = JournalRepository::new(db.clone(), handle(Some("1201")));
    assert_eq!(journals.find_by_source("INV", "INV-0226-0007").await.unwrap().len(), 1);
    let next = SequenceRepository::new(db)
        .peek_next(ACCOUNTING_SCOPE, JournalKind::General.sequence_code(), date(2026, 2, 20))
        .await
        .unwrap();
    assert_eq!(next, "JV-0226-0002");
}

#[tokio::test]
async fn test_invoice_with_unposted_journal_conflicts() {
    let db = setup_db().await;
    seed(&db).await;
    let accounts = AccountRepository::new(db.clone());
    let ar = accounts.find_by_code(YEAR, "1201").await.unwrap().unwrap();
    let sales = accounts.find_by_code(YEAR, "4101").await.unwrap().unwrap();

    let journals = JournalRepository::new(db.clone(), handle(Some("1201")));
    let mut draft = transfer(date(2026, 2, 14), &ar, &sales, dec!(1000000));
    draft.source_type = Some("INV".to_string());
    draft.source_ref = Some("INV-5".to_string());
    let draft = journals.create_journal(draft).await.unwrap();

    let service = InvoicePostingService::new(db, handle(Some("1201")));
    let err = service
        .post_sales_invoice(&invoice("INV-5", dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains(&draft.journal.number)));

    let by_source = journals.find_by_source("INV", "INV-5").await.unwrap();
    assert_eq!(by_source.len(), 1);
    assert!(!by_source[0].posted);
}

#[tokio::test]
async fn test_negative_invoice_amount_is_invalid() {
    let db = setup_db().await;
    seed(&db).await;
    let service = InvoicePostingService::new(db, handle(Some("1201")));

    let mut bad = invoice("INV-4", dec!(0));
    bad.subtotal = dec!(-10);
    let err = service.post_sales_invoice(&bad).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let refund_tax = invoice("INV-6", dec!(-110000));
    let err = service.post_sales_invoice(&refund_tax).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
