//! Sales-invoice posting.
//!
//! Turns an issued sales invoice into a posted journal using the configured
//! default accounts:
//!
//! | Line  | Account              | Amount           |
//! |-------|----------------------|------------------|
//! | Debit | `ar`                 | subtotal + tax   |
//! | Credit| `sales`              | subtotal         |
//! | Credit| `tax` (if tax > 0)   | tax              |

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{info, instrument};

use freightledger_core::ledger::{CreateJournalInput, JournalKind, JournalLineInput};
use freightledger_shared::{AppError, AppResult, SettingsHandle, types::JournalId};

use super::account::AccountRepository;
use super::journal::{
    JournalError, JournalWithLines, create_journal_in, find_by_source_in, get_journal_in,
    post_journal_in,
};

/// Source type stamped on invoice journals.
pub const INVOICE_SOURCE_TYPE: &str = "INV";

/// An issued sales invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesInvoice {
    /// Invoice number.
    pub number: String,
    /// Invoice date.
    pub date: NaiveDate,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Output tax.
    pub tax: Decimal,
    /// ISO currency code.
    pub currency: Option<String>,
}

impl SalesInvoice {
    /// Amount receivable from the customer.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal + self.tax
    }
}

/// Posts sales invoices to the ledger.
#[derive(Debug, Clone)]
pub struct InvoicePostingService {
    db: DatabaseConnection,
    accounts: AccountRepository,
    settings: SettingsHandle,
}

impl InvoicePostingService {
    /// Creates a new invoice posting service.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: SettingsHandle) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            db,
            settings,
        }
    }

    /// Creates and posts the journal for a sales invoice in one transaction.
    ///
    /// An invoice that already has a posted journal gets that journal back;
    /// nothing new is written.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a required default account is missing or
    /// unusable, `Validation` for negative amounts, `BusinessRule` if the
    /// period is locked, and `Conflict` if the invoice has an unposted
    /// journal.
    #[instrument(skip(self, invoice), fields(invoice = %invoice.number))]
    pub async fn post_sales_invoice(&self, invoice: &SalesInvoice) -> AppResult<JournalWithLines> {
        if let Some(posted) = existing_journal(&self.db, invoice).await? {
            return Ok(posted);
        }

        let settings = self.settings.current();
        let defaults = self.accounts.resolve_default_accounts(&settings).await?;

        let ar = defaults.require("ar")?;
        let sales = defaults.require("sales")?;

        let mut lines = vec![
            JournalLineInput::debit(ar.id, invoice.total(), format!("AR {}", invoice.number)),
            JournalLineInput::credit(sales.id, invoice.subtotal, format!("Sales {}", invoice.number)),
        ];
        if !invoice.tax.is_zero() {
            let tax = defaults.require("tax")?;
            lines.push(JournalLineInput::credit(
                tax.id,
                invoice.tax,
                format!("Tax {}", invoice.number),
            ));
        }

        let input = CreateJournalInput {
            kind: JournalKind::General,
            reference: invoice.number.clone(),
            source_type: Some(INVOICE_SOURCE_TYPE.to_string()),
            source_ref: Some(invoice.number.clone()),
            currency: invoice.currency.clone(),
            ..CreateJournalInput::new(invoice.date, format!("Sales invoice {}", invoice.number), lines)
        };

        let txn = self.db.begin().await.map_err(JournalError::from)?;
        if let Some(posted) = existing_journal(&txn, invoice).await? {
            return Ok(posted);
        }
        let created = create_journal_in(&txn, input).await?;
        let posted = post_journal_in(&txn, created.id(), settings.posting_policy).await?;
        txn.commit().await.map_err(JournalError::from)?;

        info!(number = %posted.journal.number, total = %invoice.total(), "sales invoice posted");
        Ok(posted)
    }
}

/// Returns the posted journal of `invoice`, if there is one.
///
/// An unposted journal for the invoice is a conflict: it was written outside
/// this service and must be posted or deleted first.
async fn existing_journal<C: ConnectionTrait>(
    conn: &C,
    invoice: &SalesInvoice,
) -> AppResult<Option<JournalWithLines>> {
    let journals = find_by_source_in(conn, INVOICE_SOURCE_TYPE, &invoice.number)
        .await
        .map_err(JournalError::from)?;

    if let Some(posted) = journals.iter().find(|j| j.posted) {
        info!(number = %posted.number, "sales invoice already posted");
        return Ok(Some(get_journal_in(conn, JournalId::from_uuid(posted.id)).await?));
    }
    if let Some(unposted) = journals.first() {
        return Err(AppError::Conflict(format!(
            "Invoice {} already has unposted journal {}",
            invoice.number, unposted.number
        )));
    }
    Ok(None)
}
