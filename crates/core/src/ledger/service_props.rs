//! Property-based tests for LedgerService.
//!
//! - Journal balance: validation succeeds iff debits equal credits
//! - Line exclusivity: a line never carries both sides
//! - Posted journals reject every modification

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use freightledger_shared::types::{AccountId, JournalId};

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{JournalLineInput, JournalTotals};
use crate::chart::{Account, AccountType};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Mock account validator that always succeeds.
fn ok_account_validator(id: AccountId) -> Result<Account, LedgerError> {
    let mut account = Account::new("1101", "Cash - Petty Cash", AccountType::Asset, 2026);
    account.id = id;
    Ok(account)
}

/// Debit lines for `amounts` and one credit line for their sum.
fn balanced_lines(amounts: &[Decimal]) -> Vec<JournalLineInput> {
    let total: Decimal = amounts.iter().copied().sum();
    let mut lines: Vec<JournalLineInput> = amounts
        .iter()
        .map(|amount| JournalLineInput::debit(AccountId::new(), *amount, "debit"))
        .collect();
    lines.push(JournalLineInput::credit(AccountId::new(), total, "credit"));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Balance
    // ========================================================================

    #[test]
    fn prop_balanced_journal_validates(
        amounts in prop::collection::vec(positive_amount(), 1..10),
    ) {
        let lines = balanced_lines(&amounts);
        let expected: Decimal = amounts.iter().copied().sum();

        let totals = LedgerService::validate_lines(&lines, ok_account_validator).unwrap();

        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.debit, expected);
        prop_assert_eq!(totals.credit, expected);
    }

    #[test]
    fn prop_unbalanced_journal_reports_both_sides(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        skew in positive_amount(),
    ) {
        let mut lines = balanced_lines(&amounts);
        if let Some(last) = lines.last_mut() {
            last.credit += skew;
        }
        let debit: Decimal = amounts.iter().copied().sum();

        let err = LedgerService::validate_lines(&lines, ok_account_validator).unwrap_err();

        match err {
            LedgerError::UnbalancedJournal { debit: d, credit: c } => {
                prop_assert_eq!(d, debit);
                prop_assert_eq!(c, debit + skew);
            }
            other => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn prop_totals_difference(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        let totals = JournalTotals::new(debit, credit);
        prop_assert_eq!(totals.difference(), debit - credit);
        prop_assert_eq!(totals.is_balanced, totals.difference().is_zero());
    }

    // ========================================================================
    // Line rules
    // ========================================================================

    #[test]
    fn prop_line_with_both_sides_rejected(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        let line = JournalLineInput {
            account_id: AccountId::new(),
            label: String::new(),
            debit,
            credit,
        };
        prop_assert!(matches!(
            LedgerService::validate_line(&line, &ok_account_validator),
            Err(LedgerError::DebitAndCredit)
        ));
    }

    #[test]
    fn prop_negative_amount_rejected(
        amount in positive_amount(),
        on_debit in any::<bool>(),
    ) {
        let (debit, credit) = if on_debit {
            (-amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -amount)
        };
        prop_assert!(matches!(
            LedgerService::validate_amounts(debit, credit),
            Err(LedgerError::NegativeAmount)
        ));
    }

    // ========================================================================
    // Posted immutability
    // ========================================================================

    #[test]
    fn prop_posted_journal_is_locked(
        day in 1u32..=28,
        period_locked in any::<bool>(),
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        let id = JournalId::new();
        let date = NaiveDate::from_ymd_opt(2026, 2, day).unwrap();
        let totals = JournalTotals::new(debit, credit);

        prop_assert!(matches!(
            LedgerService::validate_can_modify(id, true),
            Err(LedgerError::PostedJournalLocked(j)) if j == id
        ));
        prop_assert!(matches!(
            LedgerService::validate_for_posting(id, true, date, period_locked, &totals),
            Err(LedgerError::PostedJournalLocked(_))
        ));
        prop_assert!(LedgerService::validate_can_modify(id, false).is_ok());
    }
}
