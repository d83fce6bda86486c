//! Report generation service.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use freightledger_shared::types::AccountId;

use super::types::{
    AccountActivity, GeneralLedgerReport, GeneralLedgerRow, LedgerEntry, ReportPeriod,
    TrialBalanceReport, TrialBalanceRow, TrialBalanceSection, TrialBalanceTotals,
};
use crate::chart::{Account, AccountType};

/// Service for generating ledger reports.
pub struct ReportService;

/// Account tree indexed by position in code order.
struct Tree<'a> {
    accounts: Vec<&'a Account>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a> Tree<'a> {
    /// Builds the adjacency map. Accounts whose parent is not in `accounts`
    /// are treated as roots; siblings are kept in code order.
    fn build(accounts: &'a [Account]) -> Self {
        let mut sorted: Vec<&Account> = accounts.iter().collect();
        sorted.sort_by(|a, b| a.code.cmp(&b.code));

        let index: HashMap<AccountId, usize> =
            sorted.iter().enumerate().map(|(i, a)| (a.id, i)).collect();

        let mut children = vec![Vec::new(); sorted.len()];
        let mut roots = Vec::new();
        for (i, account) in sorted.iter().enumerate() {
            match account.parent_id.and_then(|p| index.get(&p).copied()) {
                Some(parent) if parent != i => children[parent].push(i),
                _ => roots.push(i),
            }
        }

        Self {
            accounts: sorted,
            children,
            roots,
        }
    }

    /// Adds every node's descendants into it, post-order, without recursion.
    fn roll_up(&self, own: &HashMap<AccountId, AccountActivity>) -> Vec<AccountActivity> {
        let mut rolled: Vec<AccountActivity> = self
            .accounts
            .iter()
            .map(|a| own.get(&a.id).copied().unwrap_or_default())
            .collect();
        let mut visited = vec![false; self.accounts.len()];
        let mut stack: Vec<(usize, bool)> = self.roots.iter().map(|&r| (r, false)).collect();

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                for &child in &self.children[node] {
                    let child_activity = rolled[child];
                    rolled[node].add(child_activity.debit, child_activity.credit);
                }
                continue;
            }
            if visited[node] {
                continue;
            }
            visited[node] = true;
            stack.push((node, true));
            stack.extend(
                self.children[node]
                    .iter()
                    .filter(|&&c| !visited[c])
                    .map(|&c| (c, false)),
            );
        }

        rolled
    }

    /// Node indices with depth, pre-order, siblings by code.
    fn pre_order(&self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(self.accounts.len());
        let mut visited = vec![false; self.accounts.len()];
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((node, level)) = stack.pop() {
            if std::mem::replace(&mut visited[node], true) {
                continue;
            }
            order.push((node, level));
            stack.extend(self.children[node].iter().rev().map(|&c| (c, level + 1)));
        }

        order
    }
}

impl ReportService {
    /// Sums in-range, counted entries per account.
    #[must_use]
    pub fn aggregate_activity(
        period: &ReportPeriod,
        entries: &[LedgerEntry],
    ) -> HashMap<AccountId, AccountActivity> {
        let mut activity: HashMap<AccountId, AccountActivity> = HashMap::new();
        for entry in entries
            .iter()
            .filter(|e| period.contains(e.date) && period.counts(e.posted))
        {
            activity
                .entry(entry.account_id)
                .or_default()
                .add(entry.debit, entry.credit);
        }
        activity
    }

    /// Generates a trial balance.
    ///
    /// Each account's figures include its descendants. Rows are grouped by
    /// account type (asset, liability, equity, income, expense) and listed in
    /// tree pre-order with siblings sorted by code. Totals are taken from root
    /// accounts only, so nothing is counted twice.
    #[must_use]
    pub fn generate_trial_balance(
        period: ReportPeriod,
        accounts: &[Account],
        entries: &[LedgerEntry],
    ) -> TrialBalanceReport {
        let tree = Tree::build(accounts);
        let rolled = tree.roll_up(&Self::aggregate_activity(&period, entries));

        let mut grouped: BTreeMap<AccountType, Vec<TrialBalanceRow>> = BTreeMap::new();
        for (node, level) in tree.pre_order() {
            let account = tree.accounts[node];
            let activity = rolled[node];
            grouped
                .entry(account.account_type)
                .or_default()
                .push(TrialBalanceRow {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    level,
                    is_postable: account.is_postable,
                    debit: activity.debit,
                    credit: activity.credit,
                    balance: activity.balance(),
                });
        }

        let sections = grouped
            .into_iter()
            .map(|(account_type, rows)| TrialBalanceSection {
                account_type,
                label: account_type.label().to_string(),
                rows,
            })
            .collect();

        let mut totals = AccountActivity::default();
        for &root in &tree.roots {
            totals.add(rolled[root].debit, rolled[root].credit);
        }

        TrialBalanceReport {
            period,
            sections,
            totals: TrialBalanceTotals {
                total_debit: totals.debit,
                total_credit: totals.credit,
                difference: totals.balance(),
                is_balanced: totals.debit == totals.credit,
            },
        }
    }

    /// Generates the general ledger of one account.
    ///
    /// `entries` may include lines before the period; they make up the
    /// opening balance. Entries after the period and entries of other
    /// accounts are ignored.
    #[must_use]
    pub fn generate_general_ledger(
        account: &Account,
        period: ReportPeriod,
        mut entries: Vec<LedgerEntry>,
    ) -> GeneralLedgerReport {
        entries.retain(|e| e.account_id == account.id && period.counts(e.posted));
        entries.sort_by(|a, b| {
            (a.date, a.journal_id, a.line_id).cmp(&(b.date, b.journal_id, b.line_id))
        });

        let opening_balance: Decimal = entries
            .iter()
            .filter(|e| e.date < period.date_from)
            .map(|e| e.debit - e.credit)
            .sum();

        let mut running = opening_balance;
        let mut in_range = AccountActivity::default();
        let rows: Vec<GeneralLedgerRow> = entries
            .into_iter()
            .filter(|e| period.contains(e.date))
            .map(|e| {
                running += e.debit - e.credit;
                in_range.add(e.debit, e.credit);
                GeneralLedgerRow {
                    journal_id: e.journal_id,
                    line_id: e.line_id,
                    date: e.date,
                    reference: e.journal_number,
                    label: e.label,
                    debit: e.debit,
                    credit: e.credit,
                    balance: running,
                }
            })
            .collect();

        GeneralLedgerReport {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            period,
            opening_balance,
            rows,
            total_debit: in_range.debit,
            total_credit: in_range.credit,
            closing_balance: running,
        }
    }
}
