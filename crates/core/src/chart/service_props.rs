//! Property-based tests for ChartService.
//!
//! - Re-parenting an ancestor under any of its descendants is always a cycle
//! - Attaching a fresh account never fails for same-typed parents and demotes
//!   the parent exactly once
//! - A parent of a different type is always rejected

use std::collections::HashMap;

use proptest::prelude::*;

use freightledger_shared::types::AccountId;

use super::error::ChartRule;
use super::service::ChartService;
use super::types::{Account, AccountType};

fn account_type() -> impl Strategy<Value = AccountType> {
    prop::sample::select(AccountType::ALL.to_vec())
}

/// Builds a single parent chain `depth` accounts deep; index 0 is the root.
fn chain(depth: usize, account_type: AccountType) -> Vec<Account> {
    let mut accounts: Vec<Account> = Vec::with_capacity(depth);
    for i in 0..depth {
        let mut account = Account::new(format!("{}", 1000 + i), format!("Level {i}"), account_type, 2026);
        if let Some(parent) = accounts.last_mut() {
            parent.is_postable = false;
            account.parent_id = Some(parent.id);
        }
        accounts.push(account);
    }
    accounts
}

fn index(accounts: &[Account]) -> HashMap<AccountId, Account> {
    accounts.iter().map(|a| (a.id, a.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Cycle detection
    // ========================================================================

    #[test]
    fn prop_reparenting_root_under_descendant_is_cycle(
        depth in 1usize..12,
        pick in any::<prop::sample::Index>(),
        kind in account_type(),
    ) {
        let accounts = chain(depth, kind);
        let stored = index(&accounts);
        let target = &accounts[pick.index(depth)];

        let moved = accounts[0].clone().with_parent(target.id);
        let err = ChartService::validate(&moved, depth > 1, |id| stored.get(&id).cloned())
            .unwrap_err();

        let expected = if target.id == accounts[0].id {
            ChartRule::SelfParent
        } else {
            ChartRule::ParentCycle
        };
        prop_assert_eq!(err.rule(), Some(expected));
    }

    // ========================================================================
    // Attach child
    // ========================================================================

    #[test]
    fn prop_attach_fresh_child_demotes_parent(
        depth in 1usize..12,
        pick in any::<prop::sample::Index>(),
        kind in account_type(),
    ) {
        let accounts = chain(depth, kind);
        let stored = index(&accounts);
        let parent = &accounts[pick.index(depth)];
        let child = Account::new("9999", "New leaf", kind, 2026);

        let (new_parent, new_child) =
            ChartService::attach_child(parent, &child, false, |id| stored.get(&id).cloned()).unwrap();

        prop_assert!(!new_parent.is_postable);
        prop_assert_eq!(new_child.parent_id, Some(parent.id));
        prop_assert!(ChartService::demote(&new_parent).is_none());

        let (twice, _) =
            ChartService::attach_child(&new_parent, &child, false, |id| stored.get(&id).cloned()).unwrap();
        prop_assert_eq!(twice, new_parent);
    }

    #[test]
    fn prop_type_mismatch_rejected(
        parent_kind in account_type(),
        child_kind in account_type(),
    ) {
        let parent = Account::new("1000", "Group", parent_kind, 2026);
        let child = Account::new("1001", "Leaf", child_kind, 2026);

        let result = ChartService::attach_child(&parent, &child, false, |_| None);

        if parent_kind == child_kind {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err().rule(), Some(ChartRule::TypeMismatch));
        }
    }
}
