//! Chart of accounts validation service.

use std::collections::HashSet;

use freightledger_shared::types::AccountId;

use super::error::{ChartError, ChartRule};
use super::types::{ACCOUNT_CODE_MAX_LEN, ACCOUNT_NAME_MAX_LEN, Account};

/// Chart of accounts service.
///
/// Pure tree rules; callers supply the stored accounts through a lookup
/// closure and persist whatever comes back.
pub struct ChartService;

impl ChartService {
    /// Validates field lengths and required fields.
    ///
    /// # Errors
    ///
    /// Returns `FieldRequired` or `FieldTooLong`.
    pub fn validate_fields(account: &Account) -> Result<(), ChartError> {
        if account.code.trim().is_empty() {
            return Err(ChartError::FieldRequired("code"));
        }
        if account.code.chars().count() > ACCOUNT_CODE_MAX_LEN {
            return Err(ChartError::FieldTooLong {
                field: "code",
                max: ACCOUNT_CODE_MAX_LEN,
            });
        }
        if account.name.trim().is_empty() {
            return Err(ChartError::FieldRequired("name"));
        }
        if account.name.chars().count() > ACCOUNT_NAME_MAX_LEN {
            return Err(ChartError::FieldTooLong {
                field: "name",
                max: ACCOUNT_NAME_MAX_LEN,
            });
        }
        Ok(())
    }

    /// Validates an account against the tree invariants.
    ///
    /// Checks, in order: self-parent, parent existence, parent cycle,
    /// parent/child type match, and postable-with-children.
    ///
    /// # Arguments
    ///
    /// * `account` - The account as it would be saved
    /// * `has_children` - Whether any stored account has this one as parent
    /// * `lookup` - Returns the stored account for an ID
    ///
    /// # Errors
    ///
    /// Returns `ChartError::InvariantViolation` naming the first broken rule.
    pub fn validate<L>(account: &Account, has_children: bool, lookup: L) -> Result<(), ChartError>
    where
        L: Fn(AccountId) -> Option<Account>,
    {
        if let Some(parent_id) = account.parent_id {
            if parent_id == account.id {
                return Err(ChartRule::SelfParent.into());
            }

            let parent = lookup(parent_id).ok_or(ChartRule::ParentNotFound)?;
            Self::check_ancestry(account.id, &parent, &lookup)?;

            if parent.account_type != account.account_type {
                return Err(ChartRule::TypeMismatch.into());
            }
        }

        if account.is_postable && has_children {
            return Err(ChartRule::PostableWithChildren.into());
        }

        Ok(())
    }

    /// Walks up from `parent`, failing if the chain reaches `account_id` or
    /// revisits any node.
    fn check_ancestry<L>(account_id: AccountId, parent: &Account, lookup: &L) -> Result<(), ChartError>
    where
        L: Fn(AccountId) -> Option<Account>,
    {
        let mut seen = HashSet::from([account_id]);
        let mut current = Some(parent.clone());

        while let Some(node) = current {
            if !seen.insert(node.id) {
                return Err(ChartRule::ParentCycle.into());
            }
            current = node.parent_id.and_then(lookup);
        }

        Ok(())
    }

    /// Places `child` under `parent` and demotes the parent to a group account.
    ///
    /// Returns `(parent, child)` as they should be persisted. Demotion is
    /// idempotent: attaching to a parent that is already a group leaves it
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ChartError::InvariantViolation` if the move would break a
    /// tree invariant.
    pub fn attach_child<L>(
        parent: &Account,
        child: &Account,
        child_has_children: bool,
        lookup: L,
    ) -> Result<(Account, Account), ChartError>
    where
        L: Fn(AccountId) -> Option<Account>,
    {
        let moved = child.clone().with_parent(parent.id);

        Self::validate(&moved, child_has_children, |id| {
            if id == parent.id {
                Some(parent.clone())
            } else {
                lookup(id)
            }
        })?;

        let parent = Self::demote(parent).unwrap_or_else(|| parent.clone());
        Ok((parent, moved))
    }

    /// Returns the parent as a non-postable group, or `None` if it already is one.
    #[must_use]
    pub fn demote(parent: &Account) -> Option<Account> {
        parent.is_postable.then(|| Account {
            is_postable: false,
            ..parent.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::chart::types::AccountType;

    fn chart(accounts: &[&Account]) -> HashMap<AccountId, Account> {
        accounts.iter().map(|a| (a.id, (*a).clone())).collect()
    }

    #[test]
    fn test_root_account_is_valid() {
        let cash = Account::new("1101", "Cash - Petty Cash", AccountType::Asset, 2026);
        assert!(ChartService::validate(&cash, false, |_| None).is_ok());
    }

    #[test]
    fn test_rejects_self_parent() {
        let mut cash = Account::new("1101", "Cash - Petty Cash", AccountType::Asset, 2026);
        cash.parent_id = Some(cash.id);
        let stored = chart(&[&cash]);

        let err = ChartService::validate(&cash, false, |id| stored.get(&id).cloned()).unwrap_err();
        assert_eq!(err.rule(), Some(ChartRule::SelfParent));
    }

    #[test]
    fn test_rejects_missing_parent() {
        let cash = Account::new("1101", "Cash - Petty Cash", AccountType::Asset, 2026)
            .with_parent(AccountId::new());

        let err = ChartService::validate(&cash, false, |_| None).unwrap_err();
        assert_eq!(err.rule(), Some(ChartRule::ParentNotFound));
    }

    #[test]
    fn test_rejects_cycle() {
        // 1000 -> 1100 -> 1101; re-parenting 1000 under 1101 closes the loop.
        let group = Account::new("1000", "Assets", AccountType::Asset, 2026);
        let cash = Account::new("1100", "Cash", AccountType::Asset, 2026).with_parent(group.id);
        let petty = Account::new("1101", "Petty Cash", AccountType::Asset, 2026).with_parent(cash.id);
        let stored = chart(&[&group, &cash, &petty]);

        let moved = group.clone().with_parent(petty.id);
        let err = ChartService::validate(&moved, true, |id| stored.get(&id).cloned()).unwrap_err();
        assert_eq!(err.rule(), Some(ChartRule::ParentCycle));
    }

    #[test]
    fn test_rejects_type_mismatch() {
        let assets = Account::new("1000", "Assets", AccountType::Asset, 2026);
        let revenue = Account::new("4101", "Revenue - Ocean Freight", AccountType::Income, 2026)
            .with_parent(assets.id);
        let stored = chart(&[&assets]);

        let err = ChartService::validate(&revenue, false, |id| stored.get(&id).cloned()).unwrap_err();
        assert_eq!(err.rule(), Some(ChartRule::TypeMismatch));
    }

    #[test]
    fn test_rejects_postable_with_children() {
        let group = Account::new("1000", "Assets", AccountType::Asset, 2026);
        let err = ChartService::validate(&group, true, |_| None).unwrap_err();
        assert_eq!(err.rule(), Some(ChartRule::PostableWithChildren));

        let group = Account {
            is_postable: false,
            ..group
        };
        assert!(ChartService::validate(&group, true, |_| None).is_ok());
    }

    #[test]
    fn test_attach_child_demotes_parent_once() {
        let group = Account::new("1100", "Cash & Bank", AccountType::Asset, 2026);
        let cash = Account::new("1101", "Cash - Petty Cash", AccountType::Asset, 2026);
        let bank = Account::new("1102", "Bank - BCA", AccountType::Asset, 2026);

        let (parent, child) = ChartService::attach_child(&group, &cash, false, |_| None).unwrap();
        assert!(!parent.is_postable);
        assert_eq!(child.parent_id, Some(group.id));
        assert!(child.is_postable);

        let (again, _) = ChartService::attach_child(&parent, &bank, false, |_| None).unwrap();
        assert_eq!(again, parent);
        assert!(ChartService::demote(&again).is_none());
    }

    #[test]
    fn test_validate_fields() {
        let mut account = Account::new("1101", "Cash", AccountType::Asset, 2026);
        assert!(ChartService::validate_fields(&account).is_ok());

        account.code = "X".repeat(21);
        assert!(matches!(
            ChartService::validate_fields(&account),
            Err(ChartError::FieldTooLong { field: "code", .. })
        ));

        account.code = "  ".to_string();
        assert!(matches!(
            ChartService::validate_fields(&account),
            Err(ChartError::FieldRequired("code"))
        ));
    }
}
