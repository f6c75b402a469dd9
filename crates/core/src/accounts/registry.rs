//! Chart of accounts rules: creation checks and hierarchy building.
//!
//! Functions here are pure; the ledger service feeds them the cooperative's
//! current accounts while holding the cooperative lock.

use std::collections::{HashMap, HashSet};

use koperasi_shared::types::{AccountId, CooperativeId};
use serde::Serialize;

use super::types::{Account, CreateAccountInput};
use crate::ledger::error::LedgerError;

/// An account with its nested children.
#[derive(Debug, Clone, Serialize)]
pub struct AccountNode {
    /// The account.
    pub account: Account,
    /// Child accounts, sorted by code.
    pub children: Vec<AccountNode>,
}

impl AccountNode {
    /// Total number of accounts in this subtree, including this one.
    #[must_use]
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_size).sum::<usize>()
    }
}

/// Validates a new account against the cooperative's existing accounts.
///
/// Checks, in order: non-blank code and name, subtype/type agreement,
/// code uniqueness, parent resolution within the cooperative, and an
/// acyclic parent chain.
///
/// # Errors
///
/// Returns the first rule the input violates.
pub fn validate_new_account(
    cooperative_id: CooperativeId,
    input: &CreateAccountInput,
    existing: &[Account],
) -> Result<(), LedgerError> {
    let code = input.code.trim();
    if code.is_empty() {
        return Err(LedgerError::EmptyField("code"));
    }
    if input.name.trim().is_empty() {
        return Err(LedgerError::EmptyField("name"));
    }

    if let Some(subtype) = input.subtype
        && subtype.account_type() != input.account_type
    {
        return Err(LedgerError::SubtypeMismatch {
            subtype,
            account_type: input.account_type,
        });
    }

    if !is_code_unique(cooperative_id, code, existing) {
        return Err(LedgerError::DuplicateAccountCode(code.to_string()));
    }

    if let Some(parent_id) = input.parent_id {
        let by_id: HashMap<AccountId, &Account> = existing
            .iter()
            .filter(|account| account.cooperative_id == cooperative_id)
            .map(|account| (account.id, account))
            .collect();

        if !by_id.contains_key(&parent_id) {
            return Err(LedgerError::ParentNotFound(parent_id));
        }
        ensure_acyclic(parent_id, &by_id)?;
    }

    Ok(())
}

/// Checks if an account code is unique within a cooperative.
///
/// Codes are compared case-sensitively after trimming; the same code may
/// exist in other cooperatives.
pub fn is_code_unique(cooperative_id: CooperativeId, code: &str, existing: &[Account]) -> bool {
    let code = code.trim();
    !existing
        .iter()
        .any(|account| account.cooperative_id == cooperative_id && account.code == code)
}

/// Walks the ancestor chain starting at `start`, failing on a revisit.
fn ensure_acyclic(
    start: AccountId,
    by_id: &HashMap<AccountId, &Account>,
) -> Result<(), LedgerError> {
    let mut seen = HashSet::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !seen.insert(id) {
            return Err(LedgerError::ParentCycle(id));
        }
        current = by_id.get(&id).and_then(|account| account.parent_id);
    }

    Ok(())
}

/// Builds the account tree, roots first, siblings sorted by code.
///
/// Accounts whose parent is missing are promoted to roots. Accounts caught
/// in a parent cycle (only possible with corrupted storage) are emitted as
/// roots as well so nothing is silently dropped.
#[must_use]
pub fn build_hierarchy(accounts: Vec<Account>) -> Vec<AccountNode> {
    let ids: HashSet<AccountId> = accounts.iter().map(|account| account.id).collect();
    let mut children_of: HashMap<AccountId, Vec<Account>> = HashMap::new();
    let mut roots = Vec::new();

    for account in accounts {
        match account.parent_id {
            Some(parent_id) if ids.contains(&parent_id) && parent_id != account.id => {
                children_of.entry(parent_id).or_default().push(account);
            }
            _ => roots.push(account),
        }
    }

    roots.sort_by(|a, b| a.code.cmp(&b.code));
    let mut visited = HashSet::new();
    let mut tree: Vec<AccountNode> = roots
        .into_iter()
        .map(|account| attach_children(account, &mut children_of, &mut visited))
        .collect();

    // Whatever is left never hung off a root: a cycle.
    let mut leftovers: Vec<Account> = children_of.into_values().flatten().collect();
    leftovers.sort_by(|a, b| a.code.cmp(&b.code));
    tree.extend(
        leftovers
            .into_iter()
            .filter(|account| !visited.contains(&account.id))
            .map(|account| AccountNode {
                account,
                children: Vec::new(),
            }),
    );

    tree
}

fn attach_children(
    account: Account,
    children_of: &mut HashMap<AccountId, Vec<Account>>,
    visited: &mut HashSet<AccountId>,
) -> AccountNode {
    visited.insert(account.id);
    let mut children = children_of.remove(&account.id).unwrap_or_default();
    children.sort_by(|a, b| a.code.cmp(&b.code));

    let mut nodes = Vec::with_capacity(children.len());
    for child in children {
        if !visited.contains(&child.id) {
            nodes.push(attach_children(child, children_of, visited));
        }
    }

    AccountNode {
        account,
        children: nodes,
    }
}
