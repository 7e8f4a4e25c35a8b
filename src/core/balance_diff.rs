//! Reconstructs the tracked wallet's balance changes from a transaction record.
//!
//! Token balances are summed per mint, so a wallet holding several accounts of one
//! mint reports their combined change. A plain per-entry mapping would keep only
//! the last account seen for each mint.

use crate::types::{AssetChange, TokenBalanceInfo, TransactionRecord};
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use std::collections::BTreeMap;

/// Asset deltas at or below this magnitude (display units) are noise.
pub const MATERIAL_CHANGE_EPSILON: f64 = 0.000_001;

/// Native delta and material asset changes of one wallet in one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceDiff {
    /// Native balance change in SOL.
    pub native_delta: f64,
    /// One entry per asset whose balance moved by more than [`MATERIAL_CHANGE_EPSILON`].
    pub asset_changes: Vec<AssetChange>,
}

impl BalanceDiff {
    /// True when nothing moved for the wallet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.native_delta == 0.0 && self.asset_changes.is_empty()
    }
}

/// Computes the balance changes of `tracked_address` in `record`.
///
/// An address missing from the account list yields an empty diff. Missing balance
/// entries degrade to zero rather than failing.
#[must_use]
pub fn diff(record: &TransactionRecord, tracked_address: &str) -> BalanceDiff {
    let Some(index) = record.account_index(tracked_address) else {
        return BalanceDiff::default();
    };

    BalanceDiff {
        native_delta: native_delta(record, index),
        asset_changes: asset_changes(record, tracked_address),
    }
}

#[allow(clippy::cast_precision_loss)]
fn native_delta(record: &TransactionRecord, index: usize) -> f64 {
    match (record.pre_balances.get(index), record.post_balances.get(index)) {
        (Some(pre), Some(post)) => {
            let raw_change = i128::from(*post) - i128::from(*pre);
            raw_change as f64 / LAMPORTS_PER_SOL as f64
        }
        _ => 0.0,
    }
}

fn asset_changes(record: &TransactionRecord, owner: &str) -> Vec<AssetChange> {
    let (Some(pre), Some(post)) = (&record.pre_token_balances, &record.post_token_balances) else {
        return Vec::new();
    };

    let pre_amounts = amounts_by_mint(pre, owner);
    let post_amounts = amounts_by_mint(post, owner);

    let mut mints: Vec<&str> = pre_amounts.keys().chain(post_amounts.keys()).copied().collect();
    mints.sort_unstable();
    mints.dedup();

    mints
        .into_iter()
        .map(|mint| {
            AssetChange::new(
                mint,
                pre_amounts.get(mint).copied().unwrap_or(0.0),
                post_amounts.get(mint).copied().unwrap_or(0.0),
            )
        })
        .filter(|change| change.delta.abs() > MATERIAL_CHANGE_EPSILON)
        .collect()
}

/// Sums the owner's balances per mint. A wallet may hold several token accounts for
/// the same mint.
fn amounts_by_mint<'a>(balances: &'a [TokenBalanceInfo], owner: &str) -> BTreeMap<&'a str, f64> {
    let mut amounts = BTreeMap::new();
    for balance in balances {
        if balance.owner.as_deref() == Some(owner) {
            *amounts.entry(balance.mint.as_str()).or_insert(0.0) += balance.ui_amount;
        }
    }
    amounts
}
