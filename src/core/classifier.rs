//! Maps a wallet's balance changes to a [`TransactionType`].
//!
//! Rules are evaluated in priority order and the first match wins:
//!
//! 1. no asset changes: `SOL_RECEIVE` when SOL arrived, otherwise `SOL_SEND`
//! 2. a single wrapped-native change: `WRAP` or `UNWRAP` by its sign
//! 3. reference asset out and other asset in: `BUY`
//! 4. other asset out and reference asset in: `SELL`
//! 5. only increases: `RECEIVE`
//! 6. only decreases: `SEND`
//! 7. anything else: `COMPLEX`

use crate::core::asset_registry::ReferenceAssetRegistry;
use crate::types::{AssetAmount, AssetChange, TradeDetail, TransactionType};

/// Asset changes split by direction and reference-registry membership.
#[derive(Debug, Default)]
struct Buckets<'a> {
    reference_in: Vec<&'a AssetChange>,
    reference_out: Vec<&'a AssetChange>,
    other_in: Vec<&'a AssetChange>,
    other_out: Vec<&'a AssetChange>,
}

impl<'a> Buckets<'a> {
    fn partition(changes: &'a [AssetChange], registry: &ReferenceAssetRegistry) -> Self {
        let mut buckets = Self::default();
        for change in changes {
            let reference = registry.is_reference(&change.asset_id);
            let bucket = match (change.is_increase(), change.is_decrease(), reference) {
                (true, _, true) => &mut buckets.reference_in,
                (true, _, false) => &mut buckets.other_in,
                (_, true, true) => &mut buckets.reference_out,
                (_, true, false) => &mut buckets.other_out,
                _ => continue,
            };
            bucket.push(change);
        }
        buckets
    }
}

/// Classifies a transaction. Pure and independent of the order of `asset_changes`.
#[must_use]
pub fn classify(
    native_delta: f64,
    asset_changes: &[AssetChange],
    registry: &ReferenceAssetRegistry,
) -> TransactionType {
    if asset_changes.is_empty() {
        return if native_delta > 0.0 {
            TransactionType::SolReceive
        } else {
            TransactionType::SolSend
        };
    }

    if let [only] = asset_changes {
        if registry.is_wrapped_native(&only.asset_id) {
            return if only.is_increase() {
                TransactionType::Wrap
            } else {
                TransactionType::Unwrap
            };
        }
    }

    let buckets = Buckets::partition(asset_changes, registry);
    if !buckets.reference_out.is_empty() && !buckets.other_in.is_empty() {
        return TransactionType::Buy;
    }
    if !buckets.other_out.is_empty() && !buckets.reference_in.is_empty() {
        return TransactionType::Sell;
    }

    let any_increase = asset_changes.iter().any(AssetChange::is_increase);
    let any_decrease = asset_changes.iter().any(AssetChange::is_decrease);
    match (any_increase, any_decrease) {
        (true, false) => TransactionType::Receive,
        (false, true) => TransactionType::Send,
        _ => TransactionType::Complex,
    }
}

/// Reference assets spent and other assets acquired.
#[must_use]
pub fn extract_buy_detail(
    asset_changes: &[AssetChange],
    registry: &ReferenceAssetRegistry,
) -> TradeDetail {
    let buckets = Buckets::partition(asset_changes, registry);
    TradeDetail {
        spent: amounts(&buckets.reference_out),
        acquired: amounts(&buckets.other_in),
    }
}

/// Other assets sold and reference assets received.
#[must_use]
pub fn extract_sell_detail(
    asset_changes: &[AssetChange],
    registry: &ReferenceAssetRegistry,
) -> TradeDetail {
    let buckets = Buckets::partition(asset_changes, registry);
    TradeDetail {
        spent: amounts(&buckets.other_out),
        acquired: amounts(&buckets.reference_in),
    }
}

fn amounts(changes: &[&AssetChange]) -> Vec<AssetAmount> {
    changes
        .iter()
        .map(|change| AssetAmount {
            asset_id: change.asset_id.clone(),
            amount: change.delta.abs(),
        })
        .collect()
}
