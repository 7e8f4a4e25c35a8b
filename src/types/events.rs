//! Notifications coming in from the transport and classification events going out.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// A log notification pushed by the subscription, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogNotification {
    /// Signature of the transaction that emitted the logs.
    pub signature: String,
    /// Program log lines in emission order.
    pub lines: Vec<String>,
    /// Slot the notification was produced at.
    pub slot: u64,
    /// Whether the transaction failed on chain.
    pub failed: bool,
}

/// Material balance change of one asset for the tracked address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetChange {
    pub asset_id: String,
    pub pre_amount: f64,
    pub post_amount: f64,
    pub delta: f64,
}

impl AssetChange {
    #[must_use]
    pub fn new(asset_id: impl Into<String>, pre_amount: f64, post_amount: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            pre_amount,
            post_amount,
            delta: post_amount - pre_amount,
        }
    }

    #[must_use]
    pub fn is_increase(&self) -> bool {
        self.delta > 0.0
    }

    #[must_use]
    pub fn is_decrease(&self) -> bool {
        self.delta < 0.0
    }
}

/// What a transaction did from the tracked wallet's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Only native SOL moved, and the wallet gained.
    SolReceive,
    /// Only native SOL moved, and the wallet did not gain.
    SolSend,
    /// SOL was wrapped into WSOL.
    Wrap,
    /// WSOL was unwrapped back into SOL.
    Unwrap,
    /// Reference asset out, other asset in.
    Buy,
    /// Other asset out, reference asset in.
    Sell,
    /// Assets only arrived.
    Receive,
    /// Assets only left.
    Send,
    Complex,
}

impl TransactionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::SolReceive => "SOL_RECEIVE",
            TransactionType::SolSend => "SOL_SEND",
            TransactionType::Wrap => "WRAP",
            TransactionType::Unwrap => "UNWRAP",
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::Receive => "RECEIVE",
            TransactionType::Send => "SEND",
            TransactionType::Complex => "COMPLEX",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified transaction, handed to the dispatcher once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionEvent {
    pub signature: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Native balance change in SOL.
    pub native_delta: f64,
    pub asset_changes: Vec<AssetChange>,
    /// Block time of the transaction, when the node reported one.
    pub timestamp: Option<DateTime<Utc>>,
    pub slot: u64,
}

impl TransactionEvent {
    /// Converts a Unix block time into the event timestamp.
    #[must_use]
    pub fn timestamp_from_block_time(block_time: Option<i64>) -> Option<DateTime<Utc>> {
        block_time.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Serializes the event as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// An amount of one asset, always non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetAmount {
    pub asset_id: String,
    pub amount: f64,
}

/// Two sides of a buy or sell.
///
/// For a buy, `spent` holds the reference assets that left and `acquired` the other
/// assets that arrived. For a sell, `spent` holds the other assets that left and
/// `acquired` the reference assets that arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeDetail {
    pub spent: Vec<AssetAmount>,
    pub acquired: Vec<AssetAmount>,
}
