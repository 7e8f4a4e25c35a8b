//! Ledger access for the monitor.
//!
//! [`LedgerTransport`] is the capability set the monitor needs from a Solana node:
//! a log subscription plus a few lookups. [`websocket::SolanaRpcTransport`] is the
//! production implementation; tests substitute their own.

pub mod fetcher;
pub mod websocket;

use crate::common::error::Result;
use crate::types::{RawLogNotification, TransactionRecord};
use async_trait::async_trait;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use std::fmt;
use tokio::sync::mpsc;

/// Opaque token identifying an open log subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An open subscription: its handle and the stream of notifications it produces.
///
/// The stream ends when the subscription is released or the connection drops.
#[derive(Debug)]
pub struct LogSubscription {
    pub handle: SubscriptionHandle,
    pub notifications: mpsc::Receiver<RawLogNotification>,
}

/// Options for a transaction lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFetchConfig {
    pub commitment: CommitmentConfig,
    /// Highest message version the node may return. `Some(0)` accepts both legacy
    /// and v0 transactions; `None` makes the node reject versioned transactions.
    pub max_supported_transaction_version: Option<u8>,
}

/// A token account owned by a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetAccount {
    pub asset_id: String,
    pub ui_amount: f64,
    pub decimals: u8,
}

/// What the monitor requires from the ledger RPC.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Subscribes to log notifications of transactions mentioning `address`.
    async fn subscribe_logs(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<LogSubscription>;

    /// Releases a subscription. After this returns, successfully or not, the
    /// transport no longer tracks the handle.
    async fn unsubscribe_logs(&self, handle: SubscriptionHandle) -> Result<()>;

    /// Looks up a transaction. `Ok(None)` means the node does not have it.
    async fn get_transaction(
        &self,
        signature: &Signature,
        config: TransactionFetchConfig,
    ) -> Result<Option<TransactionRecord>>;

    /// Native balance in lamports.
    async fn get_native_balance(&self, address: &Pubkey) -> Result<u64>;

    /// Token accounts owned by `owner`.
    async fn get_asset_accounts(&self, owner: &Pubkey) -> Result<Vec<AssetAccount>>;

    /// Short name used in log messages.
    fn transport_name(&self) -> &'static str;
}
