//! Real-time Solana wallet monitor.
//!
//! Subscribes to the logs of transactions that mention one wallet, fetches each
//! relevant transaction, reconstructs the wallet's SOL and token balance changes,
//! and classifies the transaction as a buy, sell, wrap/unwrap, transfer or complex
//! interaction. Classified events are logged and handed to a pluggable sink.
//!
//! ```no_run
//! use solana_wallet_monitor::{MonitorConfigBuilder, SolanaRpcTransport, WalletMonitor};
//! use std::sync::Arc;
//!
//! # async fn run() -> solana_wallet_monitor::Result<()> {
//! let config = MonitorConfigBuilder::new()
//!     .with_rpc("https://api.mainnet-beta.solana.com")
//!     .wallet("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU")
//!     .build()?;
//!
//! let transport = Arc::new(SolanaRpcTransport::from_config(&config));
//! let monitor = WalletMonitor::new(transport, &config);
//! monitor.start(config.wallet).await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod common;
pub mod config;
pub mod core;
pub mod monitor;
pub mod sources;
pub mod types;

pub use common::error::{Result, WalletMonitorError};
pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use crate::core::{
    EventDispatcher, EventPipeline, EventSink, FnSink, NoopSink, ReferenceAssetRegistry,
    classify, extract_buy_detail, extract_sell_detail,
};
pub use monitor::WalletMonitor;
pub use sources::fetcher::TransactionFetcher;
pub use sources::websocket::SolanaRpcTransport;
pub use sources::{
    AssetAccount, LedgerTransport, LogSubscription, SubscriptionHandle, TransactionFetchConfig,
};
pub use types::{
    AssetAmount, AssetChange, RawLogNotification, TokenBalanceInfo, TradeDetail,
    TransactionEvent, TransactionRecord, TransactionType,
};
