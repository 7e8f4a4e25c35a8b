//! Data types flowing through the monitoring pipeline.

pub mod events;
pub mod metadata;

pub use events::{
    AssetAmount, AssetChange, RawLogNotification, TradeDetail, TransactionEvent, TransactionType,
};
pub use metadata::{TokenBalanceInfo, TransactionRecord};
