//! Error types for the wallet monitor.

use solana_client::client_error::ClientError;
use solana_client::nonblocking::pubsub_client::PubsubClientError;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, WalletMonitorError>;

/// Errors produced while monitoring a wallet.
///
/// Only [`WalletMonitorError::TransportError`] raised while opening a subscription
/// and configuration problems ever reach the caller of `start`. Everything raised
/// while processing a single notification is logged and absorbed.
#[derive(Debug, Error)]
pub enum WalletMonitorError {
    /// Subscribe, unsubscribe or RPC request failed at the infrastructure level.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The transaction record could not be located.
    #[error("Transaction not found: {0}")]
    NotFound(String),

    /// The transaction record could not be interpreted.
    #[error("Malformed transaction record: {0}")]
    MalformedRecord(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A downstream event sink rejected an event.
    #[error("Sink error: {0}")]
    SinkError(String),

    /// A session for another address is already running.
    #[error("Session conflict: {0}")]
    SessionConflict(String),
}

impl From<ClientError> for WalletMonitorError {
    fn from(err: ClientError) -> Self {
        Self::TransportError(err.to_string())
    }
}

impl From<PubsubClientError> for WalletMonitorError {
    fn from(err: PubsubClientError) -> Self {
        Self::TransportError(err.to_string())
    }
}
