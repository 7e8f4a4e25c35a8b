//! Transaction fetcher: resolves a notification's signature into a record.

use super::{LedgerTransport, TransactionFetchConfig};
use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::types::TransactionRecord;
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature};
use std::str::FromStr;
use std::sync::Arc;

/// Fetches transaction records at a fixed commitment, accepting legacy and v0
/// transactions alike.
pub struct TransactionFetcher {
    transport: Arc<dyn LedgerTransport>,
    config: TransactionFetchConfig,
}

impl TransactionFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn LedgerTransport>, commitment: CommitmentConfig) -> Self {
        Self {
            transport,
            config: TransactionFetchConfig {
                commitment,
                max_supported_transaction_version: Some(0),
            },
        }
    }

    #[must_use]
    pub fn config(&self) -> TransactionFetchConfig {
        self.config
    }

    /// Fetches the record for `signature`.
    ///
    /// `Ok(None)` when the record is unavailable (pruned, not yet confirmed) or the
    /// signature is not valid base58. Both are routine and not errors. Transport
    /// failures are returned as errors and are not retried here.
    pub async fn fetch(&self, signature: &str) -> Result<Option<TransactionRecord>> {
        let Ok(parsed) = Signature::from_str(signature) else {
            logging::log(
                LogLevel::Debug,
                &format!("Skipping malformed signature {signature}"),
            );
            return Ok(None);
        };

        let record = self.transport.get_transaction(&parsed, self.config).await?;
        if record.is_none() {
            logging::log(
                LogLevel::Debug,
                &format!("Transaction {signature} not available yet"),
            );
        }
        Ok(record)
    }
}
