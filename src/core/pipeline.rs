//! Fetch, diff, classify and dispatch for a single notification.

use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::core::asset_registry::ReferenceAssetRegistry;
use crate::core::balance_diff;
use crate::core::classifier::classify;
use crate::core::dispatcher::EventDispatcher;
use crate::sources::fetcher::TransactionFetcher;
use crate::types::{RawLogNotification, TransactionEvent, TransactionRecord};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Processing stages after the log filter, bound to one tracked wallet.
pub struct EventPipeline {
    tracked_address: String,
    fetcher: TransactionFetcher,
    registry: Arc<ReferenceAssetRegistry>,
    dispatcher: Arc<EventDispatcher>,
}

impl EventPipeline {
    #[must_use]
    pub fn new(
        tracked_address: &Pubkey,
        fetcher: TransactionFetcher,
        registry: Arc<ReferenceAssetRegistry>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            tracked_address: tracked_address.to_string(),
            fetcher,
            registry,
            dispatcher,
        }
    }

    /// Runs a notification through fetch, diff, classification and dispatch.
    ///
    /// Returns the dispatched event, or `None` when the notification was dropped.
    pub async fn process(
        &self,
        notification: &RawLogNotification,
    ) -> Result<Option<TransactionEvent>> {
        logging::log(
            LogLevel::Debug,
            &format!(
                "Processing {} (slot {}, failed: {})",
                notification.signature, notification.slot, notification.failed
            ),
        );

        let Some(record) = self.fetcher.fetch(&notification.signature).await? else {
            return Ok(None);
        };
        let Some(event) = self.build_event(&record) else {
            return Ok(None);
        };

        self.dispatcher.dispatch(&event).await?;
        Ok(Some(event))
    }

    /// Diffs and classifies a record. `None` when the wallet is not part of the
    /// transaction or nothing moved for it.
    #[must_use]
    pub fn build_event(&self, record: &TransactionRecord) -> Option<TransactionEvent> {
        if record.account_index(&self.tracked_address).is_none() {
            logging::log(
                LogLevel::Debug,
                &format!(
                    "{} does not list {} among its accounts",
                    record.signature, self.tracked_address
                ),
            );
            return None;
        }

        let diff = balance_diff::diff(record, &self.tracked_address);
        if diff.is_empty() {
            logging::log(
                LogLevel::Debug,
                &format!("{} moved no balances for the wallet", record.signature),
            );
            return None;
        }

        let kind = classify(diff.native_delta, &diff.asset_changes, &self.registry);
        Some(TransactionEvent {
            signature: record.signature.clone(),
            kind,
            native_delta: diff.native_delta,
            asset_changes: diff.asset_changes,
            timestamp: TransactionEvent::timestamp_from_block_time(record.block_time),
            slot: record.slot,
        })
    }
}
