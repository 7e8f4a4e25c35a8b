//! Hands finished events to a pluggable sink and renders them for humans.

use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::core::asset_registry::ReferenceAssetRegistry;
use crate::core::classifier::{extract_buy_detail, extract_sell_detail};
use crate::types::{TradeDetail, TransactionEvent, TransactionType};
use async_trait::async_trait;
use chrono::SecondsFormat;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Downstream consumer of classification events.
///
/// An error returned here is logged against the event's signature and does not
/// affect later events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, event: &TransactionEvent) -> Result<()>;
}

/// Sink that does nothing beyond the rendered log block.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn on_event(&self, _event: &TransactionEvent) -> Result<()> {
        Ok(())
    }
}

/// Adapts a synchronous closure into an [`EventSink`].
pub struct FnSink<F> {
    handler: F,
}

impl<F> FnSink<F>
where
    F: Fn(&TransactionEvent) -> Result<()> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> EventSink for FnSink<F>
where
    F: Fn(&TransactionEvent) -> Result<()> + Send + Sync,
{
    async fn on_event(&self, event: &TransactionEvent) -> Result<()> {
        (self.handler)(event)
    }
}

/// Delivers events to the configured sink.
///
/// The sink can be swapped between events. A swap waits for any in-flight dispatch
/// to finish, so a dispatch never observes a half-replaced sink.
pub struct EventDispatcher {
    registry: Arc<ReferenceAssetRegistry>,
    sink: RwLock<Arc<dyn EventSink>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(registry: Arc<ReferenceAssetRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry,
            sink: RwLock::new(sink),
        }
    }

    /// Dispatcher with a [`NoopSink`].
    #[must_use]
    pub fn with_noop_sink(registry: Arc<ReferenceAssetRegistry>) -> Self {
        Self::new(registry, Arc::new(NoopSink))
    }

    /// Replaces the sink for all subsequent events.
    pub async fn set_sink(&self, sink: Arc<dyn EventSink>) {
        *self.sink.write().await = sink;
    }

    /// Logs the rendered event, then forwards it to the sink.
    pub async fn dispatch(&self, event: &TransactionEvent) -> Result<()> {
        logging::log(LogLevel::Info, &render(event, &self.registry));

        let sink = self.sink.read().await;
        sink.on_event(event).await
    }
}

/// Human-readable summary of an event.
#[must_use]
pub fn render(event: &TransactionEvent, registry: &ReferenceAssetRegistry) -> String {
    let timestamp = event.timestamp.map_or_else(
        || "unknown".to_string(),
        |ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true),
    );

    let mut lines = vec![
        "=== Transaction detected ===".to_string(),
        format!("Type: {}", event.kind),
        format!("Signature: {}", event.signature),
        format!("Time: {timestamp}"),
        format!("Slot: {}", event.slot),
        format!("SOL change: {:+.6} SOL", event.native_delta),
    ];

    if !event.asset_changes.is_empty() {
        lines.push("Asset changes:".to_string());
        for change in &event.asset_changes {
            let tag = if registry.is_reference(&change.asset_id) {
                "[reference]"
            } else {
                "[other]"
            };
            lines.push(format!("  {tag} asset: {}", change.asset_id));
            let sign = if change.delta > 0.0 { "+" } else { "" };
            lines.push(format!("  change: {sign}{}", change.delta));
            lines.push(format!(
                "  before: {} -> after: {}",
                change.pre_amount, change.post_amount
            ));
        }
    }

    match event.kind {
        TransactionType::Buy => {
            lines.push("Buy detected".to_string());
            let detail = extract_buy_detail(&event.asset_changes, registry);
            push_trade_lines(&mut lines, &detail, ("spent", "acquired"), registry);
        }
        TransactionType::Sell => {
            lines.push("Sell detected".to_string());
            let detail = extract_sell_detail(&event.asset_changes, registry);
            push_trade_lines(&mut lines, &detail, ("sold", "received"), registry);
        }
        TransactionType::Wrap => lines.push("WSOL wrap detected".to_string()),
        TransactionType::Unwrap => lines.push("WSOL unwrap detected".to_string()),
        _ => {}
    }

    lines.push("============================".to_string());
    lines.join("\n")
}

fn push_trade_lines(
    lines: &mut Vec<String>,
    detail: &TradeDetail,
    (out_label, in_label): (&str, &str),
    registry: &ReferenceAssetRegistry,
) {
    for amount in &detail.spent {
        lines.push(format!(
            "  {out_label}: {} {}",
            amount.amount,
            registry.display_name(&amount.asset_id)
        ));
    }
    for amount in &detail.acquired {
        lines.push(format!(
            "  {in_label}: {} {}",
            amount.amount,
            registry.display_name(&amount.asset_id)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::WalletMonitorError;
    use crate::types::AssetChange;
    use std::sync::Mutex;

    fn registry() -> ReferenceAssetRegistry {
        ReferenceAssetRegistry::new("WRAPPED_NATIVE").with_asset("USDC", "USDC")
    }

    fn buy_event() -> TransactionEvent {
        TransactionEvent {
            signature: "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7"
                .to_string(),
            kind: TransactionType::Buy,
            native_delta: -0.000_005,
            asset_changes: vec![
                AssetChange::new("USDC", 100.0, 0.0),
                AssetChange::new("FOOxxxxxxxxxxxxx", 0.0, 5000.0),
            ],
            timestamp: TransactionEvent::timestamp_from_block_time(Some(1_678_888_888)),
            slot: 123_456,
        }
    }

    #[test]
    fn test_render_buy_event() {
        let text = render(&buy_event(), &registry());

        assert!(text.contains("Type: BUY"));
        assert!(text.contains("Time: 2023-03-15T14:01:28.000Z"));
        assert!(text.contains("Slot: 123456"));
        assert!(text.contains("SOL change: -0.000005 SOL"));
        assert!(text.contains("[reference] asset: USDC"));
        assert!(text.contains("[other] asset: FOOxxxxxxxxxxxxx"));
        assert!(text.contains("change: +5000"));
        assert!(text.contains("spent: 100 USDC"));
        assert!(text.contains("acquired: 5000 FOOxxxxx..."));
    }

    #[test]
    fn test_render_without_timestamp() {
        let mut event = buy_event();
        event.timestamp = None;
        event.kind = TransactionType::SolReceive;
        event.native_delta = 0.5;
        event.asset_changes.clear();

        let text = render(&event, &registry());
        assert!(text.contains("Time: unknown"));
        assert!(text.contains("SOL change: +0.500000 SOL"));
        assert!(!text.contains("Asset changes:"));
    }

    #[tokio::test]
    async fn test_dispatch_forwards_to_replaced_sink() {
        let dispatcher = EventDispatcher::with_noop_sink(Arc::new(registry()));
        dispatcher.dispatch(&buy_event()).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        dispatcher
            .set_sink(Arc::new(FnSink::new(move |event: &TransactionEvent| {
                seen_clone.lock().unwrap().push(event.signature.clone());
                Ok(())
            })))
            .await;

        dispatcher.dispatch(&buy_event()).await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sink_error_is_returned_and_dispatcher_stays_usable() {
        let failures = Arc::new(Mutex::new(0));
        let failures_clone = failures.clone();
        let dispatcher = EventDispatcher::new(
            Arc::new(registry()),
            Arc::new(FnSink::new(move |_: &TransactionEvent| {
                *failures_clone.lock().unwrap() += 1;
                Err(WalletMonitorError::SinkError("downstream unavailable".to_string()))
            })),
        );

        assert!(dispatcher.dispatch(&buy_event()).await.is_err());
        assert!(dispatcher.dispatch(&buy_event()).await.is_err());
        assert_eq!(*failures.lock().unwrap(), 2);

        dispatcher.set_sink(Arc::new(NoopSink)).await;
        assert!(dispatcher.dispatch(&buy_event()).await.is_ok());
    }
}
