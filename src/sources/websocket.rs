//! Solana RPC transport for real-time wallet monitoring
//!
//! Subscriptions go through the PubSub websocket (`logsSubscribe`); lookups go
//! through the JSON-RPC HTTP endpoint.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Value, json};
use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcTransactionConfig, RpcTransactionLogsConfig, RpcTransactionLogsFilter,
};
use solana_client::rpc_request::{RpcRequest, TokenAccountsFilter};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_util::sync::CancellationToken;

use super::{
    AssetAccount, LedgerTransport, LogSubscription, SubscriptionHandle, TransactionFetchConfig,
};
use crate::common::error::{Result, WalletMonitorError};
use crate::common::logging::{self, LogLevel};
use crate::config::MonitorConfig;
use crate::types::{RawLogNotification, TransactionRecord};

const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Upper bound on releasing a subscription, so a dead socket cannot hang `stop`.
const UNSUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Solana node transport
///
/// Each subscription owns its own PubSub connection and a forwarding task that
/// pushes notifications into a bounded channel. A full channel suspends the
/// forwarding task rather than dropping notifications.
pub struct SolanaRpcTransport {
    /// WebSocket URL (ws:// or wss://)
    ws_url: String,
    rpc: Arc<RpcClient>,
    /// Capacity of each subscription's notification channel
    notification_buffer: usize,
    next_handle: AtomicU64,
    subscriptions: Mutex<HashMap<SubscriptionHandle, ForwardingTask>>,
}

/// Background task bridging one PubSub stream into a channel
struct ForwardingTask {
    cancel: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl SolanaRpcTransport {
    /// Creates a new transport
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - HTTP JSON-RPC URL (e.g., "https://api.mainnet-beta.solana.com")
    /// * `ws_url` - WebSocket URL (e.g., "wss://api.mainnet-beta.solana.com")
    /// * `commitment` - Commitment used for balance lookups
    /// * `notification_buffer` - Capacity of each subscription's channel
    pub fn new(
        rpc_url: impl Into<String>,
        ws_url: impl Into<String>,
        commitment: CommitmentConfig,
        notification_buffer: usize,
    ) -> Self {
        Self {
            ws_url: ws_url.into(),
            rpc: Arc::new(RpcClient::new_with_commitment(rpc_url.into(), commitment)),
            notification_buffer: notification_buffer.max(1),
            next_handle: AtomicU64::new(0),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.rpc_url.clone(),
            config.ws_url.clone(),
            config.commitment,
            config.notification_buffer,
        )
    }

    /// Number of subscriptions currently open.
    pub async fn open_subscriptions(&self) -> usize {
        self.subscriptions.lock().await.len()
    }
}

#[async_trait]
impl LedgerTransport for SolanaRpcTransport {
    async fn subscribe_logs(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<LogSubscription> {
        logging::log(
            LogLevel::Info,
            &format!("Connecting to WebSocket: {}", self.ws_url),
        );

        let client = PubsubClient::new(&self.ws_url).await?;

        let (sender, receiver) = mpsc::channel(self.notification_buffer);
        let (ready_tx, ready_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let filter = RpcTransactionLogsFilter::Mentions(vec![address.to_string()]);
        let config = RpcTransactionLogsConfig {
            commitment: Some(commitment),
        };
        let task = tokio::spawn(forward_logs(
            client,
            filter,
            config,
            sender,
            ready_tx,
            cancel.clone(),
        ));

        // Setup errors belong to the caller, not to the background task
        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(WalletMonitorError::TransportError(
                    "Log subscription task exited before confirming".to_string(),
                ));
            }
        }

        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.subscriptions
            .lock()
            .await
            .insert(handle, ForwardingTask { cancel, task });

        logging::log(
            LogLevel::Success,
            &format!("Log subscription {handle} open for {address}"),
        );

        Ok(LogSubscription {
            handle,
            notifications: receiver,
        })
    }

    async fn unsubscribe_logs(&self, handle: SubscriptionHandle) -> Result<()> {
        let Some(forwarding) = self.subscriptions.lock().await.remove(&handle) else {
            return Err(WalletMonitorError::TransportError(format!(
                "Unknown subscription {handle}"
            )));
        };

        join_forwarding(handle, forwarding, UNSUBSCRIBE_TIMEOUT).await
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
        config: TransactionFetchConfig,
    ) -> Result<Option<TransactionRecord>> {
        let rpc_config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(config.commitment),
            max_supported_transaction_version: config.max_supported_transaction_version,
        };

        // A pruned or not yet confirmed transaction comes back as `null`
        let response: Option<EncodedConfirmedTransactionWithStatusMeta> = self
            .rpc
            .send(
                RpcRequest::GetTransaction,
                json!([signature.to_string(), rpc_config]),
            )
            .await?;

        Ok(response.and_then(|tx| TransactionRecord::from_encoded(signature.to_string(), tx)))
    }

    async fn get_native_balance(&self, address: &Pubkey) -> Result<u64> {
        let response = self
            .rpc
            .get_balance_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value)
    }

    async fn get_asset_accounts(&self, owner: &Pubkey) -> Result<Vec<AssetAccount>> {
        let token_program = Pubkey::from_str(SPL_TOKEN_PROGRAM_ID)
            .map_err(|e| WalletMonitorError::ConfigError(format!("Token program id: {e}")))?;

        let accounts = self
            .rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(token_program))
            .await?;

        Ok(accounts
            .iter()
            .filter_map(|keyed| parse_asset_account(&keyed.account.data))
            .collect())
    }

    fn transport_name(&self) -> &'static str {
        "Solana RPC"
    }
}

/// Cancels a forwarding task and waits up to `limit` for it to finish. A task that
/// overruns is aborted so it cannot linger on a dead socket.
async fn join_forwarding(
    handle: SubscriptionHandle,
    forwarding: ForwardingTask,
    limit: Duration,
) -> Result<()> {
    forwarding.cancel.cancel();
    let abort = forwarding.task.abort_handle();
    match timeout(limit, forwarding.task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(WalletMonitorError::TransportError(format!(
            "Subscription {handle} task failed: {e}"
        ))),
        Err(_) => {
            abort.abort();
            Err(WalletMonitorError::TransportError(format!(
                "Timed out releasing subscription {handle}"
            )))
        }
    }
}

/// Runs one PubSub subscription until cancelled or until the receiver goes away.
async fn forward_logs(
    client: PubsubClient,
    filter: RpcTransactionLogsFilter,
    config: RpcTransactionLogsConfig,
    sender: mpsc::Sender<RawLogNotification>,
    ready: oneshot::Sender<Result<()>>,
    cancel: CancellationToken,
) -> Result<()> {
    let (mut stream, unsubscribe) = match client.logs_subscribe(filter, config).await {
        Ok(subscription) => subscription,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return Ok(());
        }
    };

    if ready.send(Ok(())).is_ok() {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                item = stream.next() => {
                    let Some(response) = item else {
                        logging::log(LogLevel::Warning, "Log stream closed by the node");
                        break;
                    };

                    let notification = RawLogNotification {
                        signature: response.value.signature,
                        lines: response.value.logs,
                        slot: response.context.slot,
                        failed: response.value.err.is_some(),
                    };
                    if sender.send(notification).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    drop(stream);
    unsubscribe().await;
    client.shutdown().await?;
    Ok(())
}

/// Reads mint and amount from a `jsonParsed` SPL token account.
fn parse_asset_account(data: &UiAccountData) -> Option<AssetAccount> {
    let UiAccountData::Json(parsed) = data else {
        return None;
    };

    let info = parsed.parsed.get("info")?;
    let token_amount = info.get("tokenAmount")?;

    Some(AssetAccount {
        asset_id: info.get("mint")?.as_str()?.to_string(),
        ui_amount: token_amount
            .get("uiAmount")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        decimals: u8::try_from(token_amount.get("decimals")?.as_u64()?).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_account_decoder::parse_account_data::ParsedAccount;

    #[tokio::test]
    async fn test_transport_creation() {
        let transport = SolanaRpcTransport::new(
            "http://127.0.0.1:8899",
            "ws://127.0.0.1:8900",
            CommitmentConfig::confirmed(),
            0,
        );

        assert_eq!(transport.ws_url, "ws://127.0.0.1:8900");
        assert_eq!(transport.notification_buffer, 1);
        assert_eq!(transport.open_subscriptions().await, 0);
        assert_eq!(transport.transport_name(), "Solana RPC");
    }

    #[tokio::test]
    async fn test_unknown_handle_is_a_transport_error() {
        let transport = SolanaRpcTransport::new(
            "http://127.0.0.1:8899",
            "ws://127.0.0.1:8900",
            CommitmentConfig::confirmed(),
            16,
        );

        let result = transport.unsubscribe_logs(SubscriptionHandle(7)).await;
        assert!(matches!(result, Err(WalletMonitorError::TransportError(_))));
    }

    #[tokio::test]
    async fn test_stuck_forwarding_task_is_aborted() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        // ignores cancellation, like a task stuck on a dead socket
        let task = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
            Ok(())
        });
        let forwarding = ForwardingTask {
            cancel: CancellationToken::new(),
            task,
        };

        let result =
            join_forwarding(SubscriptionHandle(3), forwarding, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(WalletMonitorError::TransportError(_))));

        // the sender is dropped once the aborted task is torn down
        let closed = timeout(Duration::from_secs(1), alive_rx).await;
        assert!(matches!(closed, Ok(Err(_))));
    }

    #[tokio::test]
    async fn test_cooperative_forwarding_task_joins_cleanly() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            token.cancelled().await;
            Ok(())
        });

        let result = join_forwarding(
            SubscriptionHandle(4),
            ForwardingTask { cancel, task },
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_asset_account() {
        let data = UiAccountData::Json(ParsedAccount {
            program: "spl-token".to_string(),
            parsed: json!({
                "type": "account",
                "info": {
                    "mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                    "owner": "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
                    "tokenAmount": {
                        "amount": "1500000",
                        "decimals": 6,
                        "uiAmount": 1.5,
                        "uiAmountString": "1.5"
                    }
                }
            }),
            space: 165,
        });

        let account = parse_asset_account(&data).unwrap();
        assert_eq!(account.asset_id, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        assert_eq!(account.ui_amount, 1.5);
        assert_eq!(account.decimals, 6);
    }

    #[test]
    fn test_parse_asset_account_rejects_binary_data() {
        let data = UiAccountData::LegacyBinary(String::new());
        assert!(parse_asset_account(&data).is_none());
    }
}
