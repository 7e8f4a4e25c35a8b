//! Monitor configuration.

use crate::common::error::{Result, WalletMonitorError};
use crate::core::asset_registry::ReferenceAssetRegistry;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::env;
use std::str::FromStr;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;
pub const DEFAULT_NOTIFICATION_BUFFER: usize = 1024;

/// Validated monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    /// PubSub websocket endpoint
    pub ws_url: String,
    /// Wallet to monitor
    pub wallet: Pubkey,
    /// Commitment for subscriptions and lookups, "confirmed" by default
    pub commitment: CommitmentConfig,
    /// Upper bound on notifications being fetched and classified at once
    pub max_concurrent_fetches: usize,
    /// Capacity of the notification channel between transport and monitor
    pub notification_buffer: usize,
    pub registry: ReferenceAssetRegistry,
}

impl MonitorConfig {
    /// Reads the configuration from environment variables.
    ///
    /// `WALLET_ADDRESS` is required. `RPC_URL`, `WS_URL`, `MAX_CONCURRENT_FETCHES`,
    /// `NOTIFICATION_BUFFER` and `REFERENCE_ASSETS` (comma separated `mint[:SYMBOL]`
    /// entries added to the mainnet registry) are optional.
    pub fn from_env() -> Result<Self> {
        let wallet = env::var("WALLET_ADDRESS").map_err(|_| {
            WalletMonitorError::ConfigError("Missing environment variable: WALLET_ADDRESS".into())
        })?;

        let mut builder = MonitorConfigBuilder::new()
            .with_rpc(env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()))
            .wallet(wallet);

        if let Ok(ws_url) = env::var("WS_URL") {
            builder = builder.with_ws(ws_url);
        }
        if let Ok(value) = env::var("MAX_CONCURRENT_FETCHES") {
            builder = builder.with_max_concurrency(parse_count("MAX_CONCURRENT_FETCHES", &value)?);
        }
        if let Ok(value) = env::var("NOTIFICATION_BUFFER") {
            builder = builder.with_notification_buffer(parse_count("NOTIFICATION_BUFFER", &value)?);
        }
        if let Ok(value) = env::var("REFERENCE_ASSETS") {
            builder = builder.with_registry(parse_reference_assets(
                &value,
                ReferenceAssetRegistry::mainnet(),
            ));
        }

        builder.build()
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    rpc_url: Option<String>,
    ws_url: Option<String>,
    wallet: Option<String>,
    commitment: Option<CommitmentConfig>,
    max_concurrent_fetches: Option<usize>,
    notification_buffer: Option<usize>,
    registry: Option<ReferenceAssetRegistry>,
}

impl MonitorConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rpc(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    /// Sets the websocket URL. Derived from the RPC URL when not set.
    #[must_use]
    pub fn with_ws(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    #[must_use]
    pub fn wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = Some(wallet.into());
        self
    }

    #[must_use]
    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = Some(commitment);
        self
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrent_fetches: usize) -> Self {
        self.max_concurrent_fetches = Some(max_concurrent_fetches);
        self
    }

    #[must_use]
    pub fn with_notification_buffer(mut self, notification_buffer: usize) -> Self {
        self.notification_buffer = Some(notification_buffer);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ReferenceAssetRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<MonitorConfig> {
        let rpc_url = self
            .rpc_url
            .ok_or_else(|| WalletMonitorError::ConfigError("RPC URL is required".into()))?;
        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(WalletMonitorError::ConfigError(format!(
                "RPC URL must start with http:// or https://, got {rpc_url}"
            )));
        }

        let ws_url = match self.ws_url {
            Some(ws_url) => ws_url,
            None => derive_ws_url(&rpc_url),
        };
        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            return Err(WalletMonitorError::ConfigError(format!(
                "WebSocket URL must start with ws:// or wss://, got {ws_url}"
            )));
        }

        let wallet = self
            .wallet
            .ok_or_else(|| WalletMonitorError::ConfigError("Wallet address is required".into()))?;
        let wallet = Pubkey::from_str(&wallet).map_err(|e| {
            WalletMonitorError::ConfigError(format!("Invalid wallet address {wallet}: {e}"))
        })?;

        let max_concurrent_fetches = self
            .max_concurrent_fetches
            .unwrap_or(DEFAULT_MAX_CONCURRENT_FETCHES);
        let notification_buffer = self
            .notification_buffer
            .unwrap_or(DEFAULT_NOTIFICATION_BUFFER);
        if max_concurrent_fetches == 0 || notification_buffer == 0 {
            return Err(WalletMonitorError::ConfigError(
                "Concurrency and notification buffer must be greater than zero".into(),
            ));
        }

        Ok(MonitorConfig {
            rpc_url,
            ws_url,
            wallet,
            commitment: self.commitment.unwrap_or_else(CommitmentConfig::confirmed),
            max_concurrent_fetches,
            notification_buffer,
            registry: self.registry.unwrap_or_default(),
        })
    }
}

/// `https://host` becomes `wss://host`, `http://host` becomes `ws://host`.
fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        rpc_url.to_string()
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        WalletMonitorError::ConfigError(format!("{name} must be a positive integer, got {value}"))
    })
}

/// Adds `mint[:SYMBOL]` entries to `registry`. Entries without a symbol use the
/// shortened mint as their symbol.
fn parse_reference_assets(value: &str, registry: ReferenceAssetRegistry) -> ReferenceAssetRegistry {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .fold(registry, |registry, entry| match entry.split_once(':') {
            Some((mint, symbol)) => registry.with_asset(mint.trim(), symbol.trim()),
            None => {
                let symbol = registry.display_name(entry);
                registry.with_asset(entry, symbol)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn test_builder_defaults() {
        let config = MonitorConfigBuilder::new()
            .with_rpc("https://api.devnet.solana.com")
            .wallet(WALLET)
            .build()
            .unwrap();

        assert_eq!(config.ws_url, "wss://api.devnet.solana.com");
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert_eq!(config.max_concurrent_fetches, DEFAULT_MAX_CONCURRENT_FETCHES);
        assert_eq!(config.notification_buffer, DEFAULT_NOTIFICATION_BUFFER);
        assert_eq!(config.registry, ReferenceAssetRegistry::mainnet());
        assert_eq!(config.wallet.to_string(), WALLET);
    }

    #[test]
    fn test_local_ws_url_derivation() {
        assert_eq!(derive_ws_url("http://127.0.0.1:8899"), "ws://127.0.0.1:8899");
    }

    #[test]
    fn test_invalid_wallet_rejected() {
        let result = MonitorConfigBuilder::new()
            .with_rpc("https://api.devnet.solana.com")
            .wallet("not-a-wallet")
            .build();
        assert!(matches!(result, Err(WalletMonitorError::ConfigError(_))));
    }

    #[test]
    fn test_missing_wallet_rejected() {
        let result = MonitorConfigBuilder::new()
            .with_rpc("https://api.devnet.solana.com")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_urls_rejected() {
        let result = MonitorConfigBuilder::new()
            .with_rpc("api.devnet.solana.com")
            .wallet(WALLET)
            .build();
        assert!(result.is_err());

        let result = MonitorConfigBuilder::new()
            .with_rpc("https://api.devnet.solana.com")
            .with_ws("https://api.devnet.solana.com")
            .wallet(WALLET)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = MonitorConfigBuilder::new()
            .with_rpc("https://api.devnet.solana.com")
            .wallet(WALLET)
            .with_max_concurrency(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_reference_assets() {
        let registry = parse_reference_assets(
            "FOOmint111:FOO, BARmint2222222 ,,",
            ReferenceAssetRegistry::new("WRAPPED_NATIVE"),
        );
        assert_eq!(registry.symbol("FOOmint111"), Some("FOO"));
        assert_eq!(registry.symbol("BARmint2222222"), Some("BARmint2..."));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("N", " 8 ").unwrap(), 8);
        assert!(parse_count("N", "eight").is_err());
    }
}
