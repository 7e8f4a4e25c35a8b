//! Wallet monitor command-line application.
//!
//! Configured through environment variables (see `MonitorConfig::from_env`), loaded
//! from a `.env` file when present.

#![warn(clippy::all, clippy::pedantic)]

use solana_wallet_monitor::{
    FnSink, MonitorConfig, SolanaRpcTransport, TransactionEvent, WalletMonitor,
    WalletMonitorError,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env()?;

    println!("Initializing wallet monitor...");
    println!("RPC URL: {}", config.rpc_url);
    println!("WebSocket URL: {}", config.ws_url);
    println!("Wallet: {}", config.wallet);

    let transport = Arc::new(SolanaRpcTransport::from_config(&config));
    let sink = FnSink::new(|event: &TransactionEvent| {
        let line = event
            .to_json()
            .map_err(|e| WalletMonitorError::SinkError(e.to_string()))?;
        println!("{line}");
        Ok(())
    });
    let monitor = WalletMonitor::with_sink(transport, &config, Arc::new(sink));

    match monitor.wallet_balance(&config.wallet).await {
        Ok(balance) => println!("SOL balance: {balance:.6}"),
        Err(e) => eprintln!("Failed to fetch SOL balance: {e}"),
    }
    match monitor.token_balances(&config.wallet).await {
        Ok(accounts) => {
            for account in accounts.iter().filter(|account| account.ui_amount > 0.0) {
                println!(
                    "  {} {}",
                    account.ui_amount,
                    monitor.registry().display_name(&account.asset_id)
                );
            }
        }
        Err(e) => eprintln!("Failed to fetch token balances: {e}"),
    }

    monitor.start(config.wallet).await?;

    println!("Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    println!("\nStopping monitor...");
    monitor.stop().await;

    Ok(())
}
