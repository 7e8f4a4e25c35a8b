//! Subscription manager: owns the monitoring session of one wallet.
//!
//! `start` opens a log subscription and spawns a router task. The router drops
//! notifications that arrive after `stop`, applies the log filter, and spawns one
//! task per surviving notification, bounded by a semaphore. Each of those tasks is
//! a fault-isolation boundary: its failure is logged with the signature and never
//! reaches the router or other notifications.
//!
//! When the transport closes the notification stream on its own, the router marks
//! the session as ended. The monitor then reports itself inactive and the next
//! `start` releases the dead subscription and opens a fresh one.

use crate::common::error::{Result, WalletMonitorError};
use crate::common::logging::{self, LogLevel};
use crate::config::MonitorConfig;
use crate::core::asset_registry::ReferenceAssetRegistry;
use crate::core::dispatcher::{EventDispatcher, EventSink, NoopSink};
use crate::core::log_filter;
use crate::core::pipeline::EventPipeline;
use crate::sources::fetcher::TransactionFetcher;
use crate::sources::{AssetAccount, LedgerTransport, SubscriptionHandle};
use crate::types::RawLogNotification;
use solana_sdk::{commitment_config::CommitmentConfig, native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Session state. A subscription handle only exists while a session is active.
enum SessionState {
    Idle,
    Active(MonitorSession),
}

struct MonitorSession {
    tracked_address: Pubkey,
    handle: SubscriptionHandle,
    /// Read by the router before routing each notification. Cleared by `stop`, or
    /// by the router itself when the stream ends.
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
    router: JoinHandle<()>,
}

impl MonitorSession {
    fn is_live(&self) -> bool {
        self.active.load(Ordering::Acquire) && !self.router.is_finished()
    }
}

/// Monitors one wallet and turns its transactions into classified events.
pub struct WalletMonitor {
    transport: Arc<dyn LedgerTransport>,
    registry: Arc<ReferenceAssetRegistry>,
    dispatcher: Arc<EventDispatcher>,
    commitment: CommitmentConfig,
    max_concurrent_fetches: usize,
    state: Mutex<SessionState>,
}

impl WalletMonitor {
    /// Creates a monitor whose events only go to the log.
    #[must_use]
    pub fn new(transport: Arc<dyn LedgerTransport>, config: &MonitorConfig) -> Self {
        Self::with_sink(transport, config, Arc::new(NoopSink))
    }

    /// Creates a monitor that forwards every event to `sink`.
    #[must_use]
    pub fn with_sink(
        transport: Arc<dyn LedgerTransport>,
        config: &MonitorConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let registry = Arc::new(config.registry.clone());
        let dispatcher = Arc::new(EventDispatcher::new(registry.clone(), sink));
        Self {
            transport,
            registry,
            dispatcher,
            commitment: config.commitment,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// Replaces the event sink. Waits for any in-flight dispatch to finish.
    pub async fn set_sink(&self, sink: Arc<dyn EventSink>) {
        self.dispatcher.set_sink(sink).await;
    }

    #[must_use]
    pub fn registry(&self) -> &ReferenceAssetRegistry {
        &self.registry
    }

    /// True while a session is running and its notification stream is open.
    pub async fn is_active(&self) -> bool {
        match &*self.state.lock().await {
            SessionState::Active(session) => session.is_live(),
            SessionState::Idle => false,
        }
    }

    /// Address of the running session, if any.
    pub async fn tracked_address(&self) -> Option<Pubkey> {
        match &*self.state.lock().await {
            SessionState::Active(session) if session.is_live() => Some(session.tracked_address),
            _ => None,
        }
    }

    /// Starts monitoring `address`.
    ///
    /// A no-op when `address` is already being monitored. Fails with
    /// [`WalletMonitorError::SessionConflict`] while another address is monitored,
    /// and with the transport's error when the subscription cannot be opened; the
    /// monitor stays inactive in both cases. A session whose stream has ended is
    /// released first, so `start` resubscribes.
    pub async fn start(&self, address: Pubkey) -> Result<()> {
        let mut state = self.state.lock().await;

        if let SessionState::Active(session) = &*state
            && session.is_live()
        {
            if session.tracked_address == address {
                logging::log(
                    LogLevel::Info,
                    &format!("Already monitoring {address}"),
                );
                return Ok(());
            }
            return Err(WalletMonitorError::SessionConflict(format!(
                "already monitoring {}, stop it before monitoring {address}",
                session.tracked_address
            )));
        }

        if let SessionState::Active(ended) = std::mem::replace(&mut *state, SessionState::Idle) {
            logging::log(
                LogLevel::Warning,
                &format!(
                    "Stream for {} ended, releasing subscription {}",
                    ended.tracked_address, ended.handle
                ),
            );
            self.release(ended).await;
        }

        logging::log(
            LogLevel::Info,
            &format!(
                "Starting monitor for {address} via {}",
                self.transport.transport_name()
            ),
        );

        let subscription = match self.transport.subscribe_logs(&address, self.commitment).await {
            Ok(subscription) => subscription,
            Err(e) => {
                logging::log(
                    LogLevel::Error,
                    &format!("Failed to start monitoring {address}: {e}"),
                );
                return Err(e);
            }
        };

        let pipeline = Arc::new(EventPipeline::new(
            &address,
            TransactionFetcher::new(self.transport.clone(), self.commitment),
            self.registry.clone(),
            self.dispatcher.clone(),
        ));
        let active = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();
        let router = tokio::spawn(route_notifications(
            subscription.notifications,
            pipeline,
            active.clone(),
            cancel.clone(),
            Arc::new(Semaphore::new(self.max_concurrent_fetches)),
        ));

        *state = SessionState::Active(MonitorSession {
            tracked_address: address,
            handle: subscription.handle,
            active,
            cancel,
            router,
        });

        logging::log(
            LogLevel::Success,
            "Monitoring started, waiting for transactions...",
        );
        Ok(())
    }

    /// Stops monitoring. A no-op when no session is active.
    ///
    /// Notifications already being processed run to completion; anything delivered
    /// afterwards is ignored. A failed unsubscribe is logged and the session is
    /// cleared anyway, so a later `start` is never blocked.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;

        let SessionState::Active(session) = std::mem::replace(&mut *state, SessionState::Idle)
        else {
            logging::log(LogLevel::Debug, "Monitor is not running");
            return;
        };

        let tracked_address = session.tracked_address;
        self.release(session).await;

        logging::log(
            LogLevel::Info,
            &format!("Monitoring of {tracked_address} stopped"),
        );
    }

    /// Shuts down the router of `session` and releases its subscription.
    async fn release(&self, session: MonitorSession) {
        session.active.store(false, Ordering::Release);
        session.cancel.cancel();
        if let Err(e) = session.router.await {
            logging::log(
                LogLevel::Warning,
                &format!("Notification router ended abnormally: {e}"),
            );
        }

        if let Err(e) = self.transport.unsubscribe_logs(session.handle).await {
            logging::log(
                LogLevel::Warning,
                &format!("Failed to release subscription {}: {e}", session.handle),
            );
        }
    }

    /// Native balance of `address` in SOL.
    #[allow(clippy::cast_precision_loss)]
    pub async fn wallet_balance(&self, address: &Pubkey) -> Result<f64> {
        let lamports = self.transport.get_native_balance(address).await?;
        Ok(lamports as f64 / LAMPORTS_PER_SOL as f64)
    }

    /// Token accounts held by `address`.
    pub async fn token_balances(&self, address: &Pubkey) -> Result<Vec<AssetAccount>> {
        self.transport.get_asset_accounts(address).await
    }
}

async fn route_notifications(
    mut notifications: mpsc::Receiver<RawLogNotification>,
    pipeline: Arc<EventPipeline>,
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
    limiter: Arc<Semaphore>,
) {
    loop {
        let notification = tokio::select! {
            _ = cancel.cancelled() => break,
            next = notifications.recv() => match next {
                Some(notification) => notification,
                None => {
                    active.store(false, Ordering::Release);
                    logging::log(
                        LogLevel::Warning,
                        "Notification stream ended, monitor is no longer active",
                    );
                    break;
                }
            },
        };

        // Stray delivery after stop
        if !active.load(Ordering::Acquire) {
            continue;
        }
        if !log_filter::passes(&notification.lines) {
            continue;
        }

        // Waiting for a permit stops draining the channel, which pushes back on the
        // transport
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = limiter.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = pipeline.process(&notification).await {
                logging::log(
                    LogLevel::Error,
                    &format!(
                        "Failed to process transaction {}: {e}",
                        notification.signature
                    ),
                );
            }
        });
    }
}
