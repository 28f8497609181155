//! Refresh lifecycle for the dashboard
//!
//! Drives the initial load, manual refreshes and the background anomaly
//! ticker. All results go through the [`ViewProjector`] apply points, which
//! discard anything superseded or arriving after teardown.

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::observability::{ConsoleMetrics, StructuredLogger};
use crate::view::{Applied, ViewProjector, ViewState};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};

/// Default cadence of the background anomaly poll
pub const DEFAULT_ANOMALY_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for the polling controller
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between background anomaly polls
    pub anomaly_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            anomaly_interval: DEFAULT_ANOMALY_INTERVAL,
        }
    }
}

/// Result of one initial-load or manual-refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Both fetches succeeded and were applied
    Settled,
    /// A fetch failed and the error was surfaced
    Failed(GatewayError),
    /// A newer cycle already landed, so this one changed nothing
    Superseded,
    /// The controller was torn down, so this one changed nothing
    Closed,
}

/// Result of one background anomaly poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// Fetch failed; nothing was shown to the operator
    Suppressed(GatewayError),
    Superseded,
    Closed,
}

/// Owns the refresh lifecycle of one dashboard view
pub struct PollingController {
    gateway: Arc<dyn Gateway>,
    projector: ViewProjector,
    config: PollingConfig,
    metrics: ConsoleMetrics,
    logger: StructuredLogger,
    shutdown_tx: broadcast::Sender<()>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl PollingController {
    pub fn new(gateway: Arc<dyn Gateway>, config: PollingConfig, logger: StructuredLogger) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(Self {
            gateway,
            projector: ViewProjector::new(),
            config,
            metrics: ConsoleMetrics::new(),
            logger,
            shutdown_tx,
            ticker: Mutex::new(None),
        })
    }

    /// Receive a snapshot after every view transition
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.projector.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.projector.snapshot()
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    /// True while the background ticker is running
    pub fn is_active(&self) -> bool {
        self.ticker_slot().is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.projector.is_closed()
    }

    fn ticker_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bring the view up: start the background ticker and run the initial load
    ///
    /// Calling this on an already active controller only runs a refresh.
    pub async fn activate(self: &Arc<Self>) -> RefreshOutcome {
        if self.is_torn_down() {
            return RefreshOutcome::Closed;
        }
        self.start_ticker();
        self.refresh().await
    }

    /// Run one combined history + anomaly cycle
    ///
    /// Safe to call while another cycle is in flight; whichever cycle was
    /// issued last wins, regardless of completion order.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(token) = self.projector.begin_refresh() else {
            return RefreshOutcome::Closed;
        };
        self.metrics.inc_refresh_cycles();
        self.logger.log_refresh_started(token.value());

        let start = Instant::now();
        let (history, anomaly) = tokio::join!(
            self.gateway.fetch_history(),
            self.gateway.fetch_anomaly_status()
        );
        self.metrics.observe_fetch_latency(start.elapsed().as_secs_f64());

        let result = match (history, anomaly) {
            (Ok(history), Ok(anomaly)) => Ok((history, anomaly)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        let summary = result
            .as_ref()
            .map(|(history, anomaly)| (history.len(), anomaly.is_anomaly))
            .map_err(|e| e.clone());

        match (self.projector.apply_refresh(token, result), summary) {
            (Applied::Applied, Ok((records, is_anomaly))) => {
                self.logger.log_refresh_settled(token.value(), records, is_anomaly);
                RefreshOutcome::Settled
            }
            (Applied::Applied, Err(e)) => {
                self.metrics.inc_refresh_failures();
                self.logger.log_refresh_failed(token.value(), &e.to_string());
                RefreshOutcome::Failed(e)
            }
            (Applied::Stale, _) => {
                self.metrics.inc_stale_responses();
                self.logger.log_response_discarded(token.value(), "refresh");
                RefreshOutcome::Superseded
            }
            (Applied::Closed, _) => RefreshOutcome::Closed,
        }
    }

    /// Fire a refresh without waiting for it
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.refresh().await })
    }

    /// One background tick: refresh the anomaly status alone
    ///
    /// Failures are swallowed; they never touch history, loading or error.
    pub async fn poll_anomaly(&self) -> PollOutcome {
        let Some(token) = self.projector.begin_anomaly_poll() else {
            return PollOutcome::Closed;
        };
        self.metrics.inc_anomaly_polls();

        let start = Instant::now();
        let fetched = self.gateway.fetch_anomaly_status().await;
        self.metrics.observe_fetch_latency(start.elapsed().as_secs_f64());

        let status = match fetched {
            Ok(status) => status,
            Err(e) => {
                self.metrics.inc_anomaly_poll_failures();
                self.logger.log_poll_suppressed(token.value(), &e.to_string());
                return PollOutcome::Suppressed(e);
            }
        };

        let (is_anomaly, current_count) = (status.is_anomaly, status.current_count);
        let was_anomaly = self.projector.anomaly_flag();

        match self.projector.apply_anomaly(token, status) {
            Applied::Applied => {
                if was_anomaly != Some(is_anomaly) {
                    self.logger.log_anomaly_changed(is_anomaly, current_count);
                }
                PollOutcome::Applied
            }
            Applied::Stale => {
                self.metrics.inc_stale_responses();
                self.logger.log_response_discarded(token.value(), "anomaly");
                PollOutcome::Superseded
            }
            Applied::Closed => PollOutcome::Closed,
        }
    }

    fn start_ticker(self: &Arc<Self>) {
        let mut slot = self.ticker_slot();
        if slot.is_some() {
            return;
        }

        let period = self.config.anomaly_interval;
        // The task must not keep the controller alive on its own
        let controller: Weak<Self> = Arc::downgrade(self);
        let mut shutdown = self.shutdown_tx.subscribe();
        // The initial load already fetched anomaly status, so the first tick
        // is one full period out.
        let first_tick = tokio::time::Instant::now() + period;

        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(controller) = controller.upgrade() else {
                            break;
                        };
                        controller.poll_anomaly().await;
                    }
                    _ = shutdown.recv() => {
                        break;
                    }
                }
            }
        }));

        self.logger.log_activated(period.as_secs());
    }

    /// Deactivate the view
    ///
    /// Stops the ticker and closes the projector so responses still in
    /// flight resolve into no-ops.
    pub fn teardown(&self) {
        if self.projector.is_closed() {
            return;
        }
        self.projector.close();
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.ticker_slot().take() {
            handle.abort();
        }

        self.logger.log_teardown("view deactivated");
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        let slot = self.ticker.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}
