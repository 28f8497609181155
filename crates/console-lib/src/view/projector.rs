//! Token-guarded view state
//!
//! The projector is the only writer of [`ViewState`]. Every fetch is issued a
//! [`CycleToken`] from one monotonic counter, and every apply point compares
//! that token against what has already been applied while holding the ledger
//! lock. Subscribers receive whole snapshots over a `watch` channel and never
//! observe a half-applied transition.

use crate::error::{GatewayError, REFRESH_FAILED};
use crate::models::{AnomalyStatus, PredictionRecord};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// Lifecycle of the refresh state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Loading,
    Settled,
    Failed,
}

/// Everything the dashboard renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub history: Vec<PredictionRecord>,
    pub anomaly: Option<AnomalyStatus>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: RefreshPhase,
}

/// Identifier of one issued fetch, ordered by issue time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleToken(u64);

impl CycleToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What happened to a result handed to an apply point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The view was updated
    Applied,
    /// A newer result already landed, nothing changed
    Stale,
    /// The projector was closed, nothing changed
    Closed,
}

#[derive(Debug, Default)]
struct Ledger {
    next_token: u64,
    latest_refresh: u64,
    applied_refresh: u64,
    applied_anomaly: u64,
    closed: bool,
}

impl Ledger {
    fn issue(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

/// Owner of the single [`ViewState`]
#[derive(Debug)]
pub struct ViewProjector {
    ledger: Mutex<Ledger>,
    state: watch::Sender<ViewState>,
}

impl Default for ViewProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewProjector {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            ledger: Mutex::new(Ledger::default()),
            state,
        }
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Whether the currently shown anomaly status is flagged
    pub fn anomaly_flag(&self) -> Option<bool> {
        self.state.borrow().anomaly.as_ref().map(|a| a.is_anomaly)
    }

    pub fn is_closed(&self) -> bool {
        self.ledger().closed
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // A poisoned ledger only means a panic elsewhere mid-update; the
        // counters themselves are always consistent.
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a combined history + anomaly cycle
    ///
    /// Marks the view as loading and clears the previous cycle's error.
    /// Returns `None` once the projector is closed.
    pub fn begin_refresh(&self) -> Option<CycleToken> {
        let mut ledger = self.ledger();
        if ledger.closed {
            return None;
        }
        let token = ledger.issue();
        ledger.latest_refresh = token;

        self.state.send_modify(|view| {
            view.loading = true;
            view.error = None;
            view.phase = RefreshPhase::Loading;
        });
        Some(CycleToken(token))
    }

    /// Reserve a token for a standalone anomaly poll
    ///
    /// Does not touch the view.
    pub fn begin_anomaly_poll(&self) -> Option<CycleToken> {
        let mut ledger = self.ledger();
        if ledger.closed {
            return None;
        }
        Some(CycleToken(ledger.issue()))
    }

    /// Apply the result of a combined cycle
    ///
    /// A success replaces history and anomaly together unless a newer cycle
    /// already landed. The anomaly half is skipped when a standalone poll
    /// issued after this cycle has already been applied. A failure only
    /// counts when it belongs to the most recently issued cycle; it sets the
    /// error and keeps whatever data is on screen.
    pub fn apply_refresh(
        &self,
        token: CycleToken,
        result: Result<(Vec<PredictionRecord>, AnomalyStatus), GatewayError>,
    ) -> Applied {
        let mut ledger = self.ledger();
        if ledger.closed {
            return Applied::Closed;
        }
        if token.0 <= ledger.applied_refresh {
            return Applied::Stale;
        }

        let is_latest = token.0 == ledger.latest_refresh;
        match result {
            Ok((history, anomaly)) => {
                ledger.applied_refresh = token.0;
                let fresher_anomaly = token.0 > ledger.applied_anomaly;
                if fresher_anomaly {
                    ledger.applied_anomaly = token.0;
                }

                self.state.send_modify(|view| {
                    view.history = history;
                    if fresher_anomaly {
                        view.anomaly = Some(anomaly);
                    }
                    if is_latest {
                        view.loading = false;
                        view.error = None;
                        view.phase = RefreshPhase::Settled;
                    }
                });
                Applied::Applied
            }
            Err(_) if !is_latest => Applied::Stale,
            Err(_) => {
                ledger.applied_refresh = token.0;
                self.state.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(REFRESH_FAILED.to_string());
                    view.phase = RefreshPhase::Failed;
                });
                Applied::Applied
            }
        }
    }

    /// Replace the anomaly status from a standalone poll
    pub fn apply_anomaly(&self, token: CycleToken, status: AnomalyStatus) -> Applied {
        let mut ledger = self.ledger();
        if ledger.closed {
            return Applied::Closed;
        }
        if token.0 <= ledger.applied_anomaly {
            return Applied::Stale;
        }
        ledger.applied_anomaly = token.0;

        self.state.send_modify(|view| view.anomaly = Some(status));
        Applied::Applied
    }

    /// Refuse every later apply, including for tokens already issued
    pub fn close(&self) {
        self.ledger().closed = true;
    }
}
