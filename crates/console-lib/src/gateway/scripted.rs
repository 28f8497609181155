//! Scripted gateway for tests
//!
//! Each call pops the next scripted response for its endpoint. Responses can
//! be pre-resolved or held open through a oneshot sender, which lets tests
//! choose the order in which concurrent requests complete.

use super::Gateway;
use crate::error::{GatewayError, Result};
use crate::models::{AnomalyStatus, PredictionRecord, PredictionResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

type Pending<T> = oneshot::Receiver<Result<T>>;

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    history: Mutex<VecDeque<Pending<Vec<PredictionRecord>>>>,
    anomaly: Mutex<VecDeque<Pending<AnomalyStatus>>>,
    predictions: Mutex<VecDeque<Result<PredictionResult>>>,
    history_calls: AtomicUsize,
    anomaly_calls: AtomicUsize,
    predict_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a history response that resolves immediately
    pub(crate) fn push_history(&self, result: Result<Vec<PredictionRecord>>) {
        let _ = self.hold_history().send(result);
    }

    /// Queue a history response resolved later through the returned sender
    pub(crate) fn hold_history(&self) -> oneshot::Sender<Result<Vec<PredictionRecord>>> {
        let (tx, rx) = oneshot::channel();
        self.history.lock().unwrap().push_back(rx);
        tx
    }

    pub(crate) fn push_anomaly(&self, result: Result<AnomalyStatus>) {
        let _ = self.hold_anomaly().send(result);
    }

    pub(crate) fn hold_anomaly(&self) -> oneshot::Sender<Result<AnomalyStatus>> {
        let (tx, rx) = oneshot::channel();
        self.anomaly.lock().unwrap().push_back(rx);
        tx
    }

    pub(crate) fn push_prediction(&self, result: Result<PredictionResult>) {
        self.predictions.lock().unwrap().push_back(result);
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn anomaly_calls(&self) -> usize {
        self.anomaly_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }
}

async fn resolve<T>(pending: Option<Pending<T>>) -> Result<T> {
    match pending {
        Some(rx) => rx
            .await
            .unwrap_or_else(|_| Err(GatewayError::Transport("response dropped".to_string()))),
        None => Err(GatewayError::Transport("nothing scripted".to_string())),
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn submit_prediction(&self, _error_message: &str, _user_count: u32) -> Result<PredictionResult> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.predictions.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(GatewayError::Transport("nothing scripted".to_string())))
    }

    async fn fetch_history(&self) -> Result<Vec<PredictionRecord>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.history.lock().unwrap().pop_front();
        resolve(next).await
    }

    async fn fetch_anomaly_status(&self) -> Result<AnomalyStatus> {
        self.anomaly_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.anomaly.lock().unwrap().pop_front();
        resolve(next).await
    }
}
