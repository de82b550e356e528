//! Live dashboard runtime: timers, ADR fetches and the shared state
//!
//! Architecture: Infrastructure Layer - cancellable tasks keyed to the dashboard's lifetime
//! - Manifest refresh and violation polling run on independent intervals
//! - State lives in a `watch` channel so renderers observe every visible change
//! - Dropping or shutting down the dashboard aborts every task it spawned

use crate::api::DashboardApi;
use crate::config::PollingConfig;
use crate::loader::{load_adr, load_manifest, poll_violations};
use crate::state::{DashboardState, Selection};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// A running dashboard view
pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    state: Arc<watch::Sender<DashboardState>>,
    timers: Vec<JoinHandle<()>>,
    adr_fetch: Mutex<Option<JoinHandle<()>>>,
}

impl Dashboard {
    /// Start both refresh loops. Each loop fires once immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(api: Arc<dyn DashboardApi>, repo_key: impl Into<String>, polling: &PollingConfig) -> Self {
        let repo_key = repo_key.into();
        let (tx, _rx) = watch::channel(DashboardState::new());
        let state = Arc::new(tx);

        tracing::info!(
            "Starting dashboard for '{}' (manifest every {}s, violations every {}s)",
            repo_key,
            polling.manifest_interval_secs,
            polling.violation_interval_secs
        );

        let timers = vec![
            spawn_manifest_refresh(
                api.clone(),
                repo_key.clone(),
                state.clone(),
                polling.manifest_interval(),
            ),
            spawn_violation_poll(api.clone(), repo_key, state.clone(), polling.violation_interval()),
        ];

        Self {
            api,
            state,
            timers,
            adr_fetch: Mutex::new(None),
        }
    }

    /// Change the selection, starting an ADR fetch when an ADR is picked.
    ///
    /// Re-selecting the current selection does nothing. Otherwise any fetch
    /// still running for an earlier selection is aborted; should it complete
    /// anyway, its stale token keeps it out of the state.
    ///
    /// The fetch slot stays locked across the token bump and the spawn, so
    /// concurrent callers cannot abort each other's current fetch.
    pub fn select(&self, selection: Selection) {
        let mut slot = self.adr_fetch.lock().unwrap_or_else(PoisonError::into_inner);

        let mut request = None;
        let changed = self.state.send_if_modified(|s| {
            if *s.selection() == selection {
                return false;
            }
            request = s.select(selection);
            true
        });
        if !changed {
            tracing::debug!("Selection unchanged");
            return;
        }

        if let Some(previous) = slot.take() {
            previous.abort();
        }

        if let Some(request) = request {
            tracing::debug!("Loading ADR '{}' (token {})", request.adr_id, request.token);
            let api = self.api.clone();
            let state = self.state.clone();
            *slot = Some(tokio::spawn(async move {
                let result = load_adr(api.as_ref(), &request.adr_id).await;
                state.send_if_modified(|s| s.apply_adr_result(request.token, result));
            }));
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every visible state change
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Stop all tasks and wait until none of them can touch the state again
    pub async fn shutdown(mut self) {
        let mut handles = std::mem::take(&mut self.timers);
        if let Some(fetch) = self
            .adr_fetch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handles.push(fetch);
        }

        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("Dashboard task ended abnormally: {}", e);
                }
            }
        }
        tracing::info!("Dashboard stopped");
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for handle in &self.timers {
            handle.abort();
        }
        if let Some(fetch) = self
            .adr_fetch
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            fetch.abort();
        }
    }
}

fn ticker(period: Duration) -> time::Interval {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn spawn_manifest_refresh(
    api: Arc<dyn DashboardApi>,
    repo_key: String,
    state: Arc<watch::Sender<DashboardState>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            ticker.tick().await;
            let rules = load_manifest(api.as_ref(), &repo_key).await;
            state.send_if_modified(|s| s.replace_manifest(rules));
        }
    })
}

fn spawn_violation_poll(
    api: Arc<dyn DashboardApi>,
    repo_key: String,
    state: Arc<watch::Sender<DashboardState>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = ticker(period);
        loop {
            ticker.tick().await;
            let result = poll_violations(api.as_ref(), &repo_key).await;
            state.send_if_modified(|s| s.apply_violation_poll(result));
        }
    })
}
