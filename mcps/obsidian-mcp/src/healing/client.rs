//! Self-healing wrapper around [`ObsidianClient`]
//!
//! The client owns the active URL and the REST client bound to it. A
//! background task checks the active URL every `retry_interval`; a failed
//! check triggers [`SelfHealingClient::attempt_reconnect`], which probes the
//! other candidates and swaps to the fastest one that answers.
//!
//! Domain calls are plain delegations to whichever client is active when
//! the call starts. They never reconnect inline; a failure is noticed by the
//! next health check.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::probe::{probe_all, select_best};
use super::{HealingError, HealthSnapshot, SelfHealingConfig};
use crate::client::{ApiError, ApiResult, Note, NoteApi, NoteJson, ObsidianClient, ServerStatus};

/// URL currently in use and the client bound to it; always swapped together
#[derive(Clone)]
struct Active {
    url: String,
    client: Arc<ObsidianClient>,
}

/// State shared with the monitoring task
struct Shared {
    config: SelfHealingConfig,
    active: RwLock<Active>,
    reconnecting: AtomicBool,
    reconnect_count: AtomicU32,
    last_health_check: RwLock<DateTime<Utc>>,
}

/// Clears the reconnect flag however the reconnect routine exits
struct ReconnectGuard<'a>(&'a AtomicBool);

impl Drop for ReconnectGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn active(&self) -> Active {
        read(&self.active).clone()
    }

    /// Rebind to `url`; resets the reconnect counter
    fn switch_to(&self, url: &str) -> Result<Arc<ObsidianClient>, ApiError> {
        let client = Arc::new(ObsidianClient::new(url, &self.config.api_key)?);

        *write(&self.active) = Active {
            url: url.to_string(),
            client: Arc::clone(&client),
        };
        self.reconnect_count.store(0, Ordering::Release);

        Ok(client)
    }

    async fn check_health(&self) {
        *write(&self.last_health_check) = Utc::now();

        let Active { url, client } = self.active();
        match client.get_server_info().await {
            Ok(_) => tracing::debug!(url = %url, "Health check passed"),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Health check failed");
                self.reconnect_from(Some(&url)).await;
            }
        }
    }

    /// Reconnect; with `failed` set, only if that URL is still the active one
    async fn reconnect_from(&self, failed: Option<&str>) {
        if self
            .reconnecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Reconnection already in progress, skipping");
            return;
        }
        let _guard = ReconnectGuard(&self.reconnecting);

        if let Some(failed) = failed {
            let current = self.active().url;
            if current != failed {
                tracing::debug!(
                    failed,
                    url = %current,
                    "Stale health check failure, already switched"
                );
                return;
            }
        }

        let attempt = self.reconnect_count.fetch_add(1, Ordering::AcqRel) + 1;
        let current = self.active().url;
        tracing::info!(attempt, url = %current, "Attempting reconnection");

        let alternatives: Vec<String> = self
            .config
            .urls
            .iter()
            .filter(|url| **url != current)
            .cloned()
            .collect();

        if alternatives.is_empty() {
            tracing::warn!("No alternative URLs available");
            return;
        }

        let results = probe_all(
            &alternatives,
            &self.config.api_key,
            self.config.test_timeout,
        )
        .await;

        let Some(best) = select_best(&results) else {
            tracing::warn!(attempt, "No working alternative URLs found");
            return;
        };

        tracing::info!(from = %current, to = %best, "Switching to alternative URL");
        let client = match self.switch_to(&best) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(url = %best, error = %e, "Failed to rebuild client");
                return;
            }
        };

        match client.get_server_info().await {
            Ok(_) => tracing::info!(url = %best, "Reconnected"),
            Err(e) => tracing::warn!(url = %best, error = %e, "Reconnection verification failed"),
        }
    }
}

/// REST client that picks the fastest candidate URL and fails over on its own
pub struct SelfHealingClient {
    shared: Arc<Shared>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl SelfHealingClient {
    /// Create an uninitialized client bound to the first candidate
    pub fn new(config: SelfHealingConfig) -> Result<Self, HealingError> {
        let first = config.urls.first().ok_or(HealingError::NoCandidates)?.clone();
        let client = Arc::new(ObsidianClient::new(&first, &config.api_key)?);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                active: RwLock::new(Active { url: first, client }),
                reconnecting: AtomicBool::new(false),
                reconnect_count: AtomicU32::new(0),
                last_health_check: RwLock::new(Utc::now()),
            }),
            monitor: Mutex::new(None),
        })
    }

    /// Probe all candidates, bind to the fastest, start monitoring, verify
    ///
    /// Fails when no candidate answers (no monitoring is started then) or
    /// when the final verification call fails (monitoring keeps running and
    /// will try to recover on its own).
    pub async fn initialize(&self) -> Result<(), HealingError> {
        let config = &self.shared.config;
        tracing::info!(candidates = config.urls.len(), "Initializing self-healing client");

        let results = probe_all(&config.urls, &config.api_key, config.test_timeout).await;
        let best = select_best(&results).ok_or_else(|| HealingError::NoReachableEndpoint {
            tried: config.urls.clone(),
        })?;

        tracing::info!(url = %best, "Selected best URL");
        let client = self.shared.switch_to(&best)?;

        self.start_monitoring();

        client
            .get_server_info()
            .await
            .map_err(|source| HealingError::Verification {
                url: best.clone(),
                source,
            })?;

        tracing::info!(url = %best, "Connected to Obsidian API");
        Ok(())
    }

    fn start_monitoring(&self) {
        let mut slot = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let period = self.shared.config.retry_interval.max(Duration::from_millis(1));
        let shared = Arc::downgrade(&self.shared);

        *slot = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                // each tick runs on its own so ticks stay periodic; overlapping
                // reconnects are absorbed by the reconnect flag
                tokio::spawn(async move { shared.check_health().await });
            }
        }));

        tracing::info!(
            interval_ms = period.as_millis() as u64,
            "Started health monitoring"
        );
    }

    /// Fail over to the fastest other candidate
    ///
    /// Single-flight: while one attempt runs, further calls return at once.
    pub async fn attempt_reconnect(&self) {
        self.shared.reconnect_from(None).await;
    }

    /// Current health snapshot
    pub fn health(&self) -> HealthSnapshot {
        let reconnect_count = self.shared.reconnect_count.load(Ordering::Acquire);
        HealthSnapshot {
            healthy: reconnect_count == 0,
            url: self.current_url(),
            last_check: *read(&self.shared.last_health_check),
            reconnect_count,
        }
    }

    /// URL currently in use
    pub fn current_url(&self) -> String {
        read(&self.shared.active).url.clone()
    }

    /// REST client bound to the current URL
    pub fn api_client(&self) -> Arc<ObsidianClient> {
        Arc::clone(&read(&self.shared.active).client)
    }

    /// Whether the periodic health check is scheduled
    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop monitoring; idempotent. Leaves URL and health fields as they are.
    pub fn destroy(&self) {
        let handle = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            tracing::info!("Stopping health monitoring");
            handle.abort();
        }

        self.shared.reconnecting.store(false, Ordering::Release);
    }
}

impl Drop for SelfHealingClient {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[async_trait]
impl NoteApi for SelfHealingClient {
    async fn read_note(&self, path: &str) -> ApiResult<Note> {
        self.api_client().read_note(path).await
    }

    async fn search_notes(&self, query: &str) -> ApiResult<Vec<Note>> {
        self.api_client().search_notes(query).await
    }

    async fn write_note(&self, path: &str, content: &str) -> ApiResult<()> {
        self.api_client().write_note(path, content).await
    }

    async fn get_metadata(&self, path: &str) -> ApiResult<NoteJson> {
        self.api_client().get_metadata(path).await
    }

    async fn get_server_info(&self) -> ApiResult<ServerStatus> {
        self.api_client().get_server_info().await
    }
}
