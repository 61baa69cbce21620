//! Snapshot persistence
//!
//! Two sinks, one coordinator. Every data-change event writes the local JSON
//! mirror immediately and re-arms a debounce timer; when the timer fires the
//! whole snapshot goes to the remote blob store. An autosave interval saves
//! unconditionally as a safety net. Save failures surface as `Status` events
//! and never block editing.
//!
//! The [`PersistenceCoordinator::run`] loop is for long-running embedders
//! with a live editing session. The one-shot CLI subcommands instead write
//! the mirror and remote snapshot explicitly at the end of each command;
//! there is no edit burst to debounce in that mode.

use async_trait::async_trait;
use prio_common::events::{AppEvent, EventBus};
use prio_common::model::Snapshot;
use prio_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Sleep;

use crate::store::RecordStore;

/// Whole-document snapshot storage
///
/// Load-all / save-all; there is no partial update. Implementations must
/// tolerate concurrent callers.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch the stored snapshot; `None` when nothing has been saved yet
    async fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Envelope used by the blob-storage service in both directions
#[derive(Debug, Deserialize)]
struct StorageEnvelope {
    data: Snapshot,
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    #[serde(default)]
    ok: bool,
}

/// `SnapshotStore` backed by the HTTP blob-storage service
///
/// `GET {base}/storage/load` returns `{"data": {...}}`; a never-saved slot
/// comes back as an empty sentinel document rather than a 404. `POST
/// {base}/storage/save` takes the same envelope.
pub struct HttpSnapshotStore {
    http_client: reqwest::Client,
    base_url: String,
    /// Shared secret presented on every request; the service side checks it
    /// with a `SecretGate`
    secret: Option<String>,
}

impl HttpSnapshotStore {
    pub fn new(base_url: String, secret: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.secret {
            Some(secret) => request.header("x-prio-secret", secret),
            None => request,
        }
    }
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let url = format!("{}/storage/load", self.base_url);
        let response = self
            .authorized(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("load failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Persistence(format!("load failed: HTTP {status}")));
        }
        let envelope: StorageEnvelope = response
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("load returned invalid JSON: {e}")))?;
        // Empty sentinel means the slot was never written.
        if envelope.data.is_empty() {
            return Ok(None);
        }
        Ok(Some(envelope.data))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let url = format!("{}/storage/save", self.base_url);
        let response = self
            .authorized(self.http_client.post(&url))
            .json(&serde_json::json!({ "data": snapshot }))
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("save failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Persistence(format!("save failed: HTTP {status}")));
        }
        let body: SaveResponse = response
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("save returned invalid JSON: {e}")))?;
        if !body.ok {
            return Err(Error::Persistence("save rejected by storage service".into()));
        }
        Ok(())
    }
}

/// Write the local snapshot mirror, creating parent directories as needed
pub fn write_mirror(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| Error::Persistence(format!("snapshot serialization failed: {e}")))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read the local snapshot mirror; `None` when the file does not exist
pub fn read_mirror(path: &Path) -> Result<Option<Snapshot>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot = serde_json::from_str(&text)
        .map_err(|e| Error::Persistence(format!("corrupt mirror {}: {e}", path.display())))?;
    Ok(Some(snapshot))
}

/// Drives the save pipeline off the event bus
///
/// Data-change events mirror locally at once and re-arm (never stack) the
/// debounce timer; the remote save happens when the quiet period elapses or
/// the autosave interval ticks, whichever comes first.
pub struct PersistenceCoordinator {
    store: Arc<RwLock<RecordStore>>,
    remote: Arc<dyn SnapshotStore>,
    mirror_path: PathBuf,
    debounce: Duration,
    autosave: Duration,
    bus: EventBus,
}

impl PersistenceCoordinator {
    pub fn new(
        store: Arc<RwLock<RecordStore>>,
        remote: Arc<dyn SnapshotStore>,
        mirror_path: PathBuf,
        debounce: Duration,
        autosave: Duration,
        bus: EventBus,
    ) -> Self {
        Self {
            store,
            remote,
            mirror_path,
            debounce,
            autosave,
            bus,
        }
    }

    /// Pull the remote snapshot and, when it holds data, replace local state.
    /// Returns whether a snapshot was applied.
    pub async fn load_remote(&self) -> Result<bool> {
        match self.remote.load().await? {
            Some(snapshot) => {
                tracing::info!(rows = snapshot.rows.len(), "Applying remote snapshot");
                self.store.write().await.restore(snapshot);
                Ok(true)
            }
            None => {
                tracing::info!("Remote store is empty; keeping local state");
                Ok(false)
            }
        }
    }

    /// Save the current snapshot to the remote store immediately
    pub async fn save_remote(&self) -> Result<()> {
        let snapshot = self.store.read().await.snapshot();
        self.remote.save(&snapshot).await?;
        tracing::debug!(rows = snapshot.rows.len(), "Remote snapshot saved");
        Ok(())
    }

    async fn write_mirror_now(&self) {
        let snapshot = self.store.read().await.snapshot();
        if let Err(e) = write_mirror(&self.mirror_path, &snapshot) {
            tracing::warn!(path = %self.mirror_path.display(), error = %e, "Mirror write failed");
            self.bus.emit(AppEvent::Status {
                message: format!("local mirror write failed: {e}"),
            });
        }
    }

    async fn save_remote_logged(&self) {
        if let Err(e) = self.save_remote().await {
            tracing::warn!(error = %e, "Remote save failed");
            self.bus.emit(AppEvent::Status {
                message: format!("remote save failed: {e}"),
            });
        }
    }

    /// Run the save loop until every bus sender is gone
    pub async fn run(self) {
        let mut rx = self.bus.subscribe();
        // interval_at so the first autosave waits a full period.
        let mut autosave = tokio::time::interval_at(
            tokio::time::Instant::now() + self.autosave,
            self.autosave,
        );
        autosave.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut pending: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Ok(event) if event.is_data_change() => {
                        self.write_mirror_now().await;
                        // Re-arm: one timer, pushed back by each new edit.
                        pending = Some(Box::pin(tokio::time::sleep(self.debounce)));
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Persistence subscriber lagged; forcing save");
                        self.write_mirror_now().await;
                        pending = Some(Box::pin(tokio::time::sleep(self.debounce)));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = async {
                    match pending.as_mut() {
                        Some(timer) => timer.await,
                        None => std::future::pending().await,
                    }
                } => {
                    pending = None;
                    self.save_remote_logged().await;
                }
                _ = autosave.tick() => {
                    self.save_remote_logged().await;
                }
            }
        }

        // Final flush so a clean shutdown never loses the last burst.
        if pending.is_some() {
            self.save_remote_logged().await;
        }
    }
}
