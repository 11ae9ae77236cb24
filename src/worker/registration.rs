//! Registration host: runs workers through install, waiting and activation
//!
//! A registration owns at most one active and one waiting worker, the set of
//! open clients, and the cache storage the workers share. Lifecycle events
//! are delivered through the [`HandlerTable`], one at a time, because every
//! lifecycle method takes `&mut self`.

use crate::cache::CacheStorage;
use crate::config::{write_atomic, StatePaths};
use crate::error::{B64Error, B64Result};
use crate::net::{Network, Request, Response};
use crate::worker::dispatch::HandlerTable;
use crate::worker::event::{Event, EventOutcome, FetchOutcome, Message, ServedFrom};
use crate::worker::manager::OfflineCacheManager;
use crate::worker::manifest::CacheManifest;
use crate::worker::state::{WorkerRecord, WorkerState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

/// A page controlled (or not yet controlled) by a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Uuid,
    pub url: String,
    /// Id of the controlling worker
    pub controller: Option<Uuid>,
    pub opened_at: DateTime<Utc>,
}

/// Persisted lifecycle state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationState {
    pub active: Option<WorkerRecord>,
    pub waiting: Option<WorkerRecord>,
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
}

/// Result of activating the waiting worker
#[derive(Debug, Clone)]
pub struct Activation {
    pub cache_name: String,
    /// Stores removed by the activate handler
    pub deleted: Vec<String>,
    /// Clients now controlled by the new worker
    pub controlled: usize,
}

/// Result of registering a manifest
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The active worker already runs this version
    UpToDate { cache_name: String },
    /// Install failed; the active worker is unchanged
    InstallFailed { cache_name: String, error: B64Error },
    /// Installed and waiting for old clients to close
    Waiting { cache_name: String },
    /// Installed and activated
    Activated(Activation),
}

/// Host runtime for the offline cache workers
pub struct Registration {
    state: RegistrationState,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    table: HandlerTable,
    path: Option<PathBuf>,
}

impl Registration {
    /// In-memory registration with no persisted state
    pub fn new(storage: Arc<CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            state: RegistrationState::default(),
            storage,
            network,
            table: HandlerTable::standard(),
            path: None,
        }
    }

    /// Resume the registration and cache stores saved under `paths`
    pub async fn load(
        paths: &StatePaths,
        network: Arc<dyn Network>,
        quota_bytes: Option<u64>,
    ) -> B64Result<Self> {
        paths.ensure().await?;

        let storage = CacheStorage::open_dir(&paths.caches_dir())
            .await?
            .with_quota(quota_bytes);

        let path = paths.registration_path();
        let state = if path.exists() {
            let content = fs::read_to_string(&path).await.map_err(|e| {
                B64Error::io(format!("reading registration {}", path.display()), e)
            })?;
            serde_json::from_str(&content)?
        } else {
            debug!("No registration at {}, starting fresh", path.display());
            RegistrationState::default()
        };

        Ok(Self {
            state,
            storage: Arc::new(storage),
            network,
            table: HandlerTable::standard(),
            path: Some(path),
        })
    }

    /// Persist stores and lifecycle state. No-op when in memory.
    pub async fn save(&self) -> B64Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        self.storage.persist().await?;
        let content = serde_json::to_string_pretty(&self.state)?;
        write_atomic(path, content)
            .await
            .map_err(|e| B64Error::io(format!("writing registration {}", path.display()), e))?;

        debug!("Saved registration to {}", path.display());
        Ok(())
    }

    pub fn active(&self) -> Option<&WorkerRecord> {
        self.state.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&WorkerRecord> {
        self.state.waiting.as_ref()
    }

    pub fn clients(&self) -> &[ClientRecord] {
        &self.state.clients
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    fn manager_for(&self, worker: &WorkerRecord) -> B64Result<Arc<OfflineCacheManager>> {
        let manager = OfflineCacheManager::new(
            worker.manifest.clone(),
            self.storage.clone(),
            self.network.clone(),
        )?;
        Ok(Arc::new(manager))
    }

    /// Register a manifest: install it, then activate it when nothing holds it back
    pub async fn update(&mut self, manifest: CacheManifest) -> B64Result<UpdateOutcome> {
        manifest.validate()?;
        let cache_name = manifest.cache_name_string();

        if self.active().is_some_and(|w| w.cache_name() == cache_name) {
            debug!("{} is already active", cache_name);
            return Ok(UpdateOutcome::UpToDate { cache_name });
        }
        if self.waiting().is_some_and(|w| w.cache_name() == cache_name) {
            debug!("{} is already waiting", cache_name);
            return Ok(UpdateOutcome::Waiting { cache_name });
        }

        let mut worker = WorkerRecord::new(manifest);
        worker.transition(WorkerState::Installing)?;
        let manager = self.manager_for(&worker)?;

        let skip_waiting = match self.table.dispatch(manager, Event::Install).await {
            Ok(EventOutcome::Installed { skip_waiting, cached, .. }) => {
                info!("Installed {} ({} resources)", cache_name, cached.len());
                skip_waiting
            }
            Ok(other) => {
                return Err(B64Error::Internal(format!(
                    "install produced unexpected outcome {other:?}"
                )))
            }
            Err(e) => {
                error!("Install of {} failed: {}", cache_name, e);
                worker.transition(WorkerState::Redundant)?;
                return Ok(UpdateOutcome::InstallFailed {
                    cache_name,
                    error: e,
                });
            }
        };

        worker.transition(WorkerState::Installed)?;
        if let Some(mut replaced) = self.state.waiting.replace(worker) {
            info!("Replacing waiting worker {}", replaced.cache_name());
            replaced.transition(WorkerState::Redundant)?;
        }

        if skip_waiting || !self.active_has_clients() {
            let activation = self.activate_waiting().await?;
            return Ok(UpdateOutcome::Activated(activation));
        }

        info!("{} waiting for open clients to close", cache_name);
        Ok(UpdateOutcome::Waiting { cache_name })
    }

    /// Whether any open client is controlled by the active worker
    fn active_has_clients(&self) -> bool {
        let Some(active) = self.active() else {
            return false;
        };
        self.state
            .clients
            .iter()
            .any(|c| c.controller == Some(active.id))
    }

    /// Promote the waiting worker, replacing the active one
    pub async fn activate_waiting(&mut self) -> B64Result<Activation> {
        let mut worker = self.state.waiting.take().ok_or(B64Error::NoWaitingWorker)?;
        worker.transition(WorkerState::Activating)?;
        let manager = self.manager_for(&worker)?;

        let (deleted, claim_clients) = match self.table.dispatch(manager, Event::Activate).await? {
            EventOutcome::Activated {
                deleted,
                claim_clients,
            } => (deleted, claim_clients),
            other => {
                return Err(B64Error::Internal(format!(
                    "activate produced unexpected outcome {other:?}"
                )))
            }
        };
        worker.transition(WorkerState::Activated)?;

        let previous = self.state.active.take().map(|mut old| {
            if let Err(e) = old.transition(WorkerState::Redundant) {
                debug!("Previous worker not retired: {}", e);
            }
            old.id
        });

        let mut controlled = 0;
        for client in &mut self.state.clients {
            if claim_clients || (previous.is_some() && client.controller == previous) {
                client.controller = Some(worker.id);
            }
            if client.controller == Some(worker.id) {
                controlled += 1;
            }
        }

        let cache_name = worker.cache_name();
        info!("Activated {}", cache_name);
        self.state.active = Some(worker);

        Ok(Activation {
            cache_name,
            deleted,
            controlled,
        })
    }

    /// Route a request through the active worker's fetch handler
    ///
    /// With no active worker nothing is intercepted.
    pub async fn handle_fetch(&self, request: Request) -> B64Result<FetchOutcome> {
        let Some(active) = self.active() else {
            return Ok(FetchOutcome::Passthrough(request));
        };
        let manager = self.manager_for(active)?;

        match self.table.dispatch(manager, Event::Fetch(request)).await? {
            EventOutcome::Fetched(outcome) => Ok(outcome),
            other => Err(B64Error::Internal(format!(
                "fetch produced unexpected outcome {other:?}"
            ))),
        }
    }

    /// Answer a request, sending passthrough requests to the network
    pub async fn fetch(&self, request: Request) -> B64Result<(Response, ServedFrom)> {
        match self.handle_fetch(request).await? {
            FetchOutcome::Respond { response, source } => Ok((response, source)),
            FetchOutcome::Passthrough(request) => {
                debug!("Passthrough: {} {}", request.method, request.url);
                let response = self.network.fetch(&request).await?;
                Ok((response, ServedFrom::Passthrough))
            }
        }
    }

    /// Post a JSON message to the waiting worker (or the active one)
    ///
    /// Returns the activation when the message made the waiting worker skip
    /// waiting.
    pub async fn post_message(&mut self, payload: &str) -> B64Result<Option<Activation>> {
        let message = Message::parse(payload)?;
        if let Message::Other(kind) = &message {
            debug!("Ignoring message type {:?}", kind);
        }

        let target = match self.waiting().or_else(|| self.active()) {
            Some(worker) => self.manager_for(worker)?,
            None => {
                debug!("No worker to receive message");
                return Ok(None);
            }
        };

        let skip_waiting = match self
            .table
            .dispatch(target, Event::Message(message))
            .await?
        {
            EventOutcome::Message { skip_waiting } => skip_waiting,
            other => {
                return Err(B64Error::Internal(format!(
                    "message produced unexpected outcome {other:?}"
                )))
            }
        };

        if skip_waiting && self.state.waiting.is_some() {
            return self.activate_waiting().await.map(Some);
        }
        Ok(None)
    }

    /// Open a page; it is controlled by the active worker, if any
    pub fn open_client(&mut self, url: &str) -> B64Result<ClientRecord> {
        let url = Url::parse(url).map_err(|e| B64Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = ClientRecord {
            id: Uuid::new_v4(),
            url: url.to_string(),
            controller: self.active().map(|w| w.id),
            opened_at: Utc::now(),
        };
        info!("Opened client {} at {}", client.id, client.url);
        self.state.clients.push(client.clone());
        Ok(client)
    }

    /// Close a page; closing the last page of the old version promotes the
    /// waiting worker
    pub async fn close_client(&mut self, id: Uuid) -> B64Result<Option<Activation>> {
        let index = self
            .state
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| B64Error::ClientNotFound(id.to_string()))?;
        self.state.clients.remove(index);
        info!("Closed client {}", id);

        if self.state.waiting.is_some() && !self.active_has_clients() {
            return self.activate_waiting().await.map(Some);
        }
        Ok(None)
    }
}
