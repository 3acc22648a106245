//! Asynchronous persistence collaborator.
//!
//! `EntityRepository` and `TipRepository` describe the two collections the
//! canvas reads and writes. `MockBackend` implements both over in-memory
//! state with simulated latency and an offline switch for failure
//! injection. The session never waits on these calls: it applies changes
//! locally and hands the queued `PendingWrite`s to `flush_writes`.

use crate::notify::Notification;
use crate::session::{CanvasSession, PendingWrite};
use crate::tips::{Tip, TipTrigger};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tf_core::{
    CanvasConfig, Connections, Entity, EntityDraft, EntityId, EntityPatch, EntityStore, Priority,
    StoreError, TipId, ValidationError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: &'static str, id: u32 },

    #[error("failed to load canvas data: {0}")]
    LoadFailure(String),

    #[error("backend unavailable")]
    Unavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<StoreError> for PersistenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => PersistenceError::NotFound {
                collection: "entities",
                id: id.get(),
            },
            StoreError::Validation(err) => PersistenceError::Validation(err),
        }
    }
}

pub type PersistResult<T> = Result<T, PersistenceError>;

/// Input for creating a tip. The backend assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TipDraft {
    pub trigger: TipTrigger,
    pub message: String,
    pub priority: Priority,
}

impl From<&Tip> for TipDraft {
    fn from(tip: &Tip) -> Self {
        Self {
            trigger: tip.trigger,
            message: tip.message.clone(),
            priority: tip.priority,
        }
    }
}

// ─── Repository traits ───────────────────────────────────────────────────

#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn get_all(&self) -> PersistResult<Vec<Entity>>;
    async fn get_by_id(&self, id: EntityId) -> PersistResult<Entity>;
    async fn create(&self, draft: EntityDraft) -> PersistResult<Entity>;
    async fn update(&self, id: EntityId, patch: EntityPatch) -> PersistResult<Entity>;
    async fn delete(&self, id: EntityId) -> PersistResult<()>;
}

#[async_trait]
pub trait TipRepository: Send + Sync {
    async fn get_all_tips(&self) -> PersistResult<Vec<Tip>>;
    async fn get_tips_by_trigger(&self, trigger: TipTrigger) -> PersistResult<Vec<Tip>>;
    async fn get_tip(&self, id: TipId) -> PersistResult<Tip>;
    async fn create_tip(&self, draft: TipDraft) -> PersistResult<Tip>;
    async fn update_tip(&self, id: TipId, message: String, priority: Priority)
    -> PersistResult<Tip>;
    async fn delete_tip(&self, id: TipId) -> PersistResult<()>;
}

// ─── MockBackend ─────────────────────────────────────────────────────────

/// Simulated round-trip delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub read: Duration,
    pub write: Duration,
}

impl Latency {
    pub const ZERO: Latency = Latency {
        read: Duration::ZERO,
        write: Duration::ZERO,
    };
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(200),
            write: Duration::from_millis(300),
        }
    }
}

/// In-memory backend for development and tests.
pub struct MockBackend {
    entities: RwLock<EntityStore>,
    tips: RwLock<Vec<Tip>>,
    /// Highest tip id ever assigned; deleted ids stay retired.
    last_tip_id: AtomicU32,
    latency: Latency,
    offline: AtomicBool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::seeded(EntityStore::new(), Vec::new())
    }

    pub fn seeded(entities: EntityStore, tips: Vec<Tip>) -> Self {
        let last_tip_id = tips.iter().map(|t| t.id.0).max().unwrap_or(0);
        Self {
            entities: RwLock::new(entities),
            tips: RwLock::new(tips),
            last_tip_id: AtomicU32::new(last_tip_id),
            latency: Latency::default(),
            offline: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    /// While offline every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn round_trip(&self, delay: Duration) -> PersistResult<()> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable);
        }
        Ok(())
    }

    fn read_entities<T>(&self, f: impl FnOnce(&EntityStore) -> T) -> PersistResult<T> {
        let guard = self
            .entities
            .read()
            .map_err(|_| PersistenceError::Unavailable)?;
        Ok(f(&guard))
    }

    fn write_entities<T>(
        &self,
        f: impl FnOnce(&mut EntityStore) -> Result<T, StoreError>,
    ) -> PersistResult<T> {
        let mut guard = self
            .entities
            .write()
            .map_err(|_| PersistenceError::Unavailable)?;
        Ok(f(&mut guard)?)
    }

    fn read_tips<T>(&self, f: impl FnOnce(&[Tip]) -> T) -> PersistResult<T> {
        let guard = self.tips.read().map_err(|_| PersistenceError::Unavailable)?;
        Ok(f(&guard))
    }

    fn write_tips<T>(
        &self,
        f: impl FnOnce(&mut Vec<Tip>) -> PersistResult<T>,
    ) -> PersistResult<T> {
        let mut guard = self
            .tips
            .write()
            .map_err(|_| PersistenceError::Unavailable)?;
        f(&mut guard)
    }
}

fn tip_not_found(id: TipId) -> PersistenceError {
    PersistenceError::NotFound {
        collection: "tips",
        id: id.0,
    }
}

#[async_trait]
impl EntityRepository for MockBackend {
    async fn get_all(&self) -> PersistResult<Vec<Entity>> {
        self.round_trip(self.latency.read).await?;
        self.read_entities(EntityStore::get_all)
    }

    async fn get_by_id(&self, id: EntityId) -> PersistResult<Entity> {
        self.round_trip(self.latency.read).await?;
        self.read_entities(|store| store.get_by_id(id).cloned())?
            .map_err(PersistenceError::from)
    }

    async fn create(&self, draft: EntityDraft) -> PersistResult<Entity> {
        self.round_trip(self.latency.write).await?;
        self.write_entities(|store| store.create(draft))
    }

    async fn update(&self, id: EntityId, patch: EntityPatch) -> PersistResult<Entity> {
        self.round_trip(self.latency.write).await?;
        self.write_entities(|store| store.update(id, patch))
    }

    async fn delete(&self, id: EntityId) -> PersistResult<()> {
        self.round_trip(self.latency.write).await?;
        self.write_entities(|store| store.delete(id).map(|_| ()))
    }
}

#[async_trait]
impl TipRepository for MockBackend {
    async fn get_all_tips(&self) -> PersistResult<Vec<Tip>> {
        self.round_trip(self.latency.read).await?;
        self.read_tips(<[Tip]>::to_vec)
    }

    async fn get_tips_by_trigger(&self, trigger: TipTrigger) -> PersistResult<Vec<Tip>> {
        self.round_trip(self.latency.read).await?;
        self.read_tips(|tips| {
            tips.iter()
                .filter(|t| t.trigger == trigger)
                .cloned()
                .collect()
        })
    }

    async fn get_tip(&self, id: TipId) -> PersistResult<Tip> {
        self.round_trip(self.latency.read).await?;
        self.read_tips(|tips| tips.iter().find(|t| t.id == id).cloned())?
            .ok_or_else(|| tip_not_found(id))
    }

    async fn create_tip(&self, draft: TipDraft) -> PersistResult<Tip> {
        self.round_trip(self.latency.write).await?;
        self.write_tips(|tips| {
            let retired = TipId(self.last_tip_id.load(Ordering::SeqCst));
            let id = TipId::next_after(tips.iter().map(|t| t.id).chain([retired]))
                .ok_or(ValidationError::IdsExhausted)?;
            self.last_tip_id.store(id.0, Ordering::SeqCst);
            let tip = Tip {
                id,
                trigger: draft.trigger,
                message: draft.message,
                priority: draft.priority,
                created_at: Utc::now(),
            };
            tips.push(tip.clone());
            Ok(tip)
        })
    }

    async fn update_tip(
        &self,
        id: TipId,
        message: String,
        priority: Priority,
    ) -> PersistResult<Tip> {
        self.round_trip(self.latency.write).await?;
        self.write_tips(|tips| {
            let tip = tips
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| tip_not_found(id))?;
            tip.message = message;
            tip.priority = priority;
            Ok(tip.clone())
        })
    }

    async fn delete_tip(&self, id: TipId) -> PersistResult<()> {
        self.round_trip(self.latency.write).await?;
        self.write_tips(|tips| {
            let index = tips
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| tip_not_found(id))?;
            tips.remove(index);
            Ok(())
        })
    }
}

// ─── Session glue ────────────────────────────────────────────────────────

/// Bulk-load a session. Any failure is a `LoadFailure`; retry by calling
/// again.
pub async fn load_session<R>(repo: &R, config: CanvasConfig) -> PersistResult<CanvasSession>
where
    R: EntityRepository + TipRepository + ?Sized,
{
    let entities = repo.get_all().await.map_err(load_failure)?;
    let tips = repo.get_all_tips().await.map_err(load_failure)?;
    log::info!("loaded {} entities and {} tips", entities.len(), tips.len());
    CanvasSession::from_records(config, entities, tips)
        .map_err(|err| load_failure(PersistenceError::from(err)))
}

fn load_failure(err: PersistenceError) -> PersistenceError {
    log::error!("load failed: {err}");
    match err {
        PersistenceError::LoadFailure(_) => err,
        other => PersistenceError::LoadFailure(other.to_string()),
    }
}

/// Send queued writes in order. Each failure becomes an error
/// notification; local state is not rolled back.
///
/// Ids the backend assigns to created entities are recorded in `ids` and
/// carried into every later write, including those of later flushes. Writes
/// that target an entity whose create failed are skipped and reported, since
/// the backend has no record for them.
pub async fn flush_writes<R>(
    repo: &R,
    ids: &mut IdMap,
    writes: Vec<PendingWrite>,
) -> Vec<Notification>
where
    R: EntityRepository + TipRepository + ?Sized,
{
    let mut notifications = Vec::new();
    for write in writes {
        let outcome = match write {
            PendingWrite::CreateEntity(local) => {
                let draft = EntityDraft {
                    name: local.name.clone(),
                    kind: local.kind,
                    zone: Some(local.zone),
                    position: Some(local.position),
                    financials: local.financials,
                    details: local.details.clone(),
                    connections: ids.remap_all(&local.connections),
                };
                match repo.create(draft).await {
                    Ok(stored) => {
                        ids.saved(local.id, stored.id);
                        Ok(())
                    }
                    Err(err) => {
                        ids.failed(local.id);
                        Err(err)
                    }
                }
            }
            PendingWrite::UpdateEntity { id, mut patch } => match ids.resolve(id) {
                Some(target) => {
                    if let Some(connections) = &mut patch.connections {
                        *connections = ids.remap_all(connections);
                    }
                    repo.update(target, patch).await.map(|_| ())
                }
                None => {
                    notifications.push(skipped(id));
                    continue;
                }
            },
            PendingWrite::DeleteEntity(id) => match ids.resolve(id) {
                Some(target) => repo.delete(target).await,
                None => {
                    notifications.push(skipped(id));
                    continue;
                }
            },
            PendingWrite::CreateTip(tip) => repo.create_tip(TipDraft::from(&tip)).await.map(|_| ()),
        };
        if let Err(err) = outcome {
            log::error!("persistence write failed: {err}");
            notifications.push(Notification::error(format!("Failed to save changes: {err}")));
        }
    }
    notifications
}

/// Local entity ids mapped to what the backend knows them as. Lives as long
/// as the session it flushes for. `None` marks a local entity whose create
/// failed.
#[derive(Debug, Default)]
pub struct IdMap {
    ids: HashMap<EntityId, Option<EntityId>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }


    fn saved(&mut self, local: EntityId, stored: EntityId) {
        if stored != local {
            log::debug!("backend assigned {stored} to local entity {local}");
        }
        self.ids.insert(local, Some(stored));
    }

    fn failed(&mut self, local: EntityId) {
        self.ids.insert(local, None);
    }

    /// The backend id for `local`, or `None` if the backend never got it.
    pub fn resolve(&self, local: EntityId) -> Option<EntityId> {
        match self.ids.get(&local) {
            Some(mapped) => *mapped,
            None => Some(local),
        }
    }

    fn remap_all(&self, connections: &Connections) -> Connections {
        connections
            .iter()
            .filter_map(|&target| {
                let mapped = self.resolve(target);
                if mapped.is_none() {
                    log::warn!("dropping connection to unsaved entity {target}");
                }
                mapped
            })
            .collect()
    }
}

fn skipped(id: EntityId) -> Notification {
    log::error!("skipping write for {id}: its create never reached the backend");
    Notification::error(format!(
        "Failed to save changes: {id} was never saved, so later edits to it were dropped"
    ))
}
