//! The entity store: sole owner of entity lifetime.
//!
//! Drafts and patches are validated at this boundary. Ids are assigned one past
//! the highest id ever held, so iteration in id order is also creation order
//! and a deleted id is never handed out again.
//! Deleting an entity scrubs its id from every remaining connection list.

use crate::error::{StoreError, StoreResult, ValidationError};
use crate::id::EntityId;
use crate::model::*;
use crate::zone::ZoneId;
use chrono::Utc;
use kurbo::Point;
use std::collections::BTreeMap;

/// Authoritative collection of entities and their outgoing connections.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    /// High-water mark of assigned ids, including deleted ones.
    last_assigned: Option<EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously persisted records.
    ///
    /// Duplicate ids are rejected. Connections that are self-referential or
    /// point at missing entities are dropped with a warning, so the loaded
    /// store always satisfies referential integrity.
    pub fn from_entities(records: impl IntoIterator<Item = Entity>) -> StoreResult<Self> {
        let mut entities = BTreeMap::new();
        for mut record in records {
            record.name = record.name.trim().to_string();
            if record.name.is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
            check_position(record.position)?;
            let id = record.id;
            if entities.insert(id, record).is_some() {
                return Err(ValidationError::DuplicateId(id).into());
            }
        }

        let ids: Vec<EntityId> = entities.keys().copied().collect();
        for entity in entities.values_mut() {
            let owner = entity.id;
            let before = entity.connections.len();
            entity
                .connections
                .retain(|target| *target != owner && ids.binary_search(target).is_ok());
            dedup_in_place(&mut entity.connections);
            if entity.connections.len() != before {
                log::warn!(
                    "dropped {} invalid connection(s) from {owner} while loading",
                    before - entity.connections.len()
                );
            }
        }

        let last_assigned = entities.keys().next_back().copied();
        Ok(Self {
            entities,
            last_assigned,
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities in id (creation) order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entity> + ExactSizeIterator {
        self.entities.values()
    }

    /// Snapshot of every entity, in id order.
    pub fn get_all(&self) -> Vec<Entity> {
        self.entities.values().cloned().collect()
    }

    pub fn get_by_id(&self, id: EntityId) -> StoreResult<&Entity> {
        self.entities.get(&id).ok_or(StoreError::NotFound(id))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn max_id(&self) -> Option<EntityId> {
        self.entities.keys().next_back().copied()
    }

    pub fn entities_in_zone(&self, zone: ZoneId) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.zone == zone)
    }

    /// Sum of known revenues; missing figures count as zero.
    pub fn total_revenue(&self) -> f64 {
        self.entities.values().filter_map(Entity::revenue).sum()
    }

    /// Sum of known values; missing figures count as zero.
    pub fn total_value(&self) -> f64 {
        self.entities.values().filter_map(Entity::value).sum()
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Insert a new entity from a draft and return the stored record.
    pub fn create(&mut self, draft: EntityDraft) -> StoreResult<Entity> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let position = draft.position.unwrap_or(DEFAULT_POSITION);
        check_position(position)?;

        let id = EntityId::next_after(self.max_id().into_iter().chain(self.last_assigned))
            .ok_or(ValidationError::IdsExhausted)?;
        let connections = self.checked_connections(id, draft.connections)?;
        let now = Utc::now();
        let entity = Entity {
            id,
            name,
            kind: draft.kind,
            zone: draft.zone.unwrap_or_else(|| draft.kind.default_zone()),
            position,
            financials: draft.financials,
            details: draft.details,
            connections,
            created_at: now,
            updated_at: now,
        };

        log::debug!("create {id} `{}` ({})", entity.name, entity.kind);
        self.entities.insert(id, entity.clone());
        self.last_assigned = Some(id);
        Ok(entity)
    }

    /// Merge `patch` over an existing entity. Fields absent from the patch
    /// are left untouched.
    pub fn update(&mut self, id: EntityId, patch: EntityPatch) -> StoreResult<Entity> {
        if !self.entities.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }

        let name = match patch.name {
            Some(name) => {
                let trimmed = name.trim().to_string();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyName.into());
                }
                Some(trimmed)
            }
            None => None,
        };
        if let Some(position) = patch.position {
            check_position(position)?;
        }
        let connections = match patch.connections {
            Some(connections) => Some(self.checked_connections(id, connections)?),
            None => None,
        };

        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(name) = name {
            entity.name = name;
        }
        if let Some(kind) = patch.kind {
            entity.kind = kind;
        }
        if let Some(zone) = patch.zone {
            entity.zone = zone;
        }
        if let Some(position) = patch.position {
            entity.position = position;
        }
        if let Some(financials) = patch.financials {
            entity.financials = Some(financials);
        }
        if let Some(details) = patch.details {
            entity.details = Some(details);
        }
        if let Some(connections) = connections {
            entity.connections = connections;
        }
        entity.updated_at = Utc::now();

        log::debug!("update {id}");
        Ok(entity.clone())
    }

    /// Remove an entity and scrub it from every other connection list.
    pub fn delete(&mut self, id: EntityId) -> StoreResult<Entity> {
        let removed = self.entities.remove(&id).ok_or(StoreError::NotFound(id))?;
        let now = Utc::now();
        for entity in self.entities.values_mut() {
            let before = entity.connections.len();
            entity.connections.retain(|target| *target != id);
            if entity.connections.len() != before {
                entity.updated_at = now;
            }
        }
        log::debug!("delete {id} `{}`", removed.name);
        Ok(removed)
    }

    /// Add a directed edge `from → to`.
    ///
    /// Self-connections are rejected. Connecting an already connected pair
    /// leaves the entity unchanged.
    pub fn connect(&mut self, from: EntityId, to: EntityId) -> StoreResult<Entity> {
        if from == to {
            return Err(ValidationError::SelfConnection(from).into());
        }
        if !self.entities.contains_key(&to) {
            return Err(StoreError::NotFound(to));
        }
        let entity = self
            .entities
            .get_mut(&from)
            .ok_or(StoreError::NotFound(from))?;
        if !entity.connections.contains(&to) {
            entity.connections.push(to);
            entity.updated_at = Utc::now();
            log::debug!("connect {from} -> {to}");
        }
        Ok(entity.clone())
    }

    /// Remove the edge `from → to` if present.
    pub fn disconnect(&mut self, from: EntityId, to: EntityId) -> StoreResult<Entity> {
        let entity = self
            .entities
            .get_mut(&from)
            .ok_or(StoreError::NotFound(from))?;
        let before = entity.connections.len();
        entity.connections.retain(|target| *target != to);
        if entity.connections.len() != before {
            entity.updated_at = Utc::now();
            log::debug!("disconnect {from} -> {to}");
        }
        Ok(entity.clone())
    }

    /// Validate a connection list for `owner`: no self edge, no dangling
    /// target. Duplicates are collapsed.
    fn checked_connections(
        &self,
        owner: EntityId,
        mut connections: Connections,
    ) -> Result<Connections, ValidationError> {
        for target in &connections {
            if *target == owner {
                return Err(ValidationError::SelfConnection(owner));
            }
            if !self.entities.contains_key(target) {
                return Err(ValidationError::DanglingConnection(*target));
            }
        }
        dedup_in_place(&mut connections);
        Ok(connections)
    }
}

fn check_position(position: Point) -> Result<(), ValidationError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinitePosition)
    }
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedup_in_place(connections: &mut Connections) {
    let mut seen = Vec::with_capacity(connections.len());
    connections.retain(|target| {
        if seen.contains(target) {
            false
        } else {
            seen.push(*target);
            true
        }
    });
}
