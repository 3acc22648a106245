//! Directed connection graph derived from entity connection lists.

use crate::id::EntityId;
use crate::model::{ConnectionKind, Entity, EntityType};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One classified edge `from → to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: EntityId,
    pub to: EntityId,
    pub kind: ConnectionKind,
}

/// Snapshot of the entity graph. Nodes keep entity iteration order; edges
/// keep connection-list order.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    graph: DiGraphMap<EntityId, ConnectionKind>,
    kinds: HashMap<EntityId, EntityType>,
}

impl ConnectionGraph {
    /// Build from entities. Edges to ids not present in `entities` are skipped.
    pub fn build<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let entities: Vec<&Entity> = entities.into_iter().collect();
        let mut graph = DiGraphMap::with_capacity(entities.len(), entities.len());
        let mut kinds = HashMap::with_capacity(entities.len());

        for entity in &entities {
            graph.add_node(entity.id);
            kinds.insert(entity.id, entity.kind);
        }
        for entity in &entities {
            for target in &entity.connections {
                let Some(target_kind) = kinds.get(target).copied() else {
                    log::trace!("skip dangling edge {} -> {target}", entity.id);
                    continue;
                };
                if *target == entity.id {
                    continue;
                }
                graph.add_edge(
                    entity.id,
                    *target,
                    ConnectionKind::classify(entity.kind, target_kind),
                );
            }
        }

        Self { graph, kinds }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityType> {
        self.kinds.get(&id).copied()
    }

    /// All classified connections.
    pub fn connections(&self) -> Vec<Connection> {
        self.graph
            .all_edges()
            .map(|(from, to, kind)| Connection {
                from,
                to,
                kind: *kind,
            })
            .collect()
    }

    /// Entities with an edge pointing at `id`.
    pub fn sources_of(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.graph.neighbors_directed(id, Direction::Incoming)
    }

    /// Entities of type `owner_kind` with an edge pointing at `id`.
    pub fn owners_of(&self, id: EntityId, owner_kind: EntityType) -> Vec<EntityId> {
        self.sources_of(id)
            .filter(|source| self.kind_of(*source) == Some(owner_kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityDraft, EntityType};
    use crate::store::EntityStore;

    #[test]
    fn owners_and_classification() {
        let mut store = EntityStore::new();
        let trust = store.create(EntityDraft::new("Family Trust", EntityType::Trust)).unwrap();
        let llc = store.create(EntityDraft::new("Holdings", EntityType::Llc)).unwrap();
        let corp = store.create(EntityDraft::new("Ops", EntityType::SCorp)).unwrap();
        store.connect(trust.id, llc.id).unwrap();
        store.connect(corp.id, trust.id).unwrap();

        let graph = ConnectionGraph::build(store.iter());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.owners_of(llc.id, EntityType::Trust), vec![trust.id]);
        assert!(graph.owners_of(corp.id, EntityType::Trust).is_empty());
        assert_eq!(
            graph.connections(),
            vec![
                Connection {
                    from: trust.id,
                    to: llc.id,
                    kind: ConnectionKind::Ownership,
                },
                Connection {
                    from: corp.id,
                    to: trust.id,
                    kind: ConnectionKind::IncomeFlow,
                },
            ]
        );
    }
}
