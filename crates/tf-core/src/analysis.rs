//! Structure-gap analysis over the entity graph.
//!
//! Reports structural omissions without modifying the graph. Results feed
//! the advisory tip pipeline. The checks are heuristics, not tax advice.

use crate::graph::ConnectionGraph;
use crate::id::EntityId;
use crate::model::{Entity, EntityType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Revenue below which an S-corp election is flagged for review.
pub const S_CORP_REVENUE_FLOOR: f64 = 100_000.0;

// ─── Gap types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of structural gap. Its wire name doubles as the tip trigger key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapKind {
    /// An asset-holding entity with no trust owning it.
    ExposedAsset,
    /// An S-corp whose revenue is missing or below the floor.
    IncomeOptimization,
}

impl GapKind {
    pub const ALL: [GapKind; 2] = [GapKind::ExposedAsset, GapKind::IncomeOptimization];

    pub fn as_str(self) -> &'static str {
        match self {
            GapKind::ExposedAsset => "exposed-asset",
            GapKind::IncomeOptimization => "income-optimization",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            GapKind::ExposedAsset => Priority::High,
            GapKind::IncomeOptimization => Priority::Medium,
        }
    }
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected structural shortcoming tied to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    #[serde(rename = "type")]
    pub kind: GapKind,
    pub related_entity_id: EntityId,
    pub message: String,
    pub priority: Priority,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run every rule and return all gaps.
///
/// Exposed-asset gaps come first in entity order, then income-optimization
/// gaps in entity order, so the head of the list is deterministic.
#[must_use]
pub fn detect_gaps<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Vec<Gap> {
    let entities: Vec<&Entity> = entities.into_iter().collect();
    let graph = ConnectionGraph::build(entities.iter().copied());
    let mut gaps = Vec::new();
    detect_exposed_assets(&entities, &graph, &mut gaps);
    detect_income_optimization(&entities, &mut gaps);
    gaps
}

// ─── Rules ───────────────────────────────────────────────────────────────

fn detect_exposed_assets(entities: &[&Entity], graph: &ConnectionGraph, gaps: &mut Vec<Gap>) {
    for entity in entities.iter().filter(|e| e.kind.holds_assets()) {
        if graph.owners_of(entity.id, EntityType::Trust).is_empty() {
            gaps.push(Gap {
                kind: GapKind::ExposedAsset,
                related_entity_id: entity.id,
                message: format!(
                    "{} is not owned by a trust. Connect a living trust to it to shield its assets.",
                    entity.name
                ),
                priority: GapKind::ExposedAsset.priority(),
            });
        }
    }
}

fn detect_income_optimization(entities: &[&Entity], gaps: &mut Vec<Gap>) {
    for entity in entities.iter().filter(|e| e.kind == EntityType::SCorp) {
        let below_floor = entity
            .revenue()
            .is_none_or(|revenue| revenue < S_CORP_REVENUE_FLOOR);
        if below_floor {
            gaps.push(Gap {
                kind: GapKind::IncomeOptimization,
                related_entity_id: entity.id,
                message: format!(
                    "{} reports under $100,000 in revenue. Review whether the S-corp election still pays off.",
                    entity.name
                ),
                priority: GapKind::IncomeOptimization.priority(),
            });
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────
