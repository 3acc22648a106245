//! Entity data model for the structure canvas.
//!
//! An entity is a node representing a legal or financial structure. Its
//! outgoing `connections` are directed edges to other entities; the
//! classification of an edge (ownership, income flow, generic) is derived
//! from the two endpoint types and never stored.

use crate::error::ValidationError;
use crate::id::EntityId;
use crate::zone::ZoneId;
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Outgoing edges of an entity, in insertion order.
pub type Connections = SmallVec<[EntityId; 4]>;

// ─── Entity type ─────────────────────────────────────────────────────────

/// The closed set of structure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    SCorp,
    Llc,
    Trust,
    Business,
    Property,
    Investment,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::SCorp,
        EntityType::Llc,
        EntityType::Trust,
        EntityType::Business,
        EntityType::Property,
        EntityType::Investment,
    ];

    /// Wire spelling, e.g. `"s-corp"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::SCorp => "s-corp",
            EntityType::Llc => "llc",
            EntityType::Trust => "trust",
            EntityType::Business => "business",
            EntityType::Property => "property",
            EntityType::Investment => "investment",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityType::SCorp => "S-Corporation",
            EntityType::Llc => "LLC",
            EntityType::Trust => "Living Trust",
            EntityType::Business => "Business",
            EntityType::Property => "Property",
            EntityType::Investment => "Investment",
        }
    }

    /// The zone an entity of this type is placed in before the user moves it.
    pub fn default_zone(self) -> ZoneId {
        match self {
            EntityType::SCorp | EntityType::Business => ZoneId::Operations,
            EntityType::Llc | EntityType::Property | EntityType::Investment => ZoneId::Assets,
            EntityType::Trust => ZoneId::Foundation,
        }
    }

    /// Whether this type holds assets that want a protective owner.
    pub fn holds_assets(self) -> bool {
        matches!(self, EntityType::Llc)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownType(s.to_string()))
    }
}

/// Default zone for a raw type string. Unrecognized types land in operations.
pub fn default_zone_for_type(raw: &str) -> ZoneId {
    raw.parse::<EntityType>()
        .map_or(ZoneId::Operations, EntityType::default_zone)
}

// ─── Connection classification ───────────────────────────────────────────

/// Semantic class of a directed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    /// The source owns or shelters the target.
    Ownership,
    /// Income moves from the source up to the target.
    IncomeFlow,
    Generic,
}

impl ConnectionKind {
    /// Classify an edge `from → to` by its endpoint types.
    pub fn classify(from: EntityType, to: EntityType) -> Self {
        use EntityType::*;
        match (from, to) {
            (Trust, _) => ConnectionKind::Ownership,
            (Llc, Property | Investment | Business) => ConnectionKind::Ownership,
            (SCorp | Business, Trust | SCorp) => ConnectionKind::IncomeFlow,
            (Property | Investment, Llc | Trust) => ConnectionKind::IncomeFlow,
            (Llc, Trust) => ConnectionKind::IncomeFlow,
            _ => ConnectionKind::Generic,
        }
    }
}

// ─── Entity ──────────────────────────────────────────────────────────────

/// Optional financial figures attached to an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub revenue: Option<f64>,
    pub value: Option<f64>,
}

impl Financials {
    pub const fn new(revenue: Option<f64>, value: Option<f64>) -> Self {
        Self { revenue, value }
    }
}

/// A node in the structure diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub zone: ZoneId,
    /// World-space top-left of the entity card.
    pub position: Point,
    #[serde(default)]
    pub financials: Option<Financials>,
    /// Free-form notes, usually prefilled from a template.
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub connections: Connections,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn revenue(&self) -> Option<f64> {
        self.financials.and_then(|f| f.revenue)
    }

    pub fn value(&self) -> Option<f64> {
        self.financials.and_then(|f| f.value)
    }

    pub fn is_connected_to(&self, target: EntityId) -> bool {
        self.connections.contains(&target)
    }
}

/// Where new entities land when the draft carries no position.
pub const DEFAULT_POSITION: Point = Point::new(100.0, 100.0);

/// Input for creating an entity. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    /// Defaults to the type's zone.
    #[serde(default)]
    pub zone: Option<ZoneId>,
    /// Defaults to [`DEFAULT_POSITION`].
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub financials: Option<Financials>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub connections: Connections,
}

impl EntityDraft {
    pub fn new(name: impl Into<String>, kind: EntityType) -> Self {
        Self {
            name: name.into(),
            kind,
            zone: None,
            position: None,
            financials: None,
            details: None,
            connections: Connections::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn in_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    #[must_use]
    pub fn with_financials(mut self, revenue: Option<f64>, value: Option<f64>) -> Self {
        self.financials = Some(Financials::new(revenue, value));
        self
    }

    #[must_use]
    pub fn connected_to(mut self, targets: impl IntoIterator<Item = EntityId>) -> Self {
        self.connections.extend(targets);
        self
    }
}

/// Partial update of an entity. The id is not part of a patch, so it can
/// never be overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EntityType>,
    pub zone: Option<ZoneId>,
    pub position: Option<Point>,
    pub financials: Option<Financials>,
    pub details: Option<String>,
    pub connections: Option<Connections>,
}

impl EntityPatch {
    /// A patch that moves an entity into a zone.
    pub fn placement(position: Point, zone: ZoneId) -> Self {
        Self {
            position: Some(position),
            zone: Some(zone),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_wire_names() {
        let json = serde_json::to_string(&EntityType::SCorp).unwrap();
        assert_eq!(json, "\"s-corp\"");
        assert_eq!("investment".parse::<EntityType>(), Ok(EntityType::Investment));
        assert_eq!(
            "c-corp".parse::<EntityType>(),
            Err(ValidationError::UnknownType("c-corp".into()))
        );
    }

    #[test]
    fn default_zone_mapping_is_total() {
        assert_eq!(default_zone_for_type("s-corp"), ZoneId::Operations);
        assert_eq!(default_zone_for_type("business"), ZoneId::Operations);
        assert_eq!(default_zone_for_type("llc"), ZoneId::Assets);
        assert_eq!(default_zone_for_type("property"), ZoneId::Assets);
        assert_eq!(default_zone_for_type("investment"), ZoneId::Assets);
        assert_eq!(default_zone_for_type("trust"), ZoneId::Foundation);
        assert_eq!(default_zone_for_type("partnership"), ZoneId::Operations);
    }

    #[test]
    fn classify_connections() {
        use EntityType::*;
        assert_eq!(ConnectionKind::classify(Trust, Llc), ConnectionKind::Ownership);
        assert_eq!(ConnectionKind::classify(Llc, Property), ConnectionKind::Ownership);
        assert_eq!(ConnectionKind::classify(SCorp, Trust), ConnectionKind::IncomeFlow);
        assert_eq!(ConnectionKind::classify(Investment, Llc), ConnectionKind::IncomeFlow);
        assert_eq!(ConnectionKind::classify(Property, Business), ConnectionKind::Generic);
    }

    #[test]
    fn draft_deserializes_with_defaults() {
        let draft: EntityDraft =
            serde_json::from_str(r#"{ "name": "Holding LLC", "type": "llc" }"#).unwrap();
        assert_eq!(draft.kind, EntityType::Llc);
        assert!(draft.zone.is_none());
        assert!(draft.connections.is_empty());
    }

    #[test]
    fn patch_placement_is_not_empty() {
        assert!(EntityPatch::default().is_empty());
        assert!(!EntityPatch::placement(Point::new(1.0, 2.0), ZoneId::Flow).is_empty());
    }
}
