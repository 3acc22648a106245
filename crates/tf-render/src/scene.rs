//! Render-agnostic display list.
//!
//! Converts the store plus transient interaction state into flat shapes in
//! world space. The host applies the camera transform when drawing.
//! Paint order: zones, connection lines, cards (elevated card last).

use crate::hit::card_rect;
use serde::Serialize;
use tf_core::layout::card_center;
use tf_core::{
    Camera, CanvasConfig, ConnectionGraph, ConnectionKind, EntityId, EntityStore, EntityType,
    Point, Rect, Vec2, ZONES, ZoneId,
};
use kurbo::Line;

/// Transient interaction state that affects drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlay {
    pub selected: Option<EntityId>,
    /// Entity being dragged and its preview position.
    pub dragging: Option<(EntityId, Point)>,
    /// Zone under the dragged card.
    pub highlighted_zone: Option<ZoneId>,
    /// Source of an in-progress connection.
    pub connecting_from: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneShape {
    pub id: ZoneId,
    pub name: &'static str,
    pub description: &'static str,
    pub rect: Rect,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardShape {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub type_label: &'static str,
    pub zone: ZoneId,
    pub rect: Rect,
    pub revenue: Option<f64>,
    pub value: Option<f64>,
    pub selected: bool,
    /// Raised above the other cards (selected or being dragged).
    pub elevated: bool,
    /// Source of the connection being drawn.
    pub connecting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLine {
    pub from: EntityId,
    pub to: EntityId,
    pub kind: ConnectionKind,
    pub line: Line,
}

/// A complete frame description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub pan: Vec2,
    pub zoom: f64,
    pub zones: Vec<ZoneShape>,
    pub connections: Vec<ConnectionLine>,
    pub cards: Vec<CardShape>,
}

impl Scene {
    pub fn card(&self, id: EntityId) -> Option<&CardShape> {
        self.cards.iter().find(|c| c.id == id)
    }
}

/// Build the display list for one frame.
#[must_use]
pub fn build_scene(
    store: &EntityStore,
    camera: &Camera,
    config: &CanvasConfig,
    overlay: &Overlay,
) -> Scene {
    let canvas = config.canvas_size;
    let card = config.card_size;

    let zones = ZONES
        .iter()
        .map(|zone| ZoneShape {
            id: zone.id,
            name: zone.name,
            description: zone.description,
            rect: zone.pixel_rect(canvas),
            highlighted: overlay.highlighted_zone == Some(zone.id),
        })
        .collect();

    // Dragged cards draw at their preview position.
    let drawn_position = |id: EntityId, stored: Point| match overlay.dragging {
        Some((dragged, preview)) if dragged == id => preview,
        _ => stored,
    };
    let dragged_id = overlay.dragging.map(|(id, _)| id);

    let graph = ConnectionGraph::build(store.iter());
    let connections: Vec<ConnectionLine> = graph
        .connections()
        .into_iter()
        .filter_map(|conn| {
            let from = store.get(conn.from)?;
            let to = store.get(conn.to)?;
            Some(ConnectionLine {
                from: conn.from,
                to: conn.to,
                kind: conn.kind,
                line: Line::new(
                    card_center(drawn_position(from.id, from.position), card),
                    card_center(drawn_position(to.id, to.position), card),
                ),
            })
        })
        .collect();

    let mut cards: Vec<CardShape> = store
        .iter()
        .map(|entity| {
            let selected = overlay.selected == Some(entity.id);
            CardShape {
                id: entity.id,
                name: entity.name.clone(),
                kind: entity.kind,
                type_label: entity.kind.label(),
                zone: entity.zone,
                rect: card_rect(drawn_position(entity.id, entity.position), card),
                revenue: entity.revenue(),
                value: entity.value(),
                selected,
                elevated: selected || dragged_id == Some(entity.id),
                connecting: overlay.connecting_from == Some(entity.id),
            }
        })
        .collect();
    // Stable: non-elevated cards keep store order.
    cards.sort_by_key(|c| c.elevated);
    log::trace!(
        "scene: {} cards, {} connections at zoom {:.2}",
        cards.len(),
        connections.len(),
        camera.zoom()
    );

    Scene {
        pan: camera.pan,
        zoom: camera.zoom(),
        zones,
        connections,
        cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tf_core::{EntityDraft, Size};

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store
            .create(EntityDraft::new("Trust", EntityType::Trust).at(Point::new(100.0, 450.0)))
            .unwrap();
        store
            .create(EntityDraft::new("LLC", EntityType::Llc).at(Point::new(700.0, 150.0)))
            .unwrap();
        store.connect(EntityId(1), EntityId(2)).unwrap();
        store
    }

    #[test]
    fn scene_lists_zones_cards_and_lines() {
        let config = CanvasConfig::default();
        let scene = build_scene(&store(), &Camera::default(), &config, &Overlay::default());
        assert_eq!(scene.zones.len(), 4);
        assert_eq!(scene.cards.len(), 2);
        assert_eq!(scene.connections.len(), 1);
        let line = &scene.connections[0];
        assert_eq!(line.kind, ConnectionKind::Ownership);
        assert_eq!(line.line.p0, Point::new(190.0, 500.0));
        assert_eq!(line.line.p1, Point::new(790.0, 200.0));
        assert_eq!(
            scene.card(EntityId(2)).unwrap().rect.size(),
            Size::new(180.0, 100.0)
        );
    }

    #[test]
    fn dragged_card_is_elevated_and_previewed() {
        let config = CanvasConfig::default();
        let overlay = Overlay {
            dragging: Some((EntityId(1), Point::new(300.0, 300.0))),
            highlighted_zone: Some(ZoneId::Operations),
            ..Overlay::default()
        };
        let scene = build_scene(&store(), &Camera::default(), &config, &overlay);

        let last = scene.cards.last().unwrap();
        assert_eq!(last.id, EntityId(1));
        assert!(last.elevated);
        assert_eq!(last.rect.origin(), Point::new(300.0, 300.0));
        assert_eq!(scene.connections[0].line.p0, Point::new(390.0, 350.0));
        assert!(
            scene
                .zones
                .iter()
                .all(|z| z.highlighted == (z.id == ZoneId::Operations))
        );
    }
}
