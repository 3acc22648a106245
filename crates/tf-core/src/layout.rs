//! Placement helpers for entity cards.
//!
//! Auto-arrange lays entities out on a two-column grid inside their zone,
//! starting from a per-zone base point expressed as a canvas fraction.
//! Clamping keeps a card's top-left inside the canvas with room for the card.

use crate::id::EntityId;
use crate::model::Entity;
use crate::zone::ZoneId;
use kurbo::{Point, Size, Vec2};

/// Horizontal step between arranged cards.
pub const ARRANGE_STEP: f64 = 200.0;
/// Row width before arranged cards wrap.
pub const ARRANGE_ROW_WIDTH: f64 = 400.0;
/// Vertical step between arranged rows.
pub const ARRANGE_ROW_HEIGHT: f64 = 120.0;
/// Space kept between a clamped position and the canvas' right/bottom edge.
pub const CLAMP_MARGIN: Size = Size::new(200.0, 150.0);

/// One placement produced by [`auto_arrange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: EntityId,
    pub position: Point,
    pub zone: ZoneId,
}

/// Base point of a zone's arrangement grid as a canvas fraction.
fn arrange_base(zone: ZoneId) -> Vec2 {
    match zone {
        ZoneId::Operations => Vec2::new(0.125, 0.1875),
        ZoneId::Assets => Vec2::new(0.5833, 0.1875),
        ZoneId::Foundation => Vec2::new(0.125, 0.5625),
        ZoneId::Flow => Vec2::new(0.125, 0.8125),
    }
}

/// Grid offset of the `index`-th card in a zone.
fn arrange_offset(index: usize) -> Vec2 {
    let offset = index as f64 * ARRANGE_STEP;
    Vec2::new(
        offset % ARRANGE_ROW_WIDTH,
        (offset / ARRANGE_ROW_WIDTH).floor() * ARRANGE_ROW_HEIGHT,
    )
}

/// Compute arranged positions for `entities`, in their iteration order.
///
/// Each entity keeps its zone; cards fill their zone's grid left to right,
/// two per row.
#[must_use]
pub fn auto_arrange<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    canvas: Size,
) -> Vec<Placement> {
    let mut counters = [0usize; ZoneId::ALL.len()];
    entities
        .into_iter()
        .map(|entity| {
            let slot = zone_slot(entity.zone);
            let index = counters[slot];
            counters[slot] += 1;

            let base = arrange_base(entity.zone);
            let origin = Point::new(base.x * canvas.width, base.y * canvas.height);
            Placement {
                id: entity.id,
                position: origin + arrange_offset(index),
                zone: entity.zone,
            }
        })
        .collect()
}

fn zone_slot(zone: ZoneId) -> usize {
    ZoneId::ALL.iter().position(|z| *z == zone).unwrap_or(0)
}

/// Clamp a card position into `[0, canvas - margin]` on both axes.
///
/// Canvases smaller than the margin clamp to the origin.
pub fn clamp_to_canvas(position: Point, canvas: Size) -> Point {
    let max_x = (canvas.width - CLAMP_MARGIN.width).max(0.0);
    let max_y = (canvas.height - CLAMP_MARGIN.height).max(0.0);
    Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

/// Center of a card whose top-left is `position`.
pub fn card_center(position: Point, card: Size) -> Point {
    position + Vec2::new(card.width / 2.0, card.height / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityDraft, EntityType};
    use crate::store::EntityStore;

    const CANVAS: Size = Size::new(1200.0, 800.0);

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 0.5
    }

    #[test]
    fn arrange_fills_two_columns_per_zone() {
        let mut store = EntityStore::new();
        for i in 0..3 {
            store
                .create(EntityDraft::new(format!("Corp {i}"), EntityType::SCorp))
                .unwrap();
        }
        store.create(EntityDraft::new("Holdings", EntityType::Llc)).unwrap();

        let placements = auto_arrange(store.iter(), CANVAS);
        let positions: Vec<Point> = placements.iter().map(|p| p.position).collect();
        assert!(close(positions[0], Point::new(150.0, 150.0)));
        assert!(close(positions[1], Point::new(350.0, 150.0)));
        assert!(close(positions[2], Point::new(150.0, 270.0)));
        assert!(close(positions[3], Point::new(700.0, 150.0)));
        assert_eq!(placements[3].zone, ZoneId::Assets);
    }

    #[test]
    fn arrange_scales_with_canvas() {
        let mut store = EntityStore::new();
        store.create(EntityDraft::new("Trust", EntityType::Trust)).unwrap();
        let placements = auto_arrange(store.iter(), Size::new(600.0, 400.0));
        assert!(close(placements[0].position, Point::new(75.0, 225.0)));
    }

    #[test]
    fn clamp_keeps_card_on_canvas() {
        assert_eq!(
            clamp_to_canvas(Point::new(-40.0, 2000.0), CANVAS),
            Point::new(0.0, 650.0)
        );
        assert_eq!(
            clamp_to_canvas(Point::new(1100.0, 10.0), CANVAS),
            Point::new(1000.0, 10.0)
        );
        assert_eq!(
            clamp_to_canvas(Point::new(50.0, 50.0), Size::new(100.0, 100.0)),
            Point::ORIGIN
        );
    }

    #[test]
    fn card_center_is_offset_by_half_size() {
        assert_eq!(
            card_center(Point::new(10.0, 20.0), Size::new(180.0, 100.0)),
            Point::new(100.0, 70.0)
        );
    }
}
