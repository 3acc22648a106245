//! Hit testing: world point → entity lookup.
//!
//! Cards are painted in store order with the selected card raised to the
//! top, so the search walks the same order back to front.

use tf_core::{EntityId, EntityStore, Point, Rect, Size};

/// World-space rectangle of a card whose top-left is `position`.
pub fn card_rect(position: Point, card: Size) -> Rect {
    Rect::from_origin_size(position, card)
}

/// Find the topmost entity card under `world`.
///
/// `selected` is checked first because it paints above the rest. Returns
/// `None` for the background.
pub fn hit_test(
    store: &EntityStore,
    world: Point,
    selected: Option<EntityId>,
    card: Size,
) -> Option<EntityId> {
    if let Some(id) = selected
        && let Some(entity) = store.get(id)
        && card_rect(entity.position, card).contains(world)
    {
        return Some(id);
    }

    // Last painted = topmost
    store
        .iter()
        .rev()
        .find(|entity| card_rect(entity.position, card).contains(world))
        .map(|entity| entity.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::{EntityDraft, EntityType};

    const CARD: Size = Size::new(180.0, 100.0);

    fn overlapping_store() -> EntityStore {
        let mut store = EntityStore::new();
        store
            .create(EntityDraft::new("Under", EntityType::Llc).at(Point::new(100.0, 100.0)))
            .unwrap();
        store
            .create(EntityDraft::new("Over", EntityType::Trust).at(Point::new(150.0, 120.0)))
            .unwrap();
        store
    }

    #[test]
    fn topmost_card_wins() {
        let store = overlapping_store();
        assert_eq!(
            hit_test(&store, Point::new(200.0, 150.0), None, CARD),
            Some(EntityId(2))
        );
        assert_eq!(
            hit_test(&store, Point::new(110.0, 110.0), None, CARD),
            Some(EntityId(1))
        );
    }

    #[test]
    fn selected_card_is_raised() {
        let store = overlapping_store();
        assert_eq!(
            hit_test(&store, Point::new(200.0, 150.0), Some(EntityId(1)), CARD),
            Some(EntityId(1))
        );
    }

    #[test]
    fn background_misses() {
        let store = overlapping_store();
        assert_eq!(hit_test(&store, Point::new(10.0, 10.0), None, CARD), None);
        assert_eq!(hit_test(&EntityStore::new(), Point::ORIGIN, None, CARD), None);
    }
}
