//! Drag/connect interaction controller.
//!
//! Translates pointer input into `CanvasMutation`s that the session applies
//! to the store and camera. Exactly one mode is active at a time; every
//! mode is entered from `Idle` and returns to `Idle`.
//!
//! | Mode | Entered by | Left by |
//! |------|------------|---------|
//! | `DraggingEntity` | pointer down on a card | pointer up (drop) |
//! | `Panning` | pointer down on background | pointer up |
//! | `Connecting` | `start_connection` | `end_connection`, background click, cancel |

use crate::input::InputEvent;
use crate::tips::TipTrigger;
use kurbo::{Point, Vec2};
use tf_core::layout::{card_center, clamp_to_canvas};
use tf_core::{
    Camera, CanvasConfig, EntityId, EntityStore, SnapPoint, ZoneId, nearest_snap_point, zone_at,
};
use tf_render::Overlay;

/// Screen distance a pointer must travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Everything the controller reads to resolve an event.
#[derive(Debug, Clone, Copy)]
pub struct InteractionContext<'a> {
    pub store: &'a EntityStore,
    pub camera: &'a Camera,
    pub config: &'a CanvasConfig,
    pub snap_points: &'a [SnapPoint],
    /// Screen offset of the canvas element.
    pub origin: Point,
}

impl InteractionContext<'_> {
    fn to_world(&self, screen: Point) -> Point {
        self.camera.screen_to_world(screen, self.origin)
    }
}

/// A change the controller asks the session to make.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasMutation {
    /// Place an entity at a world position inside a zone.
    MoveEntity {
        id: EntityId,
        position: Point,
        zone: ZoneId,
    },
    Connect {
        from: EntityId,
        to: EntityId,
    },
    /// Shift the camera pan by a screen-space delta.
    Pan {
        delta: Vec2,
    },
    /// Look up and show the tip for `trigger` near a screen position.
    ShowTip {
        trigger: TipTrigger,
        anchor: Point,
    },
}

/// In-flight drag of one entity card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub entity: EntityId,
    /// Pointer world position minus card position at press time.
    grab_offset: Vec2,
    press: Point,
    /// Whether the pointer left the drag threshold.
    pub moved: bool,
    /// Where the card would land if dropped now.
    pub preview: Point,
    pub snap: Option<SnapPoint>,
    /// Zone under the pointer.
    pub zone: Option<ZoneId>,
}

impl DragState {
    /// Recompute preview, snap, and zone for the pointer at `screen`.
    /// Snapping keys off the card's top-left corner (pointer minus grab
    /// offset); the zone comes from the pointer itself.
    fn track(&mut self, screen: Point, ctx: &InteractionContext<'_>) {
        if !self.moved && (screen - self.press).hypot() > DRAG_THRESHOLD {
            self.moved = true;
        }
        if !self.moved {
            return;
        }
        let world = ctx.to_world(screen);
        let candidate = world - self.grab_offset;
        self.zone = zone_at(world, ctx.config.canvas_size);
        self.snap = match self.zone {
            Some(_) => nearest_snap_point(candidate, ctx.snap_points, ctx.config.snap_threshold),
            None => None,
        };
        self.preview = self.snap.map_or(candidate, |s| s.position);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    DraggingEntity(DragState),
    Panning {
        last: Point,
    },
    Connecting {
        source: EntityId,
    },
}

impl InteractionMode {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::DraggingEntity(_) => "dragging",
            InteractionMode::Panning { .. } => "panning",
            InteractionMode::Connecting { .. } => "connecting",
        }
    }
}

/// The interaction state machine plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    mode: InteractionMode,
    selected: Option<EntityId>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, InteractionMode::Idle)
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<EntityId>) {
        self.selected = id;
    }

    fn enter(&mut self, mode: InteractionMode) {
        log::debug!("interaction: {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
    }

    /// Handle a pointer event. `hit` is the entity under the pointer.
    /// Key events are resolved by the shortcut map, not here.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        hit: Option<EntityId>,
        ctx: &InteractionContext<'_>,
    ) -> Vec<CanvasMutation> {
        if !event.is_valid() {
            log::warn!("dropping non-finite pointer event");
            return vec![];
        }
        match *event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(x, y), hit, ctx),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y), ctx),
            InputEvent::PointerUp { x, y } => self.pointer_up(Point::new(x, y), ctx),
            InputEvent::Key { .. } => vec![],
        }
    }

    fn pointer_down(
        &mut self,
        screen: Point,
        hit: Option<EntityId>,
        ctx: &InteractionContext<'_>,
    ) -> Vec<CanvasMutation> {
        match self.mode {
            InteractionMode::Connecting { .. } => {
                return match hit {
                    Some(target) => self.end_connection(target, ctx),
                    None => {
                        self.cancel();
                        vec![]
                    }
                };
            }
            // A missed pointer-up leaves a stale mode behind.
            InteractionMode::DraggingEntity(_) | InteractionMode::Panning { .. } => {
                self.cancel();
            }
            InteractionMode::Idle => {}
        }

        match hit.and_then(|id| ctx.store.get(id)) {
            Some(entity) => {
                self.selected = Some(entity.id);
                let world = ctx.to_world(screen);
                self.enter(InteractionMode::DraggingEntity(DragState {
                    entity: entity.id,
                    grab_offset: world - entity.position,
                    press: screen,
                    moved: false,
                    preview: entity.position,
                    snap: None,
                    zone: None,
                }));
            }
            None => {
                self.selected = None;
                self.enter(InteractionMode::Panning { last: screen });
            }
        }
        vec![]
    }

    fn pointer_move(&mut self, screen: Point, ctx: &InteractionContext<'_>) -> Vec<CanvasMutation> {
        match &mut self.mode {
            InteractionMode::DraggingEntity(drag) => {
                drag.track(screen, ctx);
                log::trace!("drag {} preview {:?} zone {:?}", drag.entity, drag.preview, drag.zone);
                vec![]
            }
            InteractionMode::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                if delta == Vec2::ZERO {
                    vec![]
                } else {
                    vec![CanvasMutation::Pan { delta }]
                }
            }
            InteractionMode::Idle | InteractionMode::Connecting { .. } => vec![],
        }
    }

    fn pointer_up(&mut self, screen: Point, ctx: &InteractionContext<'_>) -> Vec<CanvasMutation> {
        match self.mode {
            InteractionMode::DraggingEntity(mut drag) => {
                self.enter(InteractionMode::Idle);
                drag.track(screen, ctx);
                if !drag.moved {
                    // Plain click: selection only.
                    return vec![];
                }
                Self::drop_entity(&drag, screen, ctx)
            }
            InteractionMode::Panning { .. } => {
                self.enter(InteractionMode::Idle);
                vec![]
            }
            InteractionMode::Idle | InteractionMode::Connecting { .. } => vec![],
        }
    }

    fn drop_entity(
        drag: &DragState,
        screen: Point,
        ctx: &InteractionContext<'_>,
    ) -> Vec<CanvasMutation> {
        let Some(zone) = drag.zone else {
            log::debug!("drop of {} outside every zone ignored", drag.entity);
            return vec![];
        };
        let Some(entity) = ctx.store.get(drag.entity) else {
            log::warn!("dragged entity {} no longer exists", drag.entity);
            return vec![];
        };

        let position = clamp_to_canvas(drag.preview, ctx.config.canvas_size);
        let mut mutations = Vec::with_capacity(2);
        if zone != entity.zone || position != entity.position {
            mutations.push(CanvasMutation::MoveEntity {
                id: entity.id,
                position,
                zone,
            });
        }
        mutations.push(CanvasMutation::ShowTip {
            trigger: TipTrigger::Zone(zone),
            anchor: screen,
        });
        mutations
    }

    /// Enter `Connecting` from `Idle` with `source` as the edge origin.
    /// Returns `false` if another mode is active or `source` is unknown.
    pub fn start_connection(&mut self, source: EntityId, ctx: &InteractionContext<'_>) -> bool {
        if !self.is_idle() || !ctx.store.contains(source) {
            log::debug!("start_connection({source}) ignored in {}", self.mode.name());
            return false;
        }
        self.selected = Some(source);
        self.enter(InteractionMode::Connecting { source });
        true
    }

    /// Finish a connection at `target`. Self-connections are rejected.
    pub fn end_connection(
        &mut self,
        target: EntityId,
        ctx: &InteractionContext<'_>,
    ) -> Vec<CanvasMutation> {
        let InteractionMode::Connecting { source } = self.mode else {
            return vec![];
        };
        self.enter(InteractionMode::Idle);

        if source == target {
            log::warn!("rejected self-connection on {source}");
            return vec![];
        }
        let Some(to) = ctx.store.get(target) else {
            log::warn!("connection target {target} no longer exists");
            return vec![];
        };
        if !ctx.store.contains(source) {
            log::warn!("connection source {source} no longer exists");
            return vec![];
        }

        let anchor = ctx
            .camera
            .world_to_screen(card_center(to.position, ctx.config.card_size), ctx.origin);
        vec![
            CanvasMutation::Connect {
                from: source,
                to: target,
            },
            CanvasMutation::ShowTip {
                trigger: TipTrigger::Connection,
                anchor,
            },
        ]
    }

    /// Abandon the active mode without mutating anything.
    /// Returns `false` if already idle.
    pub fn cancel(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        self.enter(InteractionMode::Idle);
        true
    }

    /// Forget an entity that left the store.
    pub fn forget(&mut self, id: EntityId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        let involved = match self.mode {
            InteractionMode::DraggingEntity(drag) => drag.entity == id,
            InteractionMode::Connecting { source } => source == id,
            _ => false,
        };
        if involved {
            self.cancel();
        }
    }

    /// Drawing state for the scene builder.
    pub fn overlay(&self) -> Overlay {
        let mut overlay = Overlay {
            selected: self.selected,
            ..Overlay::default()
        };
        match self.mode {
            InteractionMode::DraggingEntity(drag) if drag.moved => {
                overlay.dragging = Some((drag.entity, drag.preview));
                overlay.highlighted_zone = drag.zone;
            }
            InteractionMode::Connecting { source } => overlay.connecting_from = Some(source),
            _ => {}
        }
        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::{EntityDraft, EntityType, generate_snap_points};

    struct Fixture {
        store: EntityStore,
        camera: Camera,
        config: CanvasConfig,
        snaps: Vec<SnapPoint>,
    }

    impl Fixture {
        fn new() -> Self {
            let config = CanvasConfig::default();
            let mut store = EntityStore::new();
            store
                .create(EntityDraft::new("Ops", EntityType::SCorp).at(Point::new(100.0, 100.0)))
                .unwrap();
            store
                .create(EntityDraft::new("Holdings", EntityType::Llc).at(Point::new(700.0, 100.0)))
                .unwrap();
            Self {
                snaps: generate_snap_points(config.canvas_size, config.grid_spacing),
                store,
                camera: Camera::default(),
                config,
            }
        }

        fn ctx(&self) -> InteractionContext<'_> {
            InteractionContext {
                store: &self.store,
                camera: &self.camera,
                config: &self.config,
                snap_points: &self.snaps,
                origin: Point::ORIGIN,
            }
        }
    }

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown { x, y }
    }

    fn mv(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove { x, y }
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerUp { x, y }
    }

    #[test]
    fn drag_into_zone_snaps_and_moves() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();

        // Grab card 1 at its top-left + (10, 10).
        assert!(c.handle(&down(110.0, 110.0), Some(EntityId(1)), &ctx).is_empty());
        assert_eq!(c.selected(), Some(EntityId(1)));
        // Move to a point in the assets zone; card lands near (707, 203).
        assert!(c.handle(&mv(717.0, 213.0), None, &ctx).is_empty());
        let overlay = c.overlay();
        assert_eq!(overlay.dragging, Some((EntityId(1), Point::new(700.0, 200.0))));
        assert_eq!(overlay.highlighted_zone, Some(ZoneId::Assets));

        let mutations = c.handle(&up(717.0, 213.0), None, &ctx);
        assert!(c.is_idle());
        assert_eq!(
            mutations,
            vec![
                CanvasMutation::MoveEntity {
                    id: EntityId(1),
                    position: Point::new(700.0, 200.0),
                    zone: ZoneId::Assets,
                },
                CanvasMutation::ShowTip {
                    trigger: TipTrigger::Zone(ZoneId::Assets),
                    anchor: Point::new(717.0, 213.0),
                },
            ]
        );
    }

    #[test]
    fn drop_outside_zones_is_ignored() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.handle(&down(110.0, 110.0), Some(EntityId(1)), &ctx);
        c.handle(&mv(600.0, 200.0), None, &ctx);
        // x = 0.5 of the canvas falls between operations and assets.
        assert!(c.handle(&up(600.0, 200.0), None, &ctx).is_empty());
        assert!(c.is_idle());
    }

    #[test]
    fn click_without_move_only_selects() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.handle(&down(110.0, 110.0), Some(EntityId(1)), &ctx);
        c.handle(&mv(111.0, 111.0), None, &ctx);
        assert!(c.handle(&up(111.0, 111.0), None, &ctx).is_empty());
        assert_eq!(c.selected(), Some(EntityId(1)));
        assert_eq!(c.overlay().dragging, None);
    }

    #[test]
    fn panning_emits_every_move_delta() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.handle(&down(10.0, 10.0), None, &ctx);
        assert!(matches!(c.mode(), InteractionMode::Panning { .. }));
        assert_eq!(
            c.handle(&mv(15.0, 12.0), None, &ctx),
            vec![CanvasMutation::Pan { delta: Vec2::new(5.0, 2.0) }]
        );
        assert_eq!(
            c.handle(&mv(10.0, 20.0), None, &ctx),
            vec![CanvasMutation::Pan { delta: Vec2::new(-5.0, 8.0) }]
        );
        assert!(c.handle(&up(10.0, 20.0), None, &ctx).is_empty());
        assert!(c.is_idle());
    }

    #[test]
    fn connection_flow() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        assert!(c.start_connection(EntityId(1), &ctx));
        assert!(!c.start_connection(EntityId(2), &ctx));
        let mutations = c.end_connection(EntityId(2), &ctx);
        assert_eq!(
            mutations[0],
            CanvasMutation::Connect {
                from: EntityId(1),
                to: EntityId(2),
            }
        );
        assert_eq!(
            mutations[1],
            CanvasMutation::ShowTip {
                trigger: TipTrigger::Connection,
                anchor: Point::new(790.0, 150.0),
            }
        );
        assert!(c.is_idle());
    }

    #[test]
    fn self_connection_is_rejected() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.start_connection(EntityId(1), &ctx);
        assert!(c.end_connection(EntityId(1), &ctx).is_empty());
        assert!(c.is_idle());
    }

    #[test]
    fn background_click_cancels_connection() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.start_connection(EntityId(1), &ctx);
        assert!(c.handle(&down(5.0, 5.0), None, &ctx).is_empty());
        assert!(c.is_idle());
    }

    #[test]
    fn click_on_card_ends_connection() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.start_connection(EntityId(2), &ctx);
        let mutations = c.handle(&down(110.0, 110.0), Some(EntityId(1)), &ctx);
        assert!(matches!(
            mutations[0],
            CanvasMutation::Connect { from: EntityId(2), to: EntityId(1) }
        ));
        assert!(c.is_idle());
    }

    #[test]
    fn forget_cancels_drag_of_deleted_entity() {
        let f = Fixture::new();
        let ctx = f.ctx();
        let mut c = InteractionController::new();
        c.handle(&down(110.0, 110.0), Some(EntityId(1)), &ctx);
        c.forget(EntityId(1));
        assert!(c.is_idle());
        assert_eq!(c.selected(), None);
    }
}
