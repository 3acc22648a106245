//! The canvas session: one store, one camera, one controller.
//!
//! The session owns the authoritative `EntityStore` and routes every change
//! through it:
//!
//! - **Input → Store**: pointer events go through the interaction
//!   controller, which proposes `CanvasMutation`s; the session applies them
//!   and queues a `PendingWrite` for the persistence collaborator.
//! - **Store → Advice**: every structural change re-arms the gap-analysis
//!   debouncer. Once the graph has been quiet for the configured period,
//!   `tick` re-runs the analyzer and announces a new head gap.
//!
//! Local changes apply immediately. Writes are best effort: a failed flush
//! yields an error notification and the local state stays as it is.
//!
//! Time is an offset from session start supplied by the host through
//! `tick` and `handle_input`. Mutations are stamped with the latest value.

use crate::debounce::Debouncer;
use crate::input::{InputEvent, Modifiers};
use crate::interaction::{CanvasMutation, InteractionContext, InteractionController};
use crate::notify::Notification;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tips::{Tip, TipDisplay, TipLibrary, TipTrigger, VisibleTip};
use kurbo::{Point, Size};
use serde::Serialize;
use std::time::Duration;
use tf_core::form::{EntityForm, FieldErrors};
use tf_core::layout::{auto_arrange, card_center};
use tf_core::{
    Camera, CanvasConfig, Entity, EntityDraft, EntityId, EntityPatch, EntityStore, Gap, GapKind,
    Priority, SnapPoint, StoreResult, detect_gaps, generate_snap_points, template,
};
use tf_render::{MiniMap, MiniMapView, Scene, build_scene, hit_test};

/// A change waiting to be sent to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "data", rename_all = "camelCase")]
pub enum PendingWrite {
    /// A locally created entity. The backend assigns its own id.
    CreateEntity(Entity),
    UpdateEntity {
        id: EntityId,
        patch: EntityPatch,
    },
    DeleteEntity(EntityId),
    /// An analyzer finding recorded in the tips collection.
    CreateTip(Tip),
}

pub struct CanvasSession {
    config: CanvasConfig,
    store: EntityStore,
    camera: Camera,
    snap_points: Vec<SnapPoint>,
    controller: InteractionController,
    /// Screen offset of the canvas element.
    origin: Point,

    tips: TipLibrary,
    tip_display: TipDisplay,

    gap_debounce: Debouncer,
    gaps: Vec<Gap>,
    /// Head of the gap list when it was last announced.
    announced_gap: Option<(GapKind, EntityId)>,

    pending_delete: Option<EntityId>,
    notifications: Vec<Notification>,
    outbox: Vec<PendingWrite>,
    clock: Duration,
}

impl CanvasSession {
    /// An empty session with the built-in tips.
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_data(config, EntityStore::new(), TipLibrary::with_defaults())
    }

    /// A session over previously loaded records.
    pub fn from_records(
        config: CanvasConfig,
        entities: Vec<Entity>,
        tips: Vec<Tip>,
    ) -> StoreResult<Self> {
        let store = EntityStore::from_entities(entities)?;
        let tips = if tips.is_empty() {
            TipLibrary::with_defaults()
        } else {
            TipLibrary::from_tips(tips)
        };
        Ok(Self::with_data(config, store, tips))
    }

    pub fn with_data(config: CanvasConfig, store: EntityStore, tips: TipLibrary) -> Self {
        let config = config.sanitized();
        log::info!(
            "session: {} entities, {} tips, canvas {}x{}",
            store.len(),
            tips.len(),
            config.canvas_size.width,
            config.canvas_size.height
        );
        let mut gap_debounce = Debouncer::new(config.gap_quiet_period());
        if !store.is_empty() {
            gap_debounce.touch(Duration::ZERO);
        }
        Self {
            snap_points: generate_snap_points(config.canvas_size, config.grid_spacing),
            camera: Camera::new(config.zoom),
            controller: InteractionController::new(),
            origin: Point::ORIGIN,
            tip_display: TipDisplay::new(config.tip_duration()),
            tips,
            gap_debounce,
            gaps: Vec::new(),
            announced_gap: None,
            pending_delete: None,
            notifications: Vec::new(),
            outbox: Vec::new(),
            clock: Duration::ZERO,
            store,
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn snap_points(&self) -> &[SnapPoint] {
        &self.snap_points
    }

    pub fn tips(&self) -> &TipLibrary {
        &self.tips
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.controller.selected()
    }

    /// Gaps from the most recent analysis run.
    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn visible_tip(&self) -> Option<&VisibleTip> {
        self.tip_display.visible()
    }

    pub fn pending_delete(&self) -> Option<EntityId> {
        self.pending_delete
    }

    pub fn analysis_pending(&self) -> bool {
        self.gap_debounce.is_pending()
    }

    /// Drain notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Drain writes queued since the last call, oldest first.
    pub fn take_writes(&mut self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.outbox)
    }

    // ─── Host plumbing ───────────────────────────────────────────────────

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Change the logical canvas size and regenerate snap points.
    pub fn resize(&mut self, canvas: Size) {
        let config = CanvasConfig {
            canvas_size: canvas,
            ..self.config.clone()
        }
        .sanitized();
        self.snap_points = generate_snap_points(config.canvas_size, config.grid_spacing);
        self.config = config;
    }

    /// Advance time: expire the visible tip and run due gap analysis.
    pub fn tick(&mut self, now: Duration) {
        self.clock = self.clock.max(now);
        if self.tip_display.tick(self.clock) {
            log::trace!("tip auto-hidden");
        }
        if self.gap_debounce.poll(self.clock) {
            self.run_gap_analysis();
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event. Returns `true` if anything visible changed.
    pub fn handle_input(&mut self, event: &InputEvent, now: Duration) -> bool {
        self.tick(now);
        if let InputEvent::Key { key, modifiers } = event {
            return self.handle_key(key, *modifiers);
        }
        let Some(screen) = event.position() else {
            return false;
        };
        if !screen.is_finite() {
            log::warn!("dropping non-finite pointer event");
            return false;
        }

        let world = self.camera.screen_to_world(screen, self.origin);
        let hit = hit_test(
            &self.store,
            world,
            self.controller.selected(),
            self.config.card_size,
        );
        let before = (*self.controller.mode(), self.controller.selected());
        let ctx = InteractionContext {
            store: &self.store,
            camera: &self.camera,
            config: &self.config,
            snap_points: &self.snap_points,
            origin: self.origin,
        };
        let mutations = self.controller.handle(event, hit, &ctx);
        let changed = before != (*self.controller.mode(), self.controller.selected());
        self.apply_all(mutations) || changed
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return false;
        };
        log::trace!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::ResetView => self.reset_view(),
            ShortcutAction::Cancel => {
                self.controller.cancel() || self.cancel_delete() || self.dismiss_tip()
            }
            ShortcutAction::Delete => match self.controller.selected() {
                Some(id) => self.request_delete(id),
                None => false,
            },
            ShortcutAction::AutoArrange => self.auto_arrange() > 0,
        }
    }

    /// Apply controller output. Returns `true` if anything changed.
    fn apply_all(&mut self, mutations: Vec<CanvasMutation>) -> bool {
        let mut changed = false;
        for mutation in mutations {
            changed |= self.apply(mutation);
        }
        changed
    }

    fn apply(&mut self, mutation: CanvasMutation) -> bool {
        match mutation {
            CanvasMutation::MoveEntity { id, position, zone } => {
                let patch = EntityPatch::placement(position, zone);
                match self.store.update(id, patch.clone()) {
                    Ok(_) => {
                        self.queue_update(id, patch);
                        true
                    }
                    Err(err) => {
                        self.report("Failed to update entity position", &err);
                        false
                    }
                }
            }
            CanvasMutation::Connect { from, to } => self.connect(from, to),
            CanvasMutation::Pan { delta } => {
                self.camera.pan_by(delta);
                true
            }
            CanvasMutation::ShowTip { trigger, anchor } => self.show_tip(trigger, anchor),
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        let before = self.camera.zoom();
        self.camera.zoom_in();
        self.camera.zoom() != before
    }

    pub fn zoom_out(&mut self) -> bool {
        let before = self.camera.zoom();
        self.camera.zoom_out();
        self.camera.zoom() != before
    }

    pub fn reset_view(&mut self) -> bool {
        let before = self.camera;
        self.camera.reset();
        self.camera != before
    }

    /// Set the pan directly, e.g. from a minimap click.
    pub fn set_pan(&mut self, pan: kurbo::Vec2) {
        self.camera.set_pan(pan);
    }

    /// Navigate to the canvas point under a minimap click.
    pub fn navigate_minimap(&mut self, click: Point) {
        let pan = MiniMap::new(&self.config).navigate(click);
        self.camera.set_pan(pan);
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        build_scene(
            &self.store,
            &self.camera,
            &self.config,
            &self.controller.overlay(),
        )
    }

    #[must_use]
    pub fn minimap(&self) -> MiniMapView {
        MiniMap::new(&self.config).view(&self.store, &self.camera)
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Enter connection mode from `source`.
    pub fn start_connection(&mut self, source: EntityId) -> bool {
        let ctx = InteractionContext {
            store: &self.store,
            camera: &self.camera,
            config: &self.config,
            snap_points: &self.snap_points,
            origin: self.origin,
        };
        self.controller.start_connection(source, &ctx)
    }

    /// Finish the active connection at `target`.
    pub fn end_connection(&mut self, target: EntityId) -> bool {
        let ctx = InteractionContext {
            store: &self.store,
            camera: &self.camera,
            config: &self.config,
            snap_points: &self.snap_points,
            origin: self.origin,
        };
        let mutations = self.controller.end_connection(target, &ctx);
        self.apply_all(mutations)
    }

    pub fn cancel_interaction(&mut self) -> bool {
        self.controller.cancel()
    }

    /// Add `from → to`. Returns `true` if the edge is new.
    pub fn connect(&mut self, from: EntityId, to: EntityId) -> bool {
        let before = self.store.get(from).map(|e| e.connections.len());
        match self.store.connect(from, to) {
            Ok(entity) if Some(entity.connections.len()) != before => {
                self.queue_connections(&entity);
                true
            }
            Ok(_) => false,
            Err(err) => {
                self.report("Failed to connect entities", &err);
                false
            }
        }
    }

    pub fn disconnect(&mut self, from: EntityId, to: EntityId) -> bool {
        let before = self.store.get(from).map(|e| e.connections.len());
        match self.store.disconnect(from, to) {
            Ok(entity) if Some(entity.connections.len()) != before => {
                self.queue_connections(&entity);
                true
            }
            Ok(_) => false,
            Err(err) => {
                self.report("Failed to disconnect entities", &err);
                false
            }
        }
    }

    // ─── Entity lifecycle ────────────────────────────────────────────────

    pub fn create_entity(&mut self, draft: EntityDraft) -> Option<Entity> {
        match self.store.create(draft) {
            Ok(entity) => {
                self.notifications
                    .push(Notification::success(format!("Created {}", entity.name)));
                self.outbox.push(PendingWrite::CreateEntity(entity.clone()));
                self.graph_changed();
                Some(entity)
            }
            Err(err) => {
                self.report("Failed to create entity", &err);
                None
            }
        }
    }

    /// Validate the form and create an entity from it. Field errors are
    /// returned for inline display and never reach the store.
    pub fn create_from_form(&mut self, form: &EntityForm) -> Result<Option<Entity>, FieldErrors> {
        let draft = form.validate()?;
        Ok(self.create_entity(draft))
    }

    /// Create an entity prefilled from a catalog template.
    pub fn create_from_template(&mut self, template_id: &str) -> Option<Entity> {
        let Some(template) = template::find(template_id) else {
            log::warn!("unknown template `{template_id}`");
            self.notifications
                .push(Notification::error(format!("Unknown template `{template_id}`")));
            return None;
        };
        self.create_entity(template.to_draft())
    }

    pub fn update_entity(&mut self, id: EntityId, patch: EntityPatch) -> Option<Entity> {
        match self.store.update(id, patch.clone()) {
            Ok(entity) => {
                self.notifications
                    .push(Notification::success(format!("Updated {}", entity.name)));
                self.queue_update(id, patch);
                Some(entity)
            }
            Err(err) => {
                self.report("Failed to update entity", &err);
                None
            }
        }
    }

    /// Validate the form and apply it to an existing entity.
    pub fn update_from_form(
        &mut self,
        id: EntityId,
        form: &EntityForm,
    ) -> Result<Option<Entity>, FieldErrors> {
        let patch = form.validate_patch()?;
        Ok(self.update_entity(id, patch))
    }

    /// Stage `id` for deletion pending confirmation.
    pub fn request_delete(&mut self, id: EntityId) -> bool {
        if !self.store.contains(id) {
            self.report("Failed to delete entity", &tf_core::StoreError::NotFound(id));
            return false;
        }
        self.pending_delete = Some(id);
        true
    }

    pub fn cancel_delete(&mut self) -> bool {
        self.pending_delete.take().is_some()
    }

    /// Delete the staged entity and scrub it from every connection list.
    pub fn confirm_delete(&mut self) -> Option<Entity> {
        let id = self.pending_delete.take()?;
        let referrers: Vec<EntityId> = self
            .store
            .iter()
            .filter(|e| e.is_connected_to(id))
            .map(|e| e.id)
            .collect();

        match self.store.delete(id) {
            Ok(removed) => {
                self.controller.forget(id);
                self.outbox.push(PendingWrite::DeleteEntity(id));
                for referrer in referrers {
                    if let Some(entity) = self.store.get(referrer).cloned() {
                        self.queue_connections(&entity);
                    }
                }
                self.notifications
                    .push(Notification::success(format!("Deleted {}", removed.name)));
                self.graph_changed();
                Some(removed)
            }
            Err(err) => {
                self.report("Failed to delete entity", &err);
                None
            }
        }
    }

    /// Lay every entity out on its zone's grid. Returns the number moved.
    pub fn auto_arrange(&mut self) -> usize {
        let placements = auto_arrange(self.store.iter(), self.config.canvas_size);
        let mut moved = 0;
        for placement in placements {
            let unchanged = self
                .store
                .get(placement.id)
                .is_some_and(|e| e.position == placement.position && e.zone == placement.zone);
            if unchanged {
                continue;
            }
            let patch = EntityPatch::placement(placement.position, placement.zone);
            match self.store.update(placement.id, patch.clone()) {
                Ok(_) => {
                    self.outbox.push(PendingWrite::UpdateEntity {
                        id: placement.id,
                        patch,
                    });
                    moved += 1;
                }
                Err(err) => self.report("Failed to arrange entity", &err),
            }
        }
        log::info!("auto-arrange moved {moved} entities");
        if moved > 0 {
            self.graph_changed();
        }
        self.notifications
            .push(Notification::success("Entities auto-arranged"));
        moved
    }

    // ─── Tips & analysis ─────────────────────────────────────────────────

    /// Show the first tip for `trigger`. Returns `false` if none exists.
    pub fn show_tip(&mut self, trigger: TipTrigger, anchor: Point) -> bool {
        match self.tips.first_for(trigger) {
            Some(tip) => {
                self.tip_display.show(tip.clone(), anchor, self.clock);
                true
            }
            None => {
                log::debug!("no tip for `{trigger}`");
                false
            }
        }
    }

    pub fn dismiss_tip(&mut self) -> bool {
        self.tip_display.dismiss()
    }

    /// Run the analyzer now, bypassing the debouncer.
    ///
    /// A head gap that differs from the last announced one is recorded as a
    /// tip, shown, and raised as a notification.
    pub fn run_gap_analysis(&mut self) {
        self.gap_debounce.cancel();
        self.gaps = detect_gaps(self.store.iter());
        log::debug!("gap analysis: {} gap(s)", self.gaps.len());

        let head = self.gaps.first().cloned();
        let key = head.as_ref().map(|g| (g.kind, g.related_entity_id));
        if key == self.announced_gap {
            return;
        }
        self.announced_gap = key;
        let Some(gap) = head else {
            return;
        };

        match self
            .tips
            .record(TipTrigger::Gap(gap.kind), gap.message.clone(), gap.priority)
        {
            Ok(tip) => {
                let anchor = self
                    .store
                    .get(gap.related_entity_id)
                    .map(|e| {
                        self.camera.world_to_screen(
                            card_center(e.position, self.config.card_size),
                            self.origin,
                        )
                    })
                    .unwrap_or(self.origin);
                self.tip_display.show(tip.clone(), anchor, self.clock);
                self.outbox.push(PendingWrite::CreateTip(tip));
            }
            Err(err) => self.report("Failed to record tip", &err),
        }

        let notification = Notification::for_gap(&gap);
        match gap.priority {
            Priority::High => log::warn!("{}", gap.message),
            _ => log::info!("{}", gap.message),
        }
        self.notifications.push(notification);
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn graph_changed(&mut self) {
        self.gap_debounce.touch(self.clock);
    }

    fn queue_update(&mut self, id: EntityId, patch: EntityPatch) {
        self.outbox.push(PendingWrite::UpdateEntity { id, patch });
        self.graph_changed();
    }

    fn queue_connections(&mut self, entity: &Entity) {
        self.queue_update(
            entity.id,
            EntityPatch {
                connections: Some(entity.connections.clone()),
                ..EntityPatch::default()
            },
        );
    }

    fn report(&mut self, context: &str, err: &dyn std::error::Error) {
        log::error!("{context}: {err}");
        self.notifications
            .push(Notification::error(format!("{context}: {err}")));
    }
}
