//! WASM bridge for Trifecta Canvas: exposes the canvas session to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Structured data crosses the
//! boundary as JSON strings. Time arrives as milliseconds since the host
//! mounted the canvas; the host drains `take_writes_json` and forwards each
//! write to its backend.

use serde::Serialize;
use std::time::Duration;
use tf_core::form::EntityForm;
use tf_core::{CanvasConfig, Entity, EntityId, Point, Size, Vec2, ZoneId, template};
use tf_editor::{CanvasSession, InputEvent, Modifiers, Tip};
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
///
/// Wraps one `CanvasSession`. All interaction from the page goes through
/// this struct.
#[wasm_bindgen]
pub struct TfCanvas {
    session: CanvasSession,
}

#[wasm_bindgen]
impl TfCanvas {
    /// Create a canvas from a JSON `CanvasConfig`. Missing or invalid JSON
    /// falls back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        console_error_panic_hook_setup();
        console_logger_setup();

        let config = if config_json.trim().is_empty() {
            CanvasConfig::default()
        } else {
            serde_json::from_str(config_json).unwrap_or_else(|err| {
                log::warn!("invalid canvas config, using defaults: {err}");
                CanvasConfig::default()
            })
        };
        Self {
            session: CanvasSession::new(config),
        }
    }

    /// Replace the session with loaded records. `tips_json` may be empty.
    /// Returns `false` and keeps the current session on bad data.
    pub fn load(&mut self, entities_json: &str, tips_json: &str) -> bool {
        let entities: Vec<Entity> = match serde_json::from_str(entities_json) {
            Ok(entities) => entities,
            Err(err) => {
                log::error!("entities JSON rejected: {err}");
                return false;
            }
        };
        let tips: Vec<Tip> = if tips_json.trim().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str(tips_json) {
                Ok(tips) => tips,
                Err(err) => {
                    log::error!("tips JSON rejected: {err}");
                    return false;
                }
            }
        };
        match CanvasSession::from_records(self.session.config().clone(), entities, tips) {
            Ok(session) => {
                self.session = session;
                true
            }
            Err(err) => {
                log::error!("load rejected: {err}");
                false
            }
        }
    }

    // ─── Host plumbing ───────────────────────────────────────────────────

    /// Screen offset of the canvas element.
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.session.set_origin(Point::new(x, y));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(Size::new(width, height));
    }

    /// Advance time: hides expired tips and runs due gap analysis.
    pub fn tick(&mut self, now_ms: f64) {
        self.session.tick(elapsed(now_ms));
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle pointer down. Returns true if anything visible changed.
    pub fn pointer_down(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.session
            .handle_input(&InputEvent::PointerDown { x, y }, elapsed(now_ms))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.session
            .handle_input(&InputEvent::PointerMove { x, y }, elapsed(now_ms))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.session
            .handle_input(&InputEvent::PointerUp { x, y }, elapsed(now_ms))
    }

    /// Handle a keyboard event. `key` is `KeyboardEvent.key`.
    #[allow(clippy::too_many_arguments)]
    pub fn key(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> bool {
        let event = InputEvent::Key {
            key: key.to_string(),
            modifiers: Modifiers {
                ctrl,
                shift,
                alt,
                meta,
            },
        };
        self.session.handle_input(&event, elapsed(now_ms))
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        self.session.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.session.zoom_out()
    }

    pub fn reset_view(&mut self) -> bool {
        self.session.reset_view()
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.session.set_pan(Vec2::new(x, y));
    }

    /// Centre the view on the canvas point under a minimap click.
    pub fn navigate_minimap(&mut self, x: f64, y: f64) {
        self.session.navigate_minimap(Point::new(x, y));
    }

    pub fn scene_json(&self) -> String {
        to_json(&self.session.scene(), "null")
    }

    pub fn minimap_json(&self) -> String {
        to_json(&self.session.minimap(), "null")
    }

    /// Interaction mode name: `idle`, `dragging`, `panning`, `connecting`.
    pub fn mode(&self) -> String {
        self.session.controller().mode().name().to_string()
    }

    pub fn selected_id(&self) -> Option<u32> {
        self.session.selected().map(|id| id.0)
    }

    // ─── Connections ─────────────────────────────────────────────────────

    pub fn start_connection(&mut self, source: u32) -> bool {
        self.session.start_connection(EntityId(source))
    }

    pub fn end_connection(&mut self, target: u32) -> bool {
        self.session.end_connection(EntityId(target))
    }

    pub fn cancel_interaction(&mut self) -> bool {
        self.session.cancel_interaction()
    }

    pub fn disconnect(&mut self, from: u32, to: u32) -> bool {
        self.session.disconnect(EntityId(from), EntityId(to))
    }

    // ─── Entities ────────────────────────────────────────────────────────

    pub fn entities_json(&self) -> String {
        let entities: Vec<&Entity> = self.session.store().iter().collect();
        to_json(&entities, "[]")
    }

    /// Create an entity from form JSON.
    ///
    /// Returns `{"ok":true,"entity":{..}}`, `{"ok":false,"errors":{..}}` for
    /// field errors, or `{"ok":false}` if the store refused it.
    pub fn create_from_form(&mut self, form_json: &str) -> String {
        let Some(form) = parse_form(form_json) else {
            return form_rejected();
        };
        form_response(self.session.create_from_form(&form))
    }

    /// Apply form JSON to an existing entity. Same response shape as
    /// `create_from_form`.
    pub fn update_from_form(&mut self, id: u32, form_json: &str) -> String {
        let Some(form) = parse_form(form_json) else {
            return form_rejected();
        };
        form_response(self.session.update_from_form(EntityId(id), &form))
    }

    pub fn create_from_template(&mut self, template_id: &str) -> Option<u32> {
        self.session
            .create_from_template(template_id)
            .map(|entity| entity.id.0)
    }

    pub fn request_delete(&mut self, id: u32) -> bool {
        self.session.request_delete(EntityId(id))
    }

    pub fn pending_delete(&self) -> Option<u32> {
        self.session.pending_delete().map(|id| id.0)
    }

    pub fn cancel_delete(&mut self) -> bool {
        self.session.cancel_delete()
    }

    pub fn confirm_delete(&mut self) -> bool {
        self.session.confirm_delete().is_some()
    }

    /// Returns the number of entities moved.
    pub fn auto_arrange(&mut self) -> u32 {
        u32::try_from(self.session.auto_arrange()).unwrap_or(u32::MAX)
    }

    // ─── Tips & analysis ─────────────────────────────────────────────────

    /// The visible tip, or `null`.
    pub fn tip_json(&self) -> String {
        to_json(&self.session.visible_tip(), "null")
    }

    pub fn dismiss_tip(&mut self) -> bool {
        self.session.dismiss_tip()
    }

    pub fn gaps_json(&self) -> String {
        to_json(&self.session.gaps(), "[]")
    }

    /// Run gap analysis immediately instead of waiting for the quiet period.
    pub fn analyze(&mut self) {
        self.session.run_gap_analysis();
    }

    /// Drain notifications raised since the last call.
    pub fn take_notifications_json(&mut self) -> String {
        to_json(&self.session.take_notifications(), "[]")
    }

    /// Drain queued backend writes, oldest first.
    pub fn take_writes_json(&mut self) -> String {
        to_json(&self.session.take_writes(), "[]")
    }
}

// ─── Free functions ──────────────────────────────────────────────────────

/// The template catalog as JSON.
#[wasm_bindgen]
pub fn template_catalog_json() -> String {
    to_json(&template::catalog(), "[]")
}

/// Templates matching `query`, optionally restricted to a zone id.
#[wasm_bindgen]
pub fn search_templates_json(query: &str, category: &str) -> String {
    let category = match category {
        "" | "all" => None,
        other => match other.parse::<ZoneId>() {
            Ok(zone) => Some(zone),
            Err(err) => {
                log::warn!("{err}");
                return "[]".to_string();
            }
        },
    };
    to_json(&template::search(query, category), "[]")
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Host milliseconds → session time. Negative or NaN input is zero.
fn elapsed(now_ms: f64) -> Duration {
    if now_ms > 0.0 {
        Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        log::error!("serialization failed: {err}");
        fallback.to_string()
    })
}

fn parse_form(json: &str) -> Option<EntityForm> {
    serde_json::from_str(json)
        .map_err(|err| log::warn!("form JSON rejected: {err}"))
        .ok()
}

fn form_rejected() -> String {
    serde_json::json!({ "ok": false }).to_string()
}

fn form_response(
    outcome: Result<Option<Entity>, tf_core::form::FieldErrors>,
) -> String {
    let value = match outcome {
        Ok(Some(entity)) => serde_json::json!({ "ok": true, "entity": entity }),
        Ok(None) => serde_json::json!({ "ok": false }),
        Err(errors) => serde_json::json!({ "ok": false, "errors": errors }),
    };
    value.to_string()
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Trifecta WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Route `log` records to the browser console.
#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from(format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

fn console_logger_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        static LOGGER: ConsoleLogger = ConsoleLogger;
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ENTITIES: &str = r#"[
        {"id": 1, "name": "Family Trust", "type": "trust", "zone": "foundation",
         "position": {"x": 100.0, "y": 450.0}, "connections": [2],
         "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
        {"id": 2, "name": "Rental LLC", "type": "llc", "zone": "assets",
         "position": {"x": 700.0, "y": 150.0}, "connections": [],
         "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"}
    ]"#;

    fn canvas() -> TfCanvas {
        let mut canvas = TfCanvas::new("");
        assert!(canvas.load(ENTITIES, ""));
        canvas
    }

    #[test]
    fn load_rejects_bad_json_and_keeps_session() {
        let mut canvas = canvas();
        assert!(!canvas.load("{not json", ""));
        let entities: serde_json::Value = serde_json::from_str(&canvas.entities_json()).unwrap();
        assert_eq!(entities.as_array().unwrap().len(), 2);
    }

    #[test]
    fn scene_json_carries_cards_and_lines() {
        let canvas = canvas();
        let scene: serde_json::Value = serde_json::from_str(&canvas.scene_json()).unwrap();
        assert_eq!(scene["cards"].as_array().unwrap().len(), 2);
        assert_eq!(scene["connections"][0]["kind"], "ownership");
        assert_eq!(scene["zones"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn form_errors_come_back_as_json() {
        let mut canvas = canvas();
        let response: serde_json::Value =
            serde_json::from_str(&canvas.create_from_form(r#"{"name": "  ", "type": "llc"}"#))
                .unwrap();
        assert_eq!(response["ok"], false);
        assert!(response["errors"]["name"].is_string());

        let response: serde_json::Value = serde_json::from_str(
            &canvas.create_from_form(r#"{"name": "Brokerage", "type": "investment"}"#),
        )
        .unwrap();
        assert_eq!(response["ok"], true);
        assert_eq!(response["entity"]["id"], 3);
    }

    #[test]
    fn writes_drain_as_tagged_json() {
        let mut canvas = canvas();
        assert_eq!(canvas.create_from_template("real-estate-llc"), Some(3));
        let writes: serde_json::Value = serde_json::from_str(&canvas.take_writes_json()).unwrap();
        assert_eq!(writes[0]["op"], "createEntity");
        assert_eq!(writes[0]["data"]["zone"], "assets");
        assert_eq!(canvas.take_writes_json(), "[]");
    }

    #[test]
    fn pointer_drag_pans_and_time_advances_tips() {
        let mut canvas = canvas();
        assert!(canvas.pointer_down(50.0, 760.0, 0.0));
        assert_eq!(canvas.mode(), "panning");
        assert!(canvas.pointer_move(70.0, 760.0, 16.0));
        canvas.pointer_up(70.0, 760.0, 32.0);
        assert_eq!(canvas.mode(), "idle");

        canvas.tick(1_000.0);
        assert_eq!(canvas.gaps_json(), "[]");
        assert_eq!(canvas.tip_json(), "null");
    }

    #[test]
    fn template_search_filters_by_zone() {
        let all: serde_json::Value = serde_json::from_str(&template_catalog_json()).unwrap();
        let trusts: serde_json::Value =
            serde_json::from_str(&search_templates_json("trust", "foundation")).unwrap();
        assert!(all.as_array().unwrap().len() > trusts.as_array().unwrap().len());
        assert_eq!(trusts[0]["category"], "foundation");
        assert_eq!(search_templates_json("", "nowhere"), "[]");
    }

    #[test]
    fn negative_time_clamps_to_zero() {
        assert_eq!(elapsed(-5.0), Duration::ZERO);
        assert_eq!(elapsed(f64::NAN), Duration::ZERO);
        assert_eq!(elapsed(1_500.0), Duration::from_millis(1_500));
    }
}
