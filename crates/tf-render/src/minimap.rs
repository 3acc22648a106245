//! Minimap projection: canvas ↔ overview map.

use serde::Serialize;
use tf_core::{Camera, CanvasConfig, EntityId, EntityStore, Point, Rect, Size, Vec2};

/// Default overview size.
pub const MAP_SIZE: Size = Size::new(200.0, 150.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniMapDot {
    pub id: EntityId,
    pub position: Point,
}

/// Overview of the whole canvas with the visible region marked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniMapView {
    pub size: Size,
    pub dots: Vec<MiniMapDot>,
    /// Visible region, clamped inside the map.
    pub viewport: Rect,
    pub zoom_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniMap {
    map: Size,
    canvas: Size,
    viewport: Size,
}

impl MiniMap {
    pub fn new(config: &CanvasConfig) -> Self {
        Self::with_size(config, MAP_SIZE)
    }

    pub fn with_size(config: &CanvasConfig, map: Size) -> Self {
        Self {
            map,
            canvas: config.canvas_size,
            viewport: config.viewport_size,
        }
    }

    fn scale(&self) -> Vec2 {
        Vec2::new(
            self.map.width / self.canvas.width,
            self.map.height / self.canvas.height,
        )
    }

    /// Canvas position → map position.
    pub fn project(&self, world: Point) -> Point {
        let s = self.scale();
        Point::new(world.x * s.x, world.y * s.y)
    }

    /// Visible region of the canvas on the map, clamped inside the map.
    pub fn viewport_rect(&self, camera: &Camera) -> Rect {
        let s = self.scale();
        let zoom = camera.zoom();
        let width = (self.viewport.width * s.x / zoom).min(self.map.width);
        let height = (self.viewport.height * s.y / zoom).min(self.map.height);
        let x = (-camera.pan.x * s.x / zoom).clamp(0.0, (self.map.width - width).max(0.0));
        let y = (-camera.pan.y * s.y / zoom).clamp(0.0, (self.map.height - height).max(0.0));
        Rect::from_origin_size((x, y), (width, height))
    }

    /// Pan that centres the viewport on the canvas point under a map click.
    pub fn navigate(&self, click: Point) -> Vec2 {
        let s = self.scale();
        let target = Vec2::new(click.x / s.x, click.y / s.y);
        -(target - Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0))
    }

    #[must_use]
    pub fn view(&self, store: &EntityStore, camera: &Camera) -> MiniMapView {
        MiniMapView {
            size: self.map,
            dots: store
                .iter()
                .map(|e| MiniMapDot {
                    id: e.id,
                    position: self.project(e.position),
                })
                .collect(),
            viewport: self.viewport_rect(camera),
            zoom_percent: (camera.zoom() * 100.0).round() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> MiniMap {
        MiniMap::new(&CanvasConfig::default())
    }

    #[test]
    fn projects_canvas_corners() {
        assert_eq!(map().project(Point::new(1200.0, 800.0)), Point::new(200.0, 150.0));
        assert_eq!(map().project(Point::new(600.0, 400.0)), Point::new(100.0, 75.0));
    }

    #[test]
    fn viewport_rect_tracks_pan_and_zoom() {
        let mut camera = Camera::default();
        camera.set_pan(Vec2::new(-300.0, -160.0));
        let rect = map().viewport_rect(&camera);
        assert!((rect.x0 - 50.0).abs() < 1e-9);
        assert!((rect.y0 - 30.0).abs() < 1e-9);
        assert!((rect.width() - 800.0 / 6.0).abs() < 1e-9);
        assert!((rect.height() - 112.5).abs() < 1e-9);
    }

    #[test]
    fn viewport_rect_is_clamped_inside_map() {
        let mut camera = Camera::default();
        camera.set_pan(Vec2::new(500.0, 500.0));
        camera.set_zoom(0.3);
        let rect = map().viewport_rect(&camera);
        assert_eq!(rect.origin(), Point::ORIGIN);
        assert_eq!(rect.size(), MAP_SIZE);
    }

    #[test]
    fn navigate_centres_viewport_on_click() {
        let pan = map().navigate(Point::new(100.0, 75.0));
        assert!((pan.x - -200.0).abs() < 1e-9);
        assert!((pan.y - -100.0).abs() < 1e-9);
    }
}
