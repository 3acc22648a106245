//! Viewport model: pan offset and zoom scale.
//!
//! Rendering maps world → screen as `world * zoom + pan + origin`, where
//! `origin` is the canvas element's offset on screen. `screen_to_world` is
//! its exact inverse.

use crate::config::ZoomConfig;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Convert a screen (pointer) position to world coordinates.
pub fn screen_to_world(screen: Point, pan: Vec2, zoom: f64, origin: Point) -> Point {
    ((screen - origin - pan) / zoom).to_point()
}

/// Convert a world position to screen coordinates.
pub fn world_to_screen(world: Point, pan: Vec2, zoom: f64, origin: Point) -> Point {
    origin + pan + world.to_vec2() * zoom
}

/// Pan/zoom state. Zoom stays inside its configured bounds after every
/// mutation, and pan is never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub pan: Vec2,
    zoom: f64,
    #[serde(skip, default)]
    bounds: ZoomConfig,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl Camera {
    pub fn new(bounds: ZoomConfig) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0_f64.clamp(bounds.min, bounds.max),
            bounds,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn bounds(&self) -> ZoomConfig {
        self.bounds
    }

    /// Replace the zoom bounds, re-clamping the current zoom.
    pub fn set_bounds(&mut self, bounds: ZoomConfig) {
        self.bounds = bounds;
        self.zoom = self.clamp(self.zoom);
    }

    /// Set zoom directly. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = self.clamp(zoom);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.bounds.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.bounds.step);
    }

    /// Back to zoom 1 and no pan.
    pub fn reset(&mut self) {
        self.zoom = self.clamp(1.0);
        self.pan = Vec2::ZERO;
    }

    /// Shift the pan by a screen-space delta. Non-finite deltas are dropped.
    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        if pan.is_finite() {
            self.pan = pan;
        }
    }

    pub fn screen_to_world(&self, screen: Point, origin: Point) -> Point {
        screen_to_world(screen, self.pan, self.zoom, origin)
    }

    pub fn world_to_screen(&self, world: Point, origin: Point) -> Point {
        world_to_screen(world, self.pan, self.zoom, origin)
    }

    // Snaps to 1e-9 so that zoom_in/zoom_out pairs return to the same value.
    fn clamp(&self, zoom: f64) -> f64 {
        let quantized = (zoom * 1e9).round() / 1e9;
        quantized.clamp(self.bounds.min, self.bounds.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn inverse_law_holds() {
        let origin = Point::new(12.0, 48.0);
        let pans = [Vec2::ZERO, Vec2::new(-35.5, 120.25), Vec2::new(400.0, -7.0)];
        let zooms = [0.3, 0.7, 1.0, 1.9, 3.0];
        let points = [
            Point::ORIGIN,
            Point::new(640.0, 360.0),
            Point::new(-12.5, 99.75),
        ];
        for pan in pans {
            for zoom in zooms {
                for p in points {
                    let world = screen_to_world(p, pan, zoom, origin);
                    let back = world_to_screen(world, pan, zoom, origin);
                    assert!(approx(back, p), "pan={pan:?} zoom={zoom} p={p:?} back={back:?}");
                }
            }
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        for _ in 0..100 {
            camera.zoom_in();
        }
        assert_eq!(camera.zoom(), 3.0);
        for _ in 0..100 {
            camera.zoom_out();
        }
        assert_eq!(camera.zoom(), 0.3);
    }

    #[test]
    fn zoom_in_out_pair_is_idempotent() {
        let mut camera = Camera::default();
        for _ in 0..7 {
            camera.zoom_in();
            camera.zoom_out();
        }
        assert_eq!(camera.zoom(), 1.0);
    }

    #[test]
    fn zoom_leaves_pan_alone() {
        let mut camera = Camera::default();
        camera.pan_by(Vec2::new(10.0, -4.0));
        camera.zoom_in();
        assert_eq!(camera.pan, Vec2::new(10.0, -4.0));
    }

    #[test]
    fn reset_restores_identity() {
        let mut camera = Camera::default();
        camera.pan_by(Vec2::new(10.0, 10.0));
        camera.zoom_in();
        camera.reset();
        assert_eq!(camera.zoom(), 1.0);
        assert_eq!(camera.pan, Vec2::ZERO);
    }

    #[test]
    fn nan_input_is_rejected() {
        let mut camera = Camera::default();
        camera.pan_by(Vec2::new(f64::NAN, 1.0));
        camera.set_zoom(f64::INFINITY);
        assert_eq!(camera.pan, Vec2::ZERO);
        assert_eq!(camera.zoom(), 1.0);
    }
}
