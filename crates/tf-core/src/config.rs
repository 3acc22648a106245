//! Canvas configuration threaded into every component.
//!
//! One value carries the canvas size, zoom bounds, snap tuning, and timing.
//! Components receive it explicitly instead of hardcoding their own copy.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Zoom bounds and step for the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.3,
            max: 3.0,
            step: 0.1,
        }
    }
}

/// Configuration for a canvas session.
///
/// Deserializes from partial JSON: missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Logical (world) canvas size. Zone bounds are fractions of this.
    pub canvas_size: Size,
    /// Visible viewport size, used by the minimap indicator.
    pub viewport_size: Size,
    pub zoom: ZoomConfig,
    /// Spacing of grid snap points. Non-positive disables the grid.
    pub grid_spacing: f64,
    /// A drop snaps only when strictly closer than this.
    pub snap_threshold: f64,
    /// Size of an entity card on the canvas.
    pub card_size: Size,
    /// How long an advisory tip stays visible.
    pub tip_duration_ms: u64,
    /// Quiet period before gap analysis re-runs after a graph change.
    pub gap_quiet_period_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas_size: Size::new(1200.0, 800.0),
            viewport_size: Size::new(800.0, 600.0),
            zoom: ZoomConfig::default(),
            grid_spacing: 50.0,
            snap_threshold: 20.0,
            card_size: Size::new(180.0, 100.0),
            tip_duration_ms: 5_000,
            gap_quiet_period_ms: 1_000,
        }
    }
}

impl CanvasConfig {
    /// Config for a canvas of the given size, other fields default.
    pub fn with_canvas_size(width: f64, height: f64) -> Self {
        Self {
            canvas_size: Size::new(width, height),
            ..Self::default()
        }
        .sanitized()
    }

    /// Repair values that would break downstream math.
    ///
    /// Zoom bounds are forced positive and ordered, the step is made
    /// positive, and non-finite sizes fall back to their defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !is_usable_size(self.canvas_size) {
            log::warn!(
                "invalid canvas size {:?}, using {:?}",
                self.canvas_size,
                defaults.canvas_size
            );
            self.canvas_size = defaults.canvas_size;
        }
        if !is_usable_size(self.viewport_size) {
            self.viewport_size = defaults.viewport_size;
        }
        if !is_usable_size(self.card_size) {
            self.card_size = defaults.card_size;
        }

        let ZoomConfig { min, max, step } = self.zoom;
        let (mut min, mut max) = if min > max { (max, min) } else { (min, max) };
        if !min.is_finite() || min <= 0.0 {
            min = defaults.zoom.min;
        }
        if !max.is_finite() || max < min {
            max = defaults.zoom.max.max(min);
        }
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            defaults.zoom.step
        };
        self.zoom = ZoomConfig { min, max, step };

        if !self.grid_spacing.is_finite() {
            self.grid_spacing = 0.0;
        }
        if !self.snap_threshold.is_finite() || self.snap_threshold < 0.0 {
            self.snap_threshold = defaults.snap_threshold;
        }
        self
    }

    pub fn tip_duration(&self) -> Duration {
        Duration::from_millis(self.tip_duration_ms)
    }

    pub fn gap_quiet_period(&self) -> Duration {
        Duration::from_millis(self.gap_quiet_period_ms)
    }
}

fn is_usable_size(size: Size) -> bool {
    size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
}
