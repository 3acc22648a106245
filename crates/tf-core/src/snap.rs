//! Magnetic snapping: grid points plus one anchor per zone.
//!
//! Snap points are derived from the canvas size on demand; nothing is
//! cached here; callers regenerate after a resize.

use crate::zone::{ZONES, ZoneId};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Where a snap point comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapKind {
    Grid,
    Zone(ZoneId),
}

/// A candidate position a dragged entity is attracted to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub position: Point,
    pub kind: SnapKind,
}

/// Every grid point `(i * spacing, j * spacing)` inside the canvas, row by
/// row in `i`, followed by the zone anchors in zone-table order.
///
/// A non-positive spacing produces only the zone anchors.
pub fn generate_snap_points(canvas: Size, spacing: f64) -> Vec<SnapPoint> {
    let mut points = Vec::new();

    if spacing > 0.0 && spacing.is_finite() {
        let cols = (canvas.width / spacing).floor().max(0.0) as u32;
        let rows = (canvas.height / spacing).floor().max(0.0) as u32;
        points.reserve(((cols + 1) * (rows + 1)) as usize + ZONES.len());
        for i in 0..=cols {
            for j in 0..=rows {
                points.push(SnapPoint {
                    position: Point::new(f64::from(i) * spacing, f64::from(j) * spacing),
                    kind: SnapKind::Grid,
                });
            }
        }
    }

    points.extend(ZONES.iter().map(|zone| SnapPoint {
        position: zone.anchor(canvas),
        kind: SnapKind::Zone(zone.id),
    }));
    points
}

/// The closest snap point to `point`, if strictly within `threshold`.
///
/// Ties keep the earliest point in `snap_points`.
pub fn nearest_snap_point(
    point: Point,
    snap_points: &[SnapPoint],
    threshold: f64,
) -> Option<SnapPoint> {
    let mut best: Option<(f64, SnapPoint)> = None;
    for candidate in snap_points {
        let distance = point.distance(candidate.position);
        match best {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, *candidate)),
        }
    }
    best.filter(|(distance, _)| *distance < threshold)
        .map(|(_, snap)| snap)
}
