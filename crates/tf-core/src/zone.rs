//! Zone map: four fixed canvas regions that classify world-space points.
//!
//! Bounds are fractions of the canvas size. Gaps between zones are
//! intentional; a point in a gap belongs to no zone.

use crate::error::ValidationError;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the four canvas zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneId {
    Operations,
    Assets,
    Foundation,
    Flow,
}

impl ZoneId {
    pub const ALL: [ZoneId; 4] = [
        ZoneId::Operations,
        ZoneId::Assets,
        ZoneId::Foundation,
        ZoneId::Flow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneId::Operations => "operations",
            ZoneId::Assets => "assets",
            ZoneId::Foundation => "foundation",
            ZoneId::Flow => "flow",
        }
    }

    /// The zone's static descriptor.
    pub fn zone(self) -> &'static Zone {
        match self {
            ZoneId::Operations => &ZONES[0],
            ZoneId::Assets => &ZONES[1],
            ZoneId::Foundation => &ZONES[2],
            ZoneId::Flow => &ZONES[3],
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneId::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownZone(s.to_string()))
    }
}

/// A named region in fractional canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: &'static str,
    pub description: &'static str,
    /// Fractional bounds; every coordinate lies in [0, 1].
    pub bounds: Rect,
}

impl Zone {
    /// Bounds scaled to a concrete canvas.
    pub fn pixel_rect(&self, canvas: Size) -> Rect {
        Rect::new(
            self.bounds.x0 * canvas.width,
            self.bounds.y0 * canvas.height,
            self.bounds.x1 * canvas.width,
            self.bounds.y1 * canvas.height,
        )
    }

    /// Top-left corner scaled to the canvas. Used as the zone's snap anchor.
    pub fn anchor(&self, canvas: Size) -> Point {
        self.pixel_rect(canvas).origin()
    }

    pub fn center(&self, canvas: Size) -> Point {
        self.pixel_rect(canvas).center()
    }

    /// Inclusive containment test on fractional coordinates.
    fn contains_fraction(&self, fx: f64, fy: f64) -> bool {
        fx >= self.bounds.x0 && fx <= self.bounds.x1 && fy >= self.bounds.y0 && fy <= self.bounds.y1
    }
}

/// The zone table, in lookup order.
pub const ZONES: [Zone; 4] = [
    Zone {
        id: ZoneId::Operations,
        name: "Operations Zone",
        description: "S-Corporation active business operations",
        bounds: Rect::new(0.05, 0.05, 0.45, 0.45),
    },
    Zone {
        id: ZoneId::Assets,
        name: "Assets Zone",
        description: "LLC passive asset holdings",
        bounds: Rect::new(0.55, 0.05, 0.95, 0.45),
    },
    Zone {
        id: ZoneId::Foundation,
        name: "Foundation Zone",
        description: "Revocable Living Trust base",
        bounds: Rect::new(0.05, 0.5, 0.95, 0.8),
    },
    Zone {
        id: ZoneId::Flow,
        name: "1040 Flow Zone",
        description: "Personal tax filing integration",
        bounds: Rect::new(0.05, 0.85, 0.95, 0.95),
    },
];

/// Classify a world-space point. Returns the first zone (in table order)
/// containing it, or `None` when the point falls between zones.
pub fn zone_at(world: Point, canvas: Size) -> Option<ZoneId> {
    if canvas.width <= 0.0 || canvas.height <= 0.0 {
        return None;
    }
    let fx = world.x / canvas.width;
    let fy = world.y / canvas.height;
    ZONES
        .iter()
        .find(|zone| zone.contains_fraction(fx, fy))
        .map(|zone| zone.id)
}
