pub mod analysis;
pub mod config;
pub mod error;
pub mod form;
pub mod graph;
pub mod id;
pub mod layout;
pub mod model;
pub mod snap;
pub mod store;
pub mod template;
pub mod viewport;
pub mod zone;

pub use analysis::{Gap, GapKind, Priority, detect_gaps};
pub use config::{CanvasConfig, ZoomConfig};
pub use error::{StoreError, StoreResult, ValidationError};
pub use graph::{Connection, ConnectionGraph};
pub use id::{EntityId, TipId};
pub use model::*;
pub use snap::{SnapKind, SnapPoint, generate_snap_points, nearest_snap_point};
pub use store::EntityStore;
pub use viewport::Camera;
pub use zone::{ZONES, Zone, ZoneId, zone_at};

// Re-export kurbo geometry so downstream crates share one set of types
pub use kurbo::{Point, Rect, Size, Vec2};
