pub mod hit;
pub mod minimap;
pub mod scene;

pub use hit::hit_test;
pub use minimap::{MiniMap, MiniMapView};
pub use scene::{Overlay, Scene, build_scene};
