pub mod debounce;
pub mod input;
pub mod interaction;
pub mod notify;
#[cfg(feature = "persistence")]
pub mod persistence;
pub mod session;
pub mod shortcuts;
pub mod tips;

pub use input::{InputEvent, Modifiers};
pub use interaction::{CanvasMutation, InteractionController, InteractionMode};
pub use notify::{Level, Notification};
pub use session::{CanvasSession, PendingWrite};
pub use tips::{Tip, TipDisplay, TipLibrary, TipTrigger};
