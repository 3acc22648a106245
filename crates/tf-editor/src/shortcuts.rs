//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the wasm host and native tests share it.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,

    // ── Edit ──
    /// Stage deletion of the selected entity (confirmation follows).
    Delete,
    AutoArrange,

    // ── Interaction ──
    /// Abandon the active drag, pan, or connection.
    Cancel,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"a"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        // ── Modifier combos first (most specific) ──
        if modifiers.cmd() {
            return match key {
                "0" => Some(ShortcutAction::ResetView),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                _ => None,
            };
        }

        if modifiers.alt {
            return None;
        }

        // `+` needs Shift on most layouts, so Shift is not checked here.
        match key {
            "+" | "=" => Some(ShortcutAction::ZoomIn),
            "-" | "_" => Some(ShortcutAction::ZoomOut),
            "Escape" => Some(ShortcutAction::Cancel),
            "Delete" | "Backspace" if !modifiers.shift => Some(ShortcutAction::Delete),
            "a" if !modifiers.shift => Some(ShortcutAction::AutoArrange),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMD: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_zoom() {
        assert_eq!(
            ShortcutMap::resolve("=", Modifiers::NONE),
            Some(ShortcutAction::ZoomIn)
        );
        // Shift+= produces "+"
        assert_eq!(ShortcutMap::resolve("+", SHIFT), Some(ShortcutAction::ZoomIn));
        assert_eq!(
            ShortcutMap::resolve("-", Modifiers::NONE),
            Some(ShortcutAction::ZoomOut)
        );
        assert_eq!(ShortcutMap::resolve("=", CMD), Some(ShortcutAction::ZoomIn));
    }

    #[test]
    fn resolve_reset_view() {
        // Cmd+0 and Ctrl+0 → reset
        assert_eq!(ShortcutMap::resolve("0", CMD), Some(ShortcutAction::ResetView));
        assert_eq!(ShortcutMap::resolve("0", CTRL), Some(ShortcutAction::ResetView));
        assert_eq!(ShortcutMap::resolve("0", Modifiers::NONE), None);
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(ShortcutMap::resolve("Delete", CMD), None);
    }

    #[test]
    fn resolve_escape_and_arrange() {
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::Cancel)
        );
        assert_eq!(
            ShortcutMap::resolve("a", Modifiers::NONE),
            Some(ShortcutAction::AutoArrange)
        );
        // Cmd+A is the browser's select-all, not ours
        assert_eq!(ShortcutMap::resolve("a", CMD), None);
        assert_eq!(ShortcutMap::resolve("A", SHIFT), None);
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("7", Modifiers::NONE), None);
    }
}
