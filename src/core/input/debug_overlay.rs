//=========================================================================
// Debug Overlay Toggle
//=========================================================================
//
// Process-wide key chord (Shift+Ctrl+Alt+I) that shows or hides the
// backend's diagnostics layer.
//
// Independent of the state machine: it works in every state, including
// while a transition is in flight, and keeps no persisted state.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::info;

//=== Internal Dependencies ===============================================

use super::event::{InputEvent, KeyCode, Modifiers};
use crate::core::bridge::RenderBackend;

//=== DebugOverlay ========================================================

/// Toggles the diagnostics layer on its key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugOverlay {
    visible: bool,
}

impl DebugOverlay {
    pub const TOGGLE_KEY: KeyCode = KeyCode::KeyI;
    pub const TOGGLE_MODIFIERS: Modifiers = Modifiers::ALL;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flips visibility if `event` is the toggle chord.
    ///
    /// Returns true when the event was consumed.
    pub fn handle_event<R>(&mut self, event: &InputEvent, renderer: &mut R) -> bool
    where
        R: RenderBackend + ?Sized,
    {
        if !event.is_key_down(Self::TOGGLE_KEY, Self::TOGGLE_MODIFIERS) {
            return false;
        }

        self.visible = !self.visible;
        info!(target: "stage", "Debug layer {}", if self.visible { "shown" } else { "hidden" });
        renderer.set_debug_layer(self.visible);
        true
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{BackendCall, HeadlessBackend};

    fn chord() -> InputEvent {
        InputEvent::KeyDown {
            key: KeyCode::KeyI,
            modifiers: Modifiers::ALL,
        }
    }

    #[test]
    fn chord_toggles_layer() {
        let mut backend = HeadlessBackend::manual();
        let mut overlay = DebugOverlay::new();

        assert!(overlay.handle_event(&chord(), &mut backend));
        assert!(overlay.is_visible());
        assert!(backend.debug_layer_visible());

        assert!(overlay.handle_event(&chord(), &mut backend));
        assert!(!overlay.is_visible());
        assert_eq!(
            backend.journal(),
            &[BackendCall::DebugLayer(true), BackendCall::DebugLayer(false)]
        );
    }

    #[test]
    fn other_keys_pass_through() {
        let mut backend = HeadlessBackend::manual();
        let mut overlay = DebugOverlay::new();

        let plain_i = InputEvent::KeyDown {
            key: KeyCode::KeyI,
            modifiers: Modifiers::NONE,
        };
        let release = InputEvent::KeyUp {
            key: KeyCode::KeyI,
            modifiers: Modifiers::ALL,
        };

        assert!(!overlay.handle_event(&plain_i, &mut backend));
        assert!(!overlay.handle_event(&release, &mut backend));
        assert!(!overlay.is_visible());
        assert!(backend.journal().is_empty());
    }
}
