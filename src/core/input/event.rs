//=========================================================================
// Input Event Types
//
// Platform-neutral keyboard and mouse events.
//
// The platform layer (winit) converts OS events into these types; the
// core consumes them for the debug overlay chord and forwards them to the
// UI backend for keyboard activation of controls.
//
// Event Flow:
// ```text
// Platform Layer (Winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    Stage::handle_input → DebugOverlay, UiBackend
// ```
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,

    /// Side buttons, thumb buttons, macro keys.
    Other,
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the physical key location, not the character produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Alphabetic Keys --------------------------------------------------

    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,

    /// Fallback for keys the platform layer does not map.
    Unidentified,
}

//=== Modifiers ===========================================================

/// Modifier key state (Shift, Ctrl, Alt).
///
/// Left and right variants are not distinguished. Ctrl also covers
/// Command on macOS, Alt covers Option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// Ctrl + Alt.
    pub const CTRL_ALT: Self = Self {
        shift: false,
        ctrl: true,
        alt: true,
    };

    /// All modifiers held (Shift + Ctrl + Alt).
    pub const ALL: Self = Self {
        shift: true,
        ctrl: true,
        alt: true,
    };
}

//=== InputEvent ==========================================================

/// Low-level input event from the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { key: KeyCode, modifiers: Modifiers },

    KeyUp { key: KeyCode, modifiers: Modifiers },

    MouseButtonDown { button: MouseButton, modifiers: Modifiers },

    MouseButtonUp { button: MouseButton, modifiers: Modifiers },

    /// Cursor position in screen space (pixels, top-left origin).
    MouseMoved { x: f32, y: f32 },
}

impl InputEvent {
    /// Returns true if this is a key press of `key` with exactly `modifiers`.
    pub fn is_key_down(&self, key: KeyCode, modifiers: Modifiers) -> bool {
        matches!(
            self,
            Self::KeyDown { key: k, modifiers: m } if *k == key && *m == modifiers
        )
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
