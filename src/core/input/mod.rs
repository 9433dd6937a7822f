//=========================================================================
// Input
//
// Platform-neutral input events and the process-wide debug chord.
//
// Movement and look input are consumed by external collaborators; the
// core only stores an opaque `InputHandle` on the character.
//
//=========================================================================

//=== Submodules ==========================================================

mod debug_overlay;
pub mod event;

//=== Public API ==========================================================

pub use debug_overlay::DebugOverlay;
pub use event::{InputEvent, KeyCode, Modifiers, MouseButton};
