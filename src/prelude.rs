//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use stagehand::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Facade
pub use crate::stage::{FrameReport, Stage, StageBuilder};

// State machine
pub use crate::core::scene::{AppState, AppStateMachine, SceneContext, TransitionOutcome};

// Backend contract
pub use crate::core::bridge::{
    ready_signal, AssetBackend, Backend, ReadySignal, RenderBackend, Resolver, UiBackend,
};

// Camera and character
pub use crate::core::camera_rig::{CameraRig, RigSettings};
pub use crate::core::character::{CharacterAssets, InputHandle};

// Errors
pub use crate::core::error::{GraphError, LoadError, TransitionError};
