//=========================================================================
// Core Systems
//
// Everything that runs independently of the windowing platform: the
// application state machine, scene contexts, the camera rig, the scene
// graph and the bridge to the external rendering/UI/asset backends.
//
// Responsibilities:
// - Own the one live scene context and swap it on state transitions
// - Build gameplay scenes (character, follow camera, shadows)
// - Dispatch one render per frame to the live context
//
// Notes:
// The core is single-threaded and tick-driven. Asynchronous loads are
// one-shot signals polled once per frame; nothing here blocks.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod bridge;
pub mod camera_rig;
pub mod character;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod render_loop;
pub mod scene;

//=== Public API ==========================================================

pub use bridge::{Backend, ContextId, Control, ControlSink};
pub use camera_rig::{CameraRig, RigSettings, ORIGINAL_TILT};
pub use character::{CharacterAnchor, CharacterAssets, InputHandle};
pub use config::StageConfig;
pub use error::{GraphError, LoadError, TransitionError};
pub use render_loop::RenderLoop;
pub use scene::{AppState, AppStateMachine, SceneContext, TransitionOutcome};
