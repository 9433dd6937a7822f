//=========================================================================
// Stagehand Library Root
//
// Scene-transition state machine and third-person camera rig for a small
// interactive 3D demo.
//
// Responsibilities:
// - Expose the application facade (`Stage`, `StageBuilder`)
// - Expose the core (state machine, scene contexts, camera rig, backend
//   traits) for custom backends and drivers
// - Keep the winit integration behind `Platform`
//
// Typical usage:
// ```no_run
// use stagehand::{HeadlessBackend, LoadPolicy, Platform, StageBuilder};
//
// let stage = StageBuilder::new().build(HeadlessBackend::with_policy(LoadPolicy::AfterFrames(30)));
// Platform::new(stage).run().unwrap();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the state machine, scene contexts and the backend bridge.
// `headless` is a journaling backend used by tests and the demo binary.
//
pub mod core;
pub mod headless;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` wraps winit; `stage` is the facade that ties the core to a
// backend.
//
mod platform;
mod stage;

//--- Public Exports ------------------------------------------------------

pub use headless::{BackendCall, HeadlessBackend, LoadKind, LoadPolicy};
pub use platform::{Platform, PlatformError};
pub use stage::{FrameReport, Stage, StageBuilder};
