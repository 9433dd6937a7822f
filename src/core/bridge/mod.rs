//=========================================================================
// Backend Bridge
//=========================================================================
//
// Bridges the core with the rendering engine, UI toolkit and loaders.
//
// Backends can be swapped without touching the state machine: the core
// depends only on the traits and handle types defined here.
//
// Components:
// - `interface`: backend traits and opaque handles (the contract)
// - `ready`: one-shot ready signals for asynchronous loads
// - `control`: button press channel from the UI into the core
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod control;
pub(crate) mod interface;
pub(crate) mod ready;

//=== Public API ==========================================================

pub use control::{ContextId, Control, ControlEvent, ControlSink};
pub use interface::{
    AssetBackend, Backend, ButtonHandle, ButtonStyle, MeshHandle, OverlayHandle, RenderBackend,
    SceneHandle, ShadowGeneratorHandle, Subscription, UiBackend,
};
pub use ready::{ready_signal, ReadySignal, Resolver};

pub(crate) use control::ControlCollector;
pub(crate) use ready::Awaited;
